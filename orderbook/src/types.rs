//! Core data types for the order book.
//!
//! All types use integer ticks for prices to avoid floating-point precision
//! issues. Timestamps are nanoseconds since epoch for high-precision time
//! priority.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ticks per quote unit. A tick value of 10050 reads as 100.50.
pub const TICK_PRECISION: i64 = 100;

/// Price expressed in integer ticks. Negative and extreme values are legal;
/// market orders are submitted as limits at a caller-chosen extreme tick.
pub type PriceTick = i64;

/// Order side - Bid (buy) or Ask (sell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

/// Time-in-force instructions for order lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Rest until filled or cancelled
    GTC,
    /// Execute immediately, cancel remainder
    IOC,
    /// Execute entire order immediately or cancel
    FOK,
    /// Rest until end of session (treated as GTC at this layer)
    GFD,
}

/// Order execution type.
///
/// The matcher treats both kinds uniformly through price comparison; a
/// `Market` order carries a caller-supplied extreme tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Execute only at the specified price or better
    Limit,
    /// Execute immediately at the best available price
    Market,
}

/// Unique order identifier. Caller-assigned; must stay unique for the
/// lifetime of the book (duplicates are not policed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// Participant identifier used for self-match suppression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u32);

/// Complete order specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub px_ticks: PriceTick,
    pub qty: u32, // Quantity in shares/lots, must be positive
    pub kind: OrderKind,
    pub tif: TimeInForce,
    pub owner: OwnerId,
    pub ts_ns: u64, // Timestamp in nanoseconds; rewritten when the order rests
}

/// Fill execution record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub maker: OrderId, // Resting order (provides liquidity)
    pub taker: OrderId, // Incoming order (takes liquidity)
    pub qty: u32,
    pub px_ticks: PriceTick, // Execution price (always maker's price)
    pub ts_ns: u64,          // Execution timestamp
}

/// Aggregated view of one price level, as returned by depth snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub px_ticks: PriceTick,
    pub total_qty: u64,
    pub order_count: u32,
}

/// Rejections surfaced at the submission boundary, before any state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BookError {
    /// The order failed structural validation (zero quantity).
    #[error("invalid order: quantity must be positive")]
    InvalidOrder,
}
