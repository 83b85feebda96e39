//! Price-time priority limit order book for a single instrument.
//!
//! Core features:
//! - Price-time priority matching (best price first, then FIFO)
//! - Partial fills, GTC/IOC/FOK/GFD time-in-force handling
//! - Self-match prevention: own resting liquidity is never taken
//! - O(1) id lookup for cancel/modify through an order registry
//! - Lock-free stats counters and advisory best-price hints

pub mod types;
pub use types::{
    BookError, Fill, LevelInfo, Order, OrderId, OrderKind, OwnerId, PriceTick, Side, TimeInForce,
    TICK_PRECISION,
};
pub mod price_levels;
pub use price_levels::PriceLevels;
pub mod stats;
pub use stats::BookStats;

use crate::stats::BookCounters;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

/// Callback invoked synchronously for every fill, while the book lock is
/// held. Handlers must be non-blocking and must not call back into the
/// book; doing so would deadlock.
pub type FillHandler = Box<dyn FnMut(&Fill) + Send>;

/// Central limit order book with separate bid/ask sides.
///
/// Every public operation serializes on one internal mutex, so a shared
/// `Arc<OrderBook>` is safe across threads. Fills execute at the maker's
/// price following standard exchange rules. The stats counters, the order
/// count, and the best-price hints are atomics readable without the lock;
/// they may momentarily lag the authoritative book state.
pub struct OrderBook {
    inner: Mutex<BookInner>,
    /// Resting order count. Authoritative value requires the lock.
    order_count: AtomicU64,
    /// Best-price hints, tightened monotonically on rest and never widened
    /// on cancel. Optimistic bounds only.
    best_bid_hint: PriceHint,
    best_ask_hint: PriceHint,
    counters: BookCounters,
}

struct BookInner {
    /// Buy orders, highest price first
    bids: PriceLevels,
    /// Sell orders, lowest price first
    asks: PriceLevels,
    /// id -> location of the resting order, kept in lockstep with the queues
    orders: HashMap<OrderId, OrderLocator>,
    fill_handler: Option<FillHandler>,
}

/// Stable handle locating a resting order inside its side's level queues.
#[derive(Clone, Copy, Debug)]
struct OrderLocator {
    side: Side,
    px_ticks: PriceTick,
}

/// Monotonically tightened price bound with a separate presence flag.
/// Every i64 value is a legal tick (market orders rest at caller-chosen
/// extremes), so emptiness cannot be encoded in the tick itself.
struct PriceHint {
    tick: AtomicI64,
    present: AtomicBool,
}

impl PriceHint {
    fn new(identity: i64) -> Self {
        Self {
            tick: AtomicI64::new(identity),
            present: AtomicBool::new(false),
        }
    }

    fn tighten_up(&self, px: PriceTick) {
        self.tick.fetch_max(px, Ordering::Relaxed);
        self.present.store(true, Ordering::Relaxed);
    }

    fn tighten_down(&self, px: PriceTick) {
        self.tick.fetch_min(px, Ordering::Relaxed);
        self.present.store(true, Ordering::Relaxed);
    }

    fn get(&self) -> Option<PriceTick> {
        self.present
            .load(Ordering::Relaxed)
            .then(|| self.tick.load(Ordering::Relaxed))
    }
}

struct MatchOutcome {
    fills_emitted: u64,
    makers_removed: u64,
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_nanos() as u64
}

impl OrderBook {
    /// Creates an empty order book. `max_orders` is a capacity hint for the
    /// order registry only.
    pub fn new(max_orders: usize) -> Self {
        Self {
            inner: Mutex::new(BookInner {
                bids: PriceLevels::new(Side::Bid),
                asks: PriceLevels::new(Side::Ask),
                orders: HashMap::with_capacity(max_orders),
                fill_handler: None,
            }),
            order_count: AtomicU64::new(0),
            best_bid_hint: PriceHint::new(i64::MIN),
            best_ask_hint: PriceHint::new(i64::MAX),
            counters: BookCounters::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BookInner> {
        self.inner.lock().expect("order book lock poisoned")
    }

    /// Submits an order, matching it against the contra side and resting
    /// any GTC/GFD residual.
    ///
    /// Fills are appended to `out_fills` when a vector is supplied, and
    /// delivered to the installed fill handler, in generation order.
    /// Returns `Ok(false)` only for a FOK order whose full quantity is not
    /// crossable (no state changes in that case); `Ok(true)` otherwise.
    /// A zero-quantity order is rejected before any state change.
    pub fn submit(
        &self,
        order: Order,
        mut out_fills: Option<&mut Vec<Fill>>,
    ) -> Result<bool, BookError> {
        if order.qty == 0 {
            return Err(BookError::InvalidOrder);
        }

        let started = Instant::now();
        let mut inner = self.lock();

        // All-or-nothing pre-check
        if order.tif == TimeInForce::FOK && !inner.can_fully_fill(&order) {
            return Ok(false);
        }

        let mut remaining = order.qty;
        let outcome = inner.match_loop(&order, &mut remaining, &mut out_fills);

        if remaining > 0 {
            match order.tif {
                // Discard the residual. A FOK reaching this branch passed
                // the pre-check but was stopped by self-match blocking.
                TimeInForce::IOC | TimeInForce::FOK => {}
                TimeInForce::GTC | TimeInForce::GFD => {
                    inner.rest(order, remaining);
                    self.order_count.fetch_add(1, Ordering::Relaxed);
                    match order.side {
                        Side::Bid => self.best_bid_hint.tighten_up(order.px_ticks),
                        Side::Ask => self.best_ask_hint.tighten_down(order.px_ticks),
                    }
                }
            }
        }

        if outcome.makers_removed > 0 {
            self.order_count.fetch_sub(outcome.makers_removed, Ordering::Relaxed);
        }

        #[cfg(debug_assertions)]
        inner.debug_validate();
        drop(inner);

        self.counters.orders_processed.fetch_add(1, Ordering::Relaxed);
        self.counters
            .fills_generated
            .fetch_add(outcome.fills_emitted, Ordering::Relaxed);
        self.counters
            .last_processing_time_ns
            .store(started.elapsed().as_nanos() as u64, Ordering::Relaxed);

        Ok(true)
    }

    /// Cancels a resting order by id. Returns `false` iff the id is
    /// unknown.
    pub fn cancel(&self, order_id: OrderId) -> bool {
        let mut inner = self.lock();

        let Some(locator) = inner.orders.remove(&order_id) else {
            return false;
        };

        let removed = match locator.side {
            Side::Bid => inner.bids.remove(order_id, locator.px_ticks),
            Side::Ask => inner.asks.remove(order_id, locator.px_ticks),
        };
        debug_assert!(removed.is_some(), "registry and level queues out of sync");
        self.order_count.fetch_sub(1, Ordering::Relaxed);

        #[cfg(debug_assertions)]
        inner.debug_validate();
        drop(inner);

        trace!(order_id = order_id.0, "order cancelled");
        true
    }

    /// Replaces price and quantity of a resting order, preserving its side,
    /// owner, kind, and time-in-force. Implemented as cancel + resubmit, so
    /// the order loses time priority and may trade immediately; any fills
    /// are returned. Unknown ids yield an empty vector. A zero `new_qty`
    /// degenerates to a plain cancel.
    ///
    /// The lock is released between the lookup and the cancel + resubmit.
    /// In that window the order can be cancelled independently, after which
    /// the modify completes as a plain submit of the new parameters.
    pub fn modify(&self, order_id: OrderId, new_px: PriceTick, new_qty: u32) -> Vec<Fill> {
        let mut fills = Vec::new();

        let original = {
            let inner = self.lock();
            inner.orders.get(&order_id).and_then(|locator| {
                let levels = match locator.side {
                    Side::Bid => &inner.bids,
                    Side::Ask => &inner.asks,
                };
                levels.get(order_id, locator.px_ticks)
            })
        };

        let Some(original) = original else {
            return fills;
        };

        self.cancel(order_id);
        debug!(order_id = order_id.0, new_px, new_qty, "order modified, re-queued");

        if new_qty > 0 {
            let modified = Order {
                px_ticks: new_px,
                qty: new_qty,
                ..original
            };
            let _ = self.submit(modified, Some(&mut fills));
        }

        fills
    }

    /// Cancels every resting order on one side. The id set is snapshotted
    /// first so cancellation cannot invalidate the iteration.
    pub fn cancel_all(&self, side: Side) {
        let to_cancel: Vec<OrderId> = {
            let inner = self.lock();
            inner
                .orders
                .iter()
                .filter(|(_, locator)| locator.side == side)
                .map(|(&id, _)| id)
                .collect()
        };

        debug!(?side, count = to_cancel.len(), "bulk cancel");
        for id in to_cancel {
            self.cancel(id);
        }
    }

    /// Installs the fill observer, replacing any previous one.
    ///
    /// The handler runs synchronously under the book lock for every fill;
    /// it must be non-blocking and must not call back into the book.
    pub fn set_fill_handler(&self, handler: impl FnMut(&Fill) + Send + 'static) {
        self.lock().fill_handler = Some(Box::new(handler));
    }

    /// Best bid in quote units, `-1.0` when no bids rest.
    pub fn best_bid(&self) -> f64 {
        match self.lock().bids.best_price() {
            Some(px) => px as f64 / TICK_PRECISION as f64,
            None => -1.0,
        }
    }

    /// Best ask in quote units, `-1.0` when no asks rest.
    pub fn best_ask(&self) -> f64 {
        match self.lock().asks.best_price() {
            Some(px) => px as f64 / TICK_PRECISION as f64,
            None => -1.0,
        }
    }

    /// Up to `depth` aggregated levels from the top of `side`, best first.
    pub fn top_levels(&self, side: Side, depth: usize) -> Vec<LevelInfo> {
        let inner = self.lock();
        let levels = match side {
            Side::Bid => &inner.bids,
            Side::Ask => &inner.asks,
        };
        levels
            .iter_best_first()
            .take(depth)
            .map(|(&px, queue)| LevelInfo {
                px_ticks: px,
                total_qty: queue.iter().map(|o| u64::from(o.qty)).sum(),
                order_count: queue.len() as u32,
            })
            .collect()
    }

    /// Total resting quantity on `side`.
    pub fn total_volume(&self, side: Side) -> u64 {
        let inner = self.lock();
        match side {
            Side::Bid => inner.bids.total_quantity(),
            Side::Ask => inner.asks.total_quantity(),
        }
    }

    /// Volume-weighted mid over the best levels:
    /// `(bid * ask_vol + ask * bid_vol) / (bid_vol + ask_vol)`.
    /// `-1.0` when either side is empty.
    pub fn weighted_mid_price(&self) -> f64 {
        let inner = self.lock();
        let (Some(bid_px), Some(ask_px)) = (inner.bids.best_price(), inner.asks.best_price())
        else {
            return -1.0;
        };

        let bid = bid_px as f64 / TICK_PRECISION as f64;
        let ask = ask_px as f64 / TICK_PRECISION as f64;
        let bid_vol = inner.bids.qty_at_price(bid_px);
        let ask_vol = inner.asks.qty_at_price(ask_px);

        if bid_vol + ask_vol == 0 {
            return (bid + ask) / 2.0;
        }
        (bid * ask_vol as f64 + ask * bid_vol as f64) / (bid_vol + ask_vol) as f64
    }

    /// Number of resting orders. Lock-free; may lag in-flight operations.
    pub fn order_count(&self) -> u64 {
        self.order_count.load(Ordering::Relaxed)
    }

    /// Advisory best-bid tick. An optimistic upper bound: tightened when
    /// bids rest, never relaxed when they cancel or fill. `None` until the
    /// first bid rests.
    pub fn best_bid_tick_hint(&self) -> Option<PriceTick> {
        self.best_bid_hint.get()
    }

    /// Advisory best-ask tick. An optimistic lower bound, same caveats as
    /// [`OrderBook::best_bid_tick_hint`].
    pub fn best_ask_tick_hint(&self) -> Option<PriceTick> {
        self.best_ask_hint.get()
    }

    /// Lock-free snapshot of the operation counters.
    pub fn stats(&self) -> BookStats {
        self.counters.snapshot()
    }

    /// Zeroes the operation counters.
    pub fn reset_stats(&self) {
        self.counters.reset();
    }
}

impl BookInner {
    /// All-or-nothing check: can `order.qty` cross entirely against
    /// non-self contra liquidity at `order.px_ticks` or better?
    fn can_fully_fill(&self, order: &Order) -> bool {
        let contra = match order.side {
            Side::Bid => &self.asks,
            Side::Ask => &self.bids,
        };
        contra.can_fill(order.px_ticks, order.owner, order.qty)
    }

    /// Walks the contra side in priority order, filling `taker` against
    /// level queue heads at the maker's price. A queue head owned by the
    /// taker blocks the remainder of that level; the walk then continues at
    /// the next marketable level.
    fn match_loop(
        &mut self,
        taker: &Order,
        remaining: &mut u32,
        out_fills: &mut Option<&mut Vec<Fill>>,
    ) -> MatchOutcome {
        let BookInner {
            bids,
            asks,
            orders,
            fill_handler,
        } = self;
        let contra = match taker.side {
            Side::Bid => asks,
            Side::Ask => bids,
        };

        let mut outcome = MatchOutcome {
            fills_emitted: 0,
            makers_removed: 0,
        };

        let mut last_px: Option<PriceTick> = None;
        while *remaining > 0 {
            let Some(px) = contra.next_marketable(taker.px_ticks, last_px) else {
                break;
            };
            last_px = Some(px);

            while *remaining > 0 {
                let Some(resting) = contra.front_mut(px) else {
                    break;
                };

                // Prevent self-matching
                if resting.owner == taker.owner {
                    break;
                }

                let fill_qty = (*remaining).min(resting.qty);
                let fill = Fill {
                    maker: resting.id,
                    taker: taker.id,
                    qty: fill_qty,
                    px_ticks: px,
                    ts_ns: now_ns(),
                };

                if let Some(out) = out_fills.as_mut() {
                    out.push(fill);
                }
                if let Some(handler) = fill_handler.as_mut() {
                    handler(&fill);
                }
                outcome.fills_emitted += 1;
                trace!(
                    maker = fill.maker.0,
                    taker = fill.taker.0,
                    qty = fill.qty,
                    px_ticks = fill.px_ticks,
                    "fill"
                );

                let maker_id = resting.id;
                resting.qty -= fill_qty;
                let exhausted = resting.qty == 0;
                *remaining -= fill_qty;

                if exhausted {
                    orders.remove(&maker_id);
                    contra.pop_front(px);
                    outcome.makers_removed += 1;
                }
            }

            contra.drop_level_if_empty(px);
        }

        outcome
    }

    /// Rests the residual at the tail of its level's queue. The resting
    /// timestamp is the moment of resting, not submission, so queue
    /// position and arrival time agree.
    fn rest(&mut self, order: Order, remaining: u32) {
        let resting = Order {
            qty: remaining,
            ts_ns: now_ns(),
            ..order
        };
        self.orders.insert(
            resting.id,
            OrderLocator {
                side: resting.side,
                px_ticks: resting.px_ticks,
            },
        );
        match resting.side {
            Side::Bid => self.bids.push(resting),
            Side::Ask => self.asks.push(resting),
        }
    }

    /// Structural self-checks: queues and registry agree, no empty levels
    /// survive, every resting quantity is positive.
    #[cfg(debug_assertions)]
    fn debug_validate(&self) {
        let mut queued = 0usize;
        for (side, levels) in [(Side::Bid, &self.bids), (Side::Ask, &self.asks)] {
            for (&px, queue) in levels.iter_best_first() {
                assert!(!queue.is_empty(), "empty level queue at {px}");
                for order in queue {
                    queued += 1;
                    assert!(order.qty > 0, "resting order {} has zero qty", order.id.0);
                    assert_eq!(order.side, side);
                    assert_eq!(order.px_ticks, px);
                    let locator = self
                        .orders
                        .get(&order.id)
                        .unwrap_or_else(|| panic!("order {} missing from registry", order.id.0));
                    assert_eq!(locator.side, side);
                    assert_eq!(locator.px_ticks, px);
                }
            }
        }
        assert_eq!(queued, self.orders.len(), "registry size disagrees with queues");
    }
}
