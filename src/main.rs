//! Matchbook Performance Lab
//!
//! Runs performance tests followed by a basic trading demo showing
//! order placement, matching, time-in-force handling, and fill events.

use orderbook::{Order, OrderBook, OrderId, OrderKind, OwnerId, Side, TimeInForce};
use tracing::info;

mod latency_test;

/// Main entry point - runs performance tests and demo.
fn main() {
    tracing_subscriber::fmt::init();

    println!("=== Matchbook Performance Lab ===");
    info!("performance lab starting");

    // Run comprehensive performance tests
    latency_test::run_latency_tests();
    latency_test::run_throughput_test();

    // Show basic order book functionality
    println!("\n=== Basic Demo ===");
    run_basic_demo();
}

/// Demonstrates basic order book functionality with fill dispatch.
fn run_basic_demo() {
    let ob = OrderBook::new(64);

    println!("Matchbook - Order Book Demo");

    ob.set_fill_handler(|fill| {
        println!(
            "  Fill: maker={} taker={} {} @ {} ticks",
            fill.maker.0, fill.taker.0, fill.qty, fill.px_ticks
        );
    });

    // Ask at $150.00
    let ask_order = Order {
        id: OrderId(1),
        side: Side::Ask,
        px_ticks: 15000, // $150.00 in ticks
        qty: 100,
        kind: OrderKind::Limit,
        tif: TimeInForce::GTC,
        owner: OwnerId(1),
        ts_ns: 0,
    };

    // Bid at $149.50 (creates spread)
    let bid_order = Order {
        id: OrderId(2),
        side: Side::Bid,
        px_ticks: 14950, // $149.50 in ticks
        qty: 50,
        kind: OrderKind::Limit,
        tif: TimeInForce::GTC,
        owner: OwnerId(2),
        ts_ns: 0,
    };

    println!("Submitting ask order: {} @ {}", ask_order.qty, ask_order.px_ticks);
    ob.submit(ask_order, None).unwrap();

    println!("Submitting bid order: {} @ {}", bid_order.qty, bid_order.px_ticks);
    ob.submit(bid_order, None).unwrap();

    println!("Best bid: {:.2}", ob.best_bid());
    println!("Best ask: {:.2}", ob.best_ask());
    println!("Weighted mid: {:.4}", ob.weighted_mid_price());

    // Crossing IOC bid that executes against the resting ask
    let crossing_bid = Order {
        id: OrderId(3),
        side: Side::Bid,
        px_ticks: 15000, // Matches ask price
        qty: 75,         // Partial fill of ask order
        kind: OrderKind::Limit,
        tif: TimeInForce::IOC,
        owner: OwnerId(3),
        ts_ns: 0,
    };

    println!("Submitting crossing bid: {} @ {}", crossing_bid.qty, crossing_bid.px_ticks);
    let mut fills = Vec::new();
    ob.submit(crossing_bid, Some(&mut fills)).unwrap();

    println!("Fills executed: {}", fills.len());
    // Fill executes at the maker's price (15000): maker id 1, taker id 3

    println!("Final best bid: {:.2}", ob.best_bid()); // Original bid remains
    println!("Final best ask: {:.2}", ob.best_ask()); // 25 shares left of original ask

    println!("Ask depth: {:?}", ob.top_levels(Side::Ask, 5));
    let stats = ob.stats();
    println!(
        "Stats: {} orders processed, {} fills, last submit {} ns",
        stats.orders_processed, stats.fills_generated, stats.last_processing_time_ns
    );

    ob.cancel_all(Side::Ask);
    println!("After cancel_all(Ask): resting orders = {}", ob.order_count());
}
