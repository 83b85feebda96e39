//! Performance testing suite for the order book.
//!
//! Measures latency and throughput under various scenarios:
//! - Market data access, order submission, matching, cancellation
//! - Sustained throughput testing with a mixed workload

use orderbook::{Order, OrderBook, OrderId, OrderKind, OwnerId, Side, TimeInForce};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Runs complete latency test suite.
pub fn run_latency_tests() {
    println!(" Matchbook - Real-time Latency Tests\n");

    test_market_data_latency();
    test_order_submission_latency();
    test_order_matching_latency();
    test_cancellation_latency();
}

/// Creates test order with current timestamp and a unique owner, so
/// self-match prevention stays out of the measurements.
fn create_order(id: u64, side: Side, price: i64, qty: u32) -> Order {
    Order {
        id: OrderId(id),
        side,
        px_ticks: price,
        qty,
        kind: OrderKind::Limit,
        tif: TimeInForce::GTC,
        owner: OwnerId(id as u32),
        ts_ns: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64,
    }
}

/// Tests best bid/ask lookup performance.
fn test_market_data_latency() {
    println!(" Market Data Latency Test");

    let ob = OrderBook::new(256);

    // Populate with 100 orders per side
    for i in 0..100 {
        let ask = create_order(i, Side::Ask, 10000 + i as i64, 100);
        ob.submit(ask, None).unwrap();
        let bid = create_order(i + 100, Side::Bid, 9999 - i as i64, 100);
        ob.submit(bid, None).unwrap();
    }

    let iterations = 1_000_000;

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(ob.best_bid());
    }
    let bid_duration = start.elapsed();

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(ob.best_ask());
    }
    let ask_duration = start.elapsed();

    println!("  Best bid lookup: {:.2} ns/call", bid_duration.as_nanos() as f64 / iterations as f64);
    println!("  Best ask lookup: {:.2} ns/call", ask_duration.as_nanos() as f64 / iterations as f64);
    println!("  Combined latency: {:.2} ns\n", (bid_duration.as_nanos() + ask_duration.as_nanos()) as f64 / iterations as f64);
}

/// Tests order submission latency for non-crossing orders.
fn test_order_submission_latency() {
    println!(" Order Submission Latency Test");

    let iterations = 10_000;
    let mut total_time = 0u128;

    for i in 0..iterations {
        let ob = OrderBook::new(16);
        let order = create_order(i, Side::Bid, 10000 - i as i64, 100);

        let start = Instant::now();
        ob.submit(order, None).unwrap();
        total_time += start.elapsed().as_nanos();
    }

    let avg_latency = total_time as f64 / iterations as f64;
    println!("  Average order submission: {:.2} ns", avg_latency);
    println!("  Throughput: {:.0} orders/second\n", 1_000_000_000.0 / avg_latency);
}

/// Tests order matching latency for crossing orders.
fn test_order_matching_latency() {
    println!(" Order Matching Latency Test");

    let iterations = 1_000;
    let mut total_setup_time = 0u128;
    let mut total_match_time = 0u128;

    for i in 0..iterations {
        let setup_start = Instant::now();
        let ob = OrderBook::new(32);

        // Add 10 resting ask orders
        for j in 0..10 {
            let ask = create_order(j, Side::Ask, 10000 + j as i64, 100);
            ob.submit(ask, None).unwrap();
        }
        total_setup_time += setup_start.elapsed().as_nanos();

        // Crossing bid that matches multiple levels
        let crossing_order = create_order(1000 + i, Side::Bid, 10005, 500);
        let mut fills = Vec::with_capacity(8);

        let match_start = Instant::now();
        ob.submit(crossing_order, Some(&mut fills)).unwrap();
        total_match_time += match_start.elapsed().as_nanos();

        std::hint::black_box(fills);
    }

    println!("  Setup (10 resting orders): {:.2} ns", total_setup_time as f64 / iterations as f64);
    println!("  Crossing order execution: {:.2} ns", total_match_time as f64 / iterations as f64);
    println!("  Total order-to-trade: {:.2} ns\n", (total_setup_time + total_match_time) as f64 / iterations as f64);
}

/// Compares per-id cancellation against bulk side cancellation.
fn test_cancellation_latency() {
    println!(" Cancellation Latency Test");

    let iterations = 1_000;
    let orders_per_test = 100u64;

    // Registry-based cancel by id
    let mut total_cancel_time = 0u128;
    for i in 0..iterations {
        let ob = OrderBook::new(orders_per_test as usize);
        let mut order_ids = Vec::new();

        for j in 0..orders_per_test {
            let order = create_order(i * orders_per_test + j, Side::Bid, 10000, 100);
            order_ids.push(order.id);
            ob.submit(order, None).unwrap();
        }

        let start = Instant::now();
        // Cancel 50% of the orders individually
        for (idx, &order_id) in order_ids.iter().enumerate() {
            if idx % 2 == 0 {
                ob.cancel(order_id);
            }
        }
        total_cancel_time += start.elapsed().as_nanos();
    }

    // Bulk cancel of the whole side
    let mut total_bulk_time = 0u128;
    for i in 0..iterations {
        let ob = OrderBook::new(orders_per_test as usize);

        for j in 0..orders_per_test {
            let order = create_order(
                i * orders_per_test + j + 1_000_000,
                Side::Bid,
                10000 - j as i64,
                100,
            );
            ob.submit(order, None).unwrap();
        }

        let start = Instant::now();
        ob.cancel_all(Side::Bid);
        total_bulk_time += start.elapsed().as_nanos();
    }

    println!("  Cancel by id: {:.2} ns per order", total_cancel_time as f64 / (iterations * orders_per_test / 2) as f64);
    println!("  Bulk cancel: {:.2} ns per order", total_bulk_time as f64 / (iterations * orders_per_test) as f64);
    println!();
}

/// Runs sustained throughput test with mixed workload.
pub fn run_throughput_test() {
    println!(" Sustained Throughput Test (10 seconds)");

    let ob = OrderBook::new(65_536);
    let mut order_id = 1u64;
    let mut orders_submitted = 0u64;
    let mut fills_seen = 0u64;
    let mut fills = Vec::with_capacity(16);

    let start_time = Instant::now();
    let duration = std::time::Duration::from_secs(10);

    while start_time.elapsed() < duration {
        // Mix of order types: 25% each of non-crossing bids/asks, crossing bids/asks
        match order_id % 4 {
            0 => {
                // Non-crossing bid
                let order = create_order(order_id, Side::Bid, 9999 - (order_id % 100) as i64, 100);
                ob.submit(order, None).unwrap();
            }
            1 => {
                // Non-crossing ask
                let order = create_order(order_id, Side::Ask, 10001 + (order_id % 100) as i64, 100);
                ob.submit(order, None).unwrap();
            }
            2 => {
                // Crossing IOC bid
                let order = Order {
                    tif: TimeInForce::IOC,
                    ..create_order(order_id, Side::Bid, 10001, 50)
                };
                fills.clear();
                ob.submit(order, Some(&mut fills)).unwrap();
                fills_seen += fills.len() as u64;
            }
            3 => {
                // Crossing IOC ask
                let order = Order {
                    tif: TimeInForce::IOC,
                    ..create_order(order_id, Side::Ask, 9999, 50)
                };
                fills.clear();
                ob.submit(order, Some(&mut fills)).unwrap();
                fills_seen += fills.len() as u64;
            }
            _ => unreachable!(),
        }

        order_id += 1;
        orders_submitted += 1;

        // Periodic market data queries (every 100 orders)
        if order_id % 100 == 0 {
            std::hint::black_box(ob.best_bid());
            std::hint::black_box(ob.best_ask());
        }
    }

    let elapsed = start_time.elapsed();
    let orders_per_sec = orders_submitted as f64 / elapsed.as_secs_f64();
    let fills_per_sec = fills_seen as f64 / elapsed.as_secs_f64();
    let stats = ob.stats();

    println!("  Duration: {:.1} seconds", elapsed.as_secs_f64());
    println!("  Orders submitted: {}", orders_submitted);
    println!("  Fills observed: {}", fills_seen);
    println!("  Order throughput: {:.0} orders/second", orders_per_sec);
    println!("  Fill throughput: {:.0} fills/second", fills_per_sec);
    println!("  Book counters: processed={}, fills={}, last submit={} ns", stats.orders_processed, stats.fills_generated, stats.last_processing_time_ns);
    println!("  Final book state: bid={:.2}, ask={:.2}, resting={}", ob.best_bid(), ob.best_ask(), ob.order_count());
}
