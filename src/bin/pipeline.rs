use arb_core::report::LatencyReport;
use arb_core::runtime::{pin_to_core, CorePin};
use arb_core::{
    now, Exchange, FillEvent, OrderId, OrderRecord, OrderSlab, OrderType, Price, Quantity, Side,
    SpscQueue, Timestamp, PRICE_SCALE,
};
use arrayvec::ArrayVec;
use clap::Parser;
use crossbeam_utils::Backoff;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const QUEUE_SLOTS: usize = 8_192;
const LIVE_ORDERS: usize = 1_024;
const BATCH: usize = 64;

/// Strategy thread -> I/O thread fill pipeline over an SPSC queue
#[derive(Parser, Debug)]
#[command(name = "pipeline")]
struct Args {
    /// Number of fill events to send
    #[arg(short, long, default_value_t = 5_000_000)]
    events: u64,

    /// Core index for the producer thread
    #[arg(long)]
    producer_core: Option<usize>,

    /// Core index for the consumer thread
    #[arg(long)]
    consumer_core: Option<usize>,

    /// Upper bound of the latency histogram, in nanoseconds
    #[arg(long, default_value_t = 10_000_000)]
    max_ns: u64,
}

fn core_pin(core: Option<usize>) -> CorePin {
    core.map_or(CorePin::None, CorePin::Index)
}

/// Simple LCG, good enough for synthetic load
fn next_rand(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state >> 32
}

fn new_order(id: u64, r: u64) -> OrderRecord {
    OrderRecord::new(
        OrderId::new(id),
        Exchange::ALL[(r % Exchange::COUNT as u64) as usize],
        if r % 2 == 0 { Side::Buy } else { Side::Sell },
        OrderType::Limit,
        Price::new(3_000 * PRICE_SCALE + (r % 1_000) as i64 * 1_000_000),
        Quantity::new(1 + (r % 100) as i64),
        now(),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let total = args.events;
    let mut latency = LatencyReport::new("fill_end_to_end", args.max_ns)?;

    let mut queue: SpscQueue<FillEvent, QUEUE_SLOTS> = SpscQueue::new();
    let (mut tx, mut rx) = queue.split();

    let started = Instant::now();
    let (full_spins, out_of_order) = std::thread::scope(|s| {
        // Strategy thread: owns the order slab, emits fills
        let producer = s.spawn(move || {
            pin_to_core(core_pin(args.producer_core));

            let mut slab: OrderSlab<LIVE_ORDERS> = OrderSlab::new();
            let mut live: Vec<OrderId> = Vec::with_capacity(LIVE_ORDERS);
            let mut rng = 12345u64;
            let mut next_id = 1u64;
            let mut full_spins = 0u64;

            while live.len() < LIVE_ORDERS {
                let r = next_rand(&mut rng);
                if slab.insert(new_order(next_id, r)).is_ok() {
                    live.push(OrderId::new(next_id));
                }
                next_id += 1;
            }

            for _ in 0..total {
                let r = next_rand(&mut rng);
                let pick = (r % LIVE_ORDERS as u64) as usize;
                let id = live[pick];

                let Some(order) = slab.get_mut(id) else {
                    warn!(%id, "live order missing from slab");
                    break;
                };
                let fill_qty = Quantity::new(1 + (r % 10) as i64);
                let at = now();
                order.apply_fill(fill_qty, at);
                let event = FillEvent {
                    order_id: order.order_id,
                    exchange: order.exchange,
                    side: order.side,
                    price: order.price,
                    quantity: fill_qty,
                    timestamp: at,
                };

                // Replace filled orders so the slab stays at capacity
                if order.is_terminal() {
                    slab.remove(id);
                    if slab.insert(new_order(next_id, r)).is_ok() {
                        live[pick] = OrderId::new(next_id);
                    }
                    next_id += 1;
                }

                let backoff = Backoff::new();
                let mut pending = event;
                while let Err(err) = tx.try_push(pending) {
                    pending = err.into_inner();
                    full_spins += 1;
                    backoff.snooze();
                }
            }
            full_spins
        });

        // I/O thread: drains fills in batches
        pin_to_core(core_pin(args.consumer_core));
        let mut batch: ArrayVec<FillEvent, BATCH> = ArrayVec::new();
        let mut received = 0u64;
        let mut last = Timestamp::new(0);
        let mut out_of_order = 0u64;
        let backoff = Backoff::new();

        while received < total {
            batch.clear();
            if rx.pop_batch(&mut batch) == 0 {
                // Only look at the producer once spinning has given way to yielding
                if backoff.is_completed() && producer.is_finished() && rx.is_empty() {
                    warn!(received, "producer stopped early");
                    break;
                }
                backoff.snooze();
                continue;
            }
            backoff.reset();

            let arrived = now();
            for event in &batch {
                if event.timestamp < last {
                    out_of_order += 1;
                }
                last = event.timestamp;
                latency.record(arrived - event.timestamp);
            }
            received += batch.len() as u64;
        }

        let full_spins = producer.join().unwrap_or_else(|_| {
            warn!("producer thread panicked");
            0
        });
        info!(received, "consumer drained");
        (full_spins, out_of_order)
    });
    let elapsed = started.elapsed();

    let summary = latency.summary();
    println!("\n=== Pipeline ===");
    println!("Events:       {}", summary.count);
    println!("Throughput:   {:.2} events/sec", summary.count as f64 / elapsed.as_secs_f64());
    println!("Full retries: {}", full_spins);
    println!("Out of order: {}", out_of_order);
    println!("\n{summary}");

    if out_of_order > 0 {
        warn!(out_of_order, "fills observed out of order");
    }
    Ok(())
}
