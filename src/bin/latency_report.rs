use arb_core::clock::ScopedTimer;
use arb_core::report::{write_csv, LatencyReport};
use arb_core::runtime::{pin_to_core, CorePin};
use arb_core::{
    now, Duration, Exchange, FixedPool, OrderId, OrderRecord, OrderSlab, OrderType, Price,
    Quantity, Side, SpscQueue, PRICE_SCALE,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const POOL_SLOTS: usize = 65_536;
const QUEUE_SLOTS: usize = 4_096;

/// Single-thread latency of pool, queue and slab operations
#[derive(Parser, Debug)]
#[command(name = "latency-report")]
struct Args {
    /// Operations measured per primitive
    #[arg(short, long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Upper bound of the histograms, in nanoseconds
    #[arg(long, default_value_t = 100_000)]
    max_ns: u64,

    /// Pin the benchmark thread to the last core
    #[arg(long)]
    pin: bool,

    /// Also write the summaries to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn sample_order(id: u64) -> OrderRecord {
    OrderRecord::new(
        OrderId::new(id),
        Exchange::ALL[(id % Exchange::COUNT as u64) as usize],
        if id % 2 == 0 { Side::Buy } else { Side::Sell },
        OrderType::Limit,
        Price::new(3_000 * PRICE_SCALE + (id % 100) as i64),
        Quantity::new(10),
        now(),
    )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if args.pin {
        pin_to_core(CorePin::Last);
    }

    info!(iterations = args.iterations, "running latency report");

    // Pool: allocate + write + release
    let mut pool: FixedPool<OrderRecord, POOL_SLOTS> = FixedPool::with_init(OrderRecord::empty);
    let mut pool_report = LatencyReport::new("pool_alloc_release", args.max_ns)?;
    for i in 0..args.iterations {
        let mut elapsed = Duration::default();
        {
            let _timer = ScopedTimer::new(&mut elapsed);
            if let Some(handle) = pool.allocate() {
                *pool.get_mut(&handle) = sample_order(i);
                std::hint::black_box(pool.get(&handle));
                pool.release(handle);
            }
        }
        pool_report.record(elapsed);
    }

    // Queue: push + pop on one thread (no contention, pure instruction cost)
    let mut queue: SpscQueue<u64, QUEUE_SLOTS> = SpscQueue::new();
    let (mut tx, mut rx) = queue.split();
    let mut queue_report = LatencyReport::new("queue_push_pop", args.max_ns)?;
    for i in 0..args.iterations {
        let mut elapsed = Duration::default();
        {
            let _timer = ScopedTimer::new(&mut elapsed);
            if tx.try_push(i).is_ok() {
                std::hint::black_box(rx.try_pop().ok());
            }
        }
        queue_report.record(elapsed);
    }

    // Slab: insert + lookup + remove
    let mut slab: OrderSlab<POOL_SLOTS> = OrderSlab::new();
    let mut slab_report = LatencyReport::new("slab_insert_remove", args.max_ns)?;
    for i in 0..args.iterations {
        let order = sample_order(i + 1);
        let mut elapsed = Duration::default();
        {
            let _timer = ScopedTimer::new(&mut elapsed);
            if slab.insert(order).is_ok() {
                std::hint::black_box(slab.get(order.order_id));
                slab.remove(order.order_id);
            }
        }
        slab_report.record(elapsed);
    }

    let summaries = [
        pool_report.summary(),
        queue_report.summary(),
        slab_report.summary(),
    ];
    for summary in &summaries {
        println!("\n{summary}");
    }

    println!("\nDistribution (queue_push_pop):");
    for (upper, count) in queue_report.buckets() {
        println!("<= {:6} ns: {:10} count", upper, count);
    }

    if let Some(path) = &args.csv {
        write_csv(path, &summaries)?;
        info!(path = %path.display(), "wrote csv report");
    }

    Ok(())
}
