//! Benchmark harness using Criterion for latency measurement.
//!
//! Measures:
//! - Pool allocate + release (vs. a heap `Box` round trip)
//! - Queue push + pop on one thread (vs. rtrb)
//! - Queue throughput across two threads (vs. rtrb)

use arb_core::{FillEvent, FixedPool, OrderRecord, OrderSlab, SpscQueue};
use arb_core::{now, Exchange, OrderId, OrderType, Price, Quantity, Side, Timestamp};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn sample_event(i: u64) -> FillEvent {
    FillEvent {
        order_id: OrderId::new(i),
        exchange: Exchange::Okx,
        side: Side::Buy,
        price: Price::new(300_000_000_000),
        quantity: Quantity::new(10),
        timestamp: Timestamp::new(i),
    }
}

/// Benchmark: Pool allocate + release vs. Box
fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    let mut pool: FixedPool<OrderRecord, 4096> = FixedPool::with_init(OrderRecord::empty);
    group.bench_function("fixed_pool_alloc_release", |b| {
        b.iter(|| {
            let h = pool.allocate().expect("pool has room");
            black_box(pool.get_mut(&h));
            pool.release(h);
        })
    });

    group.bench_function("box_alloc_free", |b| {
        b.iter(|| black_box(Box::new(OrderRecord::empty())))
    });

    // Random live set: release order differs from allocation order
    group.bench_function("fixed_pool_random_churn", |b| {
        let mut pool: FixedPool<OrderRecord, 4096> = FixedPool::with_init(OrderRecord::empty);
        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF);
        let mut live = Vec::with_capacity(4096);
        for _ in 0..2048 {
            live.push(pool.allocate().expect("pool has room"));
        }
        b.iter(|| {
            let victim = rng.gen_range(0..live.len());
            let h = live.swap_remove(victim);
            pool.release(h);
            live.push(pool.allocate().expect("pool has room"));
        })
    });

    group.finish();
}

/// Benchmark: Order slab insert + remove
fn bench_slab(c: &mut Criterion) {
    let mut slab: OrderSlab<4096> = OrderSlab::new();
    let mut id = 0u64;
    c.bench_function("slab_insert_remove", |b| {
        b.iter(|| {
            id += 1;
            let order = OrderRecord::new(
                OrderId::new(id),
                Exchange::Binance,
                Side::Sell,
                OrderType::Limit,
                Price::new(100),
                Quantity::new(1),
                now(),
            );
            slab.insert(order).expect("slab has room");
            black_box(slab.remove(order.order_id))
        })
    });
}

/// Benchmark: push + pop on one thread
fn bench_queue_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_pop");

    let mut queue: SpscQueue<FillEvent, 1024> = SpscQueue::new();
    let (mut tx, mut rx) = queue.split();
    let mut i = 0u64;
    group.bench_function("spsc_queue", |b| {
        b.iter(|| {
            i += 1;
            tx.try_push(sample_event(i)).expect("queue has room");
            black_box(rx.try_pop().expect("value queued"))
        })
    });

    let (mut rtx, mut rrx) = rtrb::RingBuffer::<FillEvent>::new(1024);
    let mut j = 0u64;
    group.bench_function("rtrb", |b| {
        b.iter(|| {
            j += 1;
            rtx.push(sample_event(j)).expect("queue has room");
            black_box(rrx.pop().expect("value queued"))
        })
    });

    group.finish();
}

/// Benchmark: Throughput across two threads
fn bench_queue_cross_thread(c: &mut Criterion) {
    const MESSAGES: u64 = 100_000;
    let mut group = c.benchmark_group("queue_cross_thread");
    group.throughput(Throughput::Elements(MESSAGES));

    for batch in [1usize, 32].iter() {
        group.bench_with_input(BenchmarkId::new("spsc_queue", batch), batch, |b, &batch| {
            b.iter(|| {
                let mut queue: SpscQueue<u64, 4096> = SpscQueue::new();
                let (mut tx, mut rx) = queue.split();
                std::thread::scope(|s| {
                    s.spawn(move || {
                        for i in 0..MESSAGES {
                            let mut v = i;
                            while let Err(e) = tx.try_push(v) {
                                v = e.into_inner();
                                std::hint::spin_loop();
                            }
                        }
                    });

                    let mut received = 0u64;
                    let mut buf = arrayvec::ArrayVec::<u64, 32>::new();
                    while received < MESSAGES {
                        if batch == 1 {
                            if let Ok(v) = rx.try_pop() {
                                black_box(v);
                                received += 1;
                            }
                        } else {
                            buf.clear();
                            received += rx.pop_batch(&mut buf) as u64;
                            black_box(&buf);
                        }
                    }
                });
            })
        });
    }

    group.bench_function("rtrb", |b| {
        b.iter(|| {
            let (mut tx, mut rx) = rtrb::RingBuffer::<u64>::new(4096);
            std::thread::scope(|s| {
                s.spawn(move || {
                    for i in 0..MESSAGES {
                        while tx.push(i).is_err() {
                            std::hint::spin_loop();
                        }
                    }
                });

                let mut received = 0u64;
                while received < MESSAGES {
                    if let Ok(v) = rx.pop() {
                        black_box(v);
                        received += 1;
                    }
                }
            });
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pool,
    bench_slab,
    bench_queue_single_thread,
    bench_queue_cross_thread,
);

criterion_main!(benches);
