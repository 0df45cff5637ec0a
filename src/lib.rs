//! # arb-core
//!
//! Allocation-free building blocks for a low-latency trading engine.
//!
//! ## Design Principles
//!
//! - **No hot-path allocation**: Pools and queues reserve all storage up front
//! - **O(1) Operations**: Allocate, release, push and pop run in constant time
//! - **Lock-free hand-off**: The SPSC queue uses only acquire/release atomics
//! - **Strong types**: Prices, quantities and timestamps never mix implicitly
//!
//! ## Architecture
//!
//! ```text
//! [Strategy Thread] --> [SpscQueue<FillEvent>] --> [I/O Thread]
//!        |
//!  [FixedPool<OrderRecord>]
//! ```
//!
//! The pool and the queue are independent; neither uses the other.

pub mod clock;
pub mod order;
pub mod pool;
pub mod queue;
pub mod report;
pub mod runtime;
pub mod types;

// Re-exports for convenience
pub use clock::{now, ScopedTimer};
pub use order::{FillEvent, OrderRecord, OrderSlab, SlabError};
pub use pool::{FixedPool, SlotHandle, SlotIndex};
pub use queue::{Consumer, PopError, Producer, PushError, SpscQueue};
pub use types::{
    to_double_price, to_fixed_price, Duration, Exchange, OrderId, OrderStatus, OrderType, Price,
    Quantity, Side, Timestamp, PRICE_SCALE,
};
