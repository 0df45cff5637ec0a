//! Order records and fill events, the payloads moved through the pool and queue.
//!
//! [`OrderSlab`] stores live orders in a [`FixedPool`] and finds them by
//! [`OrderId`] through an FxHashMap sized once at construction.

use crate::pool::{FixedPool, SlotHandle};
use crate::types::{
    Exchange, OrderId, OrderStatus, OrderType, Price, Quantity, Side, Timestamp, INVALID_ORDER_ID,
    INVALID_PRICE, INVALID_QUANTITY,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-order state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub exchange: Exchange,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Limit price (ignored for market orders)
    pub price: Price,
    /// Original quantity
    pub quantity: Quantity,
    /// Cumulative filled quantity
    pub filled: Quantity,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Create a new local order in `New` status
    pub fn new(
        order_id: OrderId,
        exchange: Exchange,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        now: Timestamp,
    ) -> Self {
        Self {
            order_id,
            exchange,
            side,
            order_type,
            status: OrderStatus::New,
            price,
            quantity,
            filled: INVALID_QUANTITY,
            created_at: now,
            updated_at: now,
        }
    }

    /// Placeholder contents for unused slots
    pub const fn empty() -> Self {
        Self {
            order_id: INVALID_ORDER_ID,
            exchange: Exchange::Binance,
            side: Side::Buy,
            order_type: OrderType::Limit,
            status: OrderStatus::New,
            price: INVALID_PRICE,
            quantity: INVALID_QUANTITY,
            filled: INVALID_QUANTITY,
            created_at: Timestamp::new(0),
            updated_at: Timestamp::new(0),
        }
    }

    /// Quantity still open
    #[inline]
    pub fn remaining(&self) -> Quantity {
        Quantity::new(self.quantity.get() - self.filled.get())
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply an execution.
    ///
    /// Fills beyond the open quantity are clamped. Returns `false` and leaves
    /// the record untouched if the order is already terminal or has no open
    /// quantity (non-positive size, or already filled past its size).
    pub fn apply_fill(&mut self, qty: Quantity, at: Timestamp) -> bool {
        let open = self.remaining().get();
        if self.is_terminal() || open <= 0 {
            return false;
        }

        let fill = qty.get().clamp(0, open);
        self.filled = Quantity::new(self.filled.get() + fill);
        self.status = if self.remaining().get() == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = at;
        true
    }
}

/// An execution report carried from the strategy thread to the I/O thread
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    pub order_id: OrderId,
    pub exchange: Exchange,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    /// When the fill was produced
    pub timestamp: Timestamp,
}

/// Reasons an order cannot be stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SlabError {
    #[error("order slab exhausted")]
    PoolExhausted,
    #[error("order id {0} already stored")]
    DuplicateOrderId(OrderId),
}

/// Fixed-capacity store of live orders keyed by id.
pub struct OrderSlab<const N: usize> {
    pool: FixedPool<OrderRecord, N>,
    index: FxHashMap<OrderId, SlotHandle>,
}

impl<const N: usize> OrderSlab<N> {
    pub fn new() -> Self {
        debug!(capacity = N, "order slab created");
        Self {
            pool: FixedPool::with_init(OrderRecord::empty),
            index: FxHashMap::with_capacity_and_hasher(N, Default::default()),
        }
    }

    /// Store a record in a free slot.
    ///
    /// # Complexity
    /// O(1) amortized; the map never grows past its initial capacity
    pub fn insert(&mut self, record: OrderRecord) -> Result<(), SlabError> {
        if self.index.contains_key(&record.order_id) {
            return Err(SlabError::DuplicateOrderId(record.order_id));
        }

        let handle = self.pool.allocate().ok_or(SlabError::PoolExhausted)?;
        *self.pool.get_mut(&handle) = record;
        self.index.insert(record.order_id, handle);
        Ok(())
    }

    #[inline]
    pub fn get(&self, order_id: OrderId) -> Option<&OrderRecord> {
        self.index.get(&order_id).map(|h| self.pool.get(h))
    }

    #[inline]
    pub fn get_mut(&mut self, order_id: OrderId) -> Option<&mut OrderRecord> {
        let handle = self.index.get(&order_id)?;
        Some(self.pool.get_mut(handle))
    }

    /// Remove a record, returning its final state and freeing the slot
    pub fn remove(&mut self, order_id: OrderId) -> Option<OrderRecord> {
        let handle = self.index.remove(&order_id)?;
        let record = *self.pool.get(&handle);
        self.pool.release(handle);
        Some(record)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for OrderSlab<N> {
    fn default() -> Self {
        Self::new()
    }
}
