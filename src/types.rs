//! Scalar and enum vocabulary shared by the trading engine.
//!
//! Every domain quantity is its own newtype over a 64-bit integer so that a
//! `Price` can never be compared with, or added to, a `Quantity` by accident.
//! Only the arithmetic actually needed is provided:
//! `Timestamp - Timestamp -> Duration` and `Timestamp + Duration -> Timestamp`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Fixed-point scale: one major unit is `100_000_000` price units.
pub const PRICE_SCALE: i64 = 100_000_000;

/// Number of decimal places encoded by [`PRICE_SCALE`].
const PRICE_DECIMALS: u32 = 8;

// ============================================================================
// Scalars
// ============================================================================

/// Fixed-point price (e.g., 123.456789 -> 12_345_678_900)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(i64);

/// Order quantity in exchange lot units
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quantity(i64);

/// Monotonic timestamp in nanoseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

/// Exchange or client assigned order identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(u64);

/// Elapsed time in nanoseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration(u64);

macro_rules! scalar {
    ($name:ident, $repr:ty) => {
        impl $name {
            /// Wrap a raw value
            #[inline]
            pub const fn new(value: $repr) -> Self {
                Self(value)
            }

            /// Unwrap the raw value
            #[inline]
            pub const fn get(self) -> $repr {
                self.0
            }
        }
    };
}

scalar!(Price, i64);
scalar!(Quantity, i64);
scalar!(Timestamp, u64);
scalar!(OrderId, u64);
scalar!(Duration, u64);

/// Placeholder for "no price"
pub const INVALID_PRICE: Price = Price(0);

/// Placeholder for "no quantity"
pub const INVALID_QUANTITY: Quantity = Quantity(0);

/// Placeholder for "no order"
pub const INVALID_ORDER_ID: OrderId = OrderId(0);

impl Sub for Timestamp {
    type Output = Duration;

    /// Elapsed time between two readings. Wraps if `rhs` is later than `self`.
    #[inline]
    fn sub(self, rhs: Timestamp) -> Duration {
        Duration(self.0.wrapping_sub(rhs.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    #[inline]
    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.wrapping_add(rhs.0))
    }
}

impl Duration {
    /// Duration as `std::time::Duration`, for interop with `Instant` deadlines
    #[inline]
    pub const fn as_std(self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.0)
    }
}

impl From<std::time::Duration> for Duration {
    /// Saturates at `u64::MAX` nanoseconds (~584 years).
    fn from(d: std::time::Duration) -> Self {
        Duration(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ns", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ns", self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal().normalize())
    }
}

// ============================================================================
// Price conversions
// ============================================================================

/// Convert a floating-point price into fixed point.
///
/// Truncates toward zero like a scaled integer cast; values outside the
/// `i64` range saturate.
#[inline]
pub fn to_fixed_price(price: f64) -> Price {
    Price((price * PRICE_SCALE as f64) as i64)
}

/// Convert a fixed-point price back to floating point
#[inline]
pub fn to_double_price(price: Price) -> f64 {
    price.0 as f64 / PRICE_SCALE as f64
}

impl Price {
    /// Exact conversion from a decimal price.
    ///
    /// Returns `None` if the value has more than 8 fractional digits
    /// or does not fit in an `i64` after scaling.
    pub fn from_decimal(value: Decimal) -> Option<Price> {
        let scaled = value.checked_mul(Decimal::from(PRICE_SCALE))?;
        if scaled.fract() != Decimal::ZERO {
            return None;
        }
        scaled.to_i64().map(Price)
    }

    /// Exact decimal representation of this price
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, PRICE_DECIMALS)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Wire name ("BUY" / "SELL")
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Venues the engine routes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Exchange {
    Binance = 0,
    Bybit = 1,
    Okx = 2,
}

impl Exchange {
    /// Number of venues, for sizing per-exchange arrays
    pub const COUNT: usize = 3;

    /// All venues in ordinal order
    pub const ALL: [Exchange; Exchange::COUNT] = [Exchange::Binance, Exchange::Bybit, Exchange::Okx];

    /// Ordinal, usable as an array index
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Order lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    /// Created locally, not yet sent
    New = 0,
    /// Sent to exchange, awaiting acknowledgment
    Sent = 1,
    /// Exchange acknowledged, order is live
    Acked = 2,
    /// Some quantity filled, rest still live
    PartiallyFilled = 3,
    Filled = 4,
    Cancelled = 5,
    Rejected = 6,
    Error = 7,
}

impl OrderStatus {
    /// Every status, in ordinal order
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::New,
        OrderStatus::Sent,
        OrderStatus::Acked,
        OrderStatus::PartiallyFilled,
        OrderStatus::Filled,
        OrderStatus::Cancelled,
        OrderStatus::Rejected,
        OrderStatus::Error,
    ];

    /// True once the order can no longer change
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Error
        )
    }
}

/// Order type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum OrderType {
    /// Rests at a limit price
    #[default]
    Limit = 0,
    /// Executes at the best available price
    Market = 1,
}
