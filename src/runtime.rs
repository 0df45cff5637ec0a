//! Runtime helpers layered above the queue: thread pinning and retry policy.
//!
//! The queue itself never waits. Callers that want to wait for space or data
//! poll with a [`crossbeam_utils::Backoff`] until their own deadline passes.

use crate::queue::{Consumer, PopError, Producer, PushError};
use crossbeam_utils::Backoff;
use std::time::Instant;
use tracing::{info, warn};

/// Which core to pin the calling thread to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CorePin {
    /// Leave scheduling to the OS
    #[default]
    None,
    /// The last available core (typically isolated from OS interrupts)
    Last,
    /// A specific core, by position in the OS core list
    Index(usize),
}

/// Pin the current thread.
///
/// Returns `true` if the thread was pinned. Failure is logged, not fatal.
pub fn pin_to_core(pin: CorePin) -> bool {
    if pin == CorePin::None {
        return false;
    }

    let Some(core_ids) = core_affinity::get_core_ids() else {
        warn!(?pin, "core ids unavailable, thread not pinned");
        return false;
    };

    let core = match pin {
        CorePin::None => None,
        CorePin::Last => core_ids.last().copied(),
        CorePin::Index(i) => core_ids.get(i).copied(),
    };

    match core {
        Some(core) if core_affinity::set_for_current(core) => {
            info!(core = core.id, "thread pinned");
            true
        }
        _ => {
            warn!(?pin, available = core_ids.len(), "failed to pin thread");
            false
        }
    }
}

/// Push `value`, retrying until it succeeds or `deadline` passes.
///
/// On timeout the value comes back inside `PushError::Full`.
pub fn push_until<T: Copy, const N: usize>(
    producer: &mut Producer<'_, T, N>,
    value: T,
    deadline: Instant,
) -> Result<(), PushError<T>> {
    let backoff = Backoff::new();
    let mut value = value;
    loop {
        match producer.try_push(value) {
            Ok(()) => return Ok(()),
            Err(err) => {
                if Instant::now() >= deadline {
                    return Err(err);
                }
                value = err.into_inner();
                backoff.snooze();
            }
        }
    }
}

/// Pop a value, retrying until one arrives or `deadline` passes.
pub fn pop_until<T: Copy, const N: usize>(
    consumer: &mut Consumer<'_, T, N>,
    deadline: Instant,
) -> Result<T, PopError> {
    let backoff = Backoff::new();
    loop {
        match consumer.try_pop() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if Instant::now() >= deadline {
                    return Err(err);
                }
                backoff.snooze();
            }
        }
    }
}
