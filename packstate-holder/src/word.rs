//! Atomic cell sized to a layout's backing word.

use packstate_state::BackingWidth;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// An atomic word of the backing width, read and written as `u64`.
///
/// Values stored in a narrow cell always fit in 32 bits because states of a
/// 32-bit layout never have higher bits set.
pub(crate) enum AtomicWord {
    Narrow(AtomicU32),
    Wide(AtomicU64),
}

impl AtomicWord {
    pub(crate) fn new(backing: BackingWidth, value: u64) -> Self {
        match backing {
            BackingWidth::U32 => Self::Narrow(AtomicU32::new(value as u32)),
            BackingWidth::U64 => Self::Wide(AtomicU64::new(value)),
        }
    }

    pub(crate) fn load(&self) -> u64 {
        match self {
            Self::Narrow(cell) => u64::from(cell.load(Ordering::SeqCst)),
            Self::Wide(cell) => cell.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn swap(&self, value: u64) -> u64 {
        match self {
            Self::Narrow(cell) => u64::from(cell.swap(value as u32, Ordering::SeqCst)),
            Self::Wide(cell) => cell.swap(value, Ordering::SeqCst),
        }
    }

    /// Weak compare-and-swap; may fail spuriously. Returns the observed value
    /// on failure.
    pub(crate) fn compare_exchange_weak(&self, current: u64, new: u64) -> Result<u64, u64> {
        match self {
            Self::Narrow(cell) => cell
                .compare_exchange_weak(current as u32, new as u32, Ordering::SeqCst, Ordering::SeqCst)
                .map(u64::from)
                .map_err(u64::from),
            Self::Wide(cell) => {
                cell.compare_exchange_weak(current, new, Ordering::SeqCst, Ordering::SeqCst)
            }
        }
    }
}
