//! Error types for allocator construction.
//!
//! Only construction is fallible in the `Result` sense. Runtime conditions
//! (exhaustion, ownership violations, ordering violations) are reported
//! through `Option` returns and silent no-ops on the [`Allocator`] trait,
//! so a failed allocation never unwinds.
//!
//! [`Allocator`]: crate::allocator::Allocator

use thiserror::Error;

/// Result alias used by fallible constructors.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors that can occur while building an allocator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The backing region could not be reserved from the host allocator.
    #[error("out of memory: failed to reserve {requested} bytes")]
    OutOfMemory {
        /// Number of bytes the constructor asked the host for.
        requested: usize,
    },

    /// A configuration parameter was rejected outright (zero capacity,
    /// zero block size, zero block count).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A size computation overflowed `usize`.
    #[error("size computation overflowed")]
    SizeOverflow,
}
