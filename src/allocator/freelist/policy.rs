//! Block selection policies.

/// Strategy for choosing a free block among those that fit a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FitPolicy {
    /// Lowest-address block that fits. Fastest search, fragments over time.
    FirstFit,
    /// Block leaving the least waste. Slower, packs tighter. The default.
    #[default]
    BestFit,
    /// Largest fitting block. Keeps remainders large enough to reuse.
    WorstFit,
}
