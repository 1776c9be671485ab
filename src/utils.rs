//! Alignment and size helpers used throughout the crate.

/// Default alignment applied when a caller passes a malformed (non-power-of-two
/// or zero) alignment. Matches the strictest alignment any scalar type needs.
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Aligns a value up to the nearest multiple of alignment
///
/// # Examples
/// ```
/// use memory_engine::utils::align_up;
///
/// assert_eq!(align_up(7, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
#[inline(always)]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Aligns a value down to the nearest multiple of alignment
#[inline(always)]
pub const fn align_down(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    value & !(alignment - 1)
}

/// Checks if a value is aligned to the given alignment
///
/// # Examples
/// ```
/// use memory_engine::utils::is_aligned;
///
/// assert!(is_aligned(16, 8));
/// assert!(!is_aligned(17, 8));
/// ```
#[inline(always)]
pub const fn is_aligned(value: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    value & (alignment - 1) == 0
}

/// Calculates padding needed to align a value
#[inline(always)]
pub const fn padding_needed(value: usize, alignment: usize) -> usize {
    align_up(value, alignment) - value
}

/// Returns the requested alignment if it is usable, [`DEFAULT_ALIGNMENT`]
/// otherwise. Malformed alignments are corrected, never rejected.
#[inline(always)]
pub const fn sanitize_alignment(alignment: usize) -> usize {
    if alignment.is_power_of_two() {
        alignment
    } else {
        DEFAULT_ALIGNMENT
    }
}

/// Format bytes into a human-readable string
///
/// # Examples
/// ```
/// use memory_engine::utils::format_bytes;
///
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.2} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 16), 16);
    }

    #[test]
    fn test_align_down() {
        assert_eq!(align_down(7, 8), 0);
        assert_eq!(align_down(8, 8), 8);
        assert_eq!(align_down(15, 8), 8);
    }

    #[test]
    fn test_padding_needed() {
        assert_eq!(padding_needed(7, 8), 1);
        assert_eq!(padding_needed(8, 8), 0);
        assert_eq!(padding_needed(9, 8), 7);
    }

    #[test]
    fn test_sanitize_alignment() {
        assert_eq!(sanitize_alignment(8), 8);
        assert_eq!(sanitize_alignment(0), DEFAULT_ALIGNMENT);
        assert_eq!(sanitize_alignment(3), DEFAULT_ALIGNMENT);
        assert_eq!(sanitize_alignment(24), DEFAULT_ALIGNMENT);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
    }
}
