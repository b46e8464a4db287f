//! Translation of circular DMA positions into contiguous byte runs

use core::ops::Range;

/// Byte runs to forward after a DMA position update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Window {
    /// The position did not move
    Empty,
    /// One contiguous run
    Forward(Range<usize>),
    /// The position wrapped: the ring tail, then the ring head
    Wrapped(Range<usize>, Range<usize>),
}

/// Ranges of the hardware ring of length `len` written between the cursor
/// positions `last` and `current`.
pub(crate) fn window(last: usize, current: usize, len: usize) -> Window {
    debug_assert!(last <= len && current <= len);
    if current == last {
        Window::Empty
    } else if current > last {
        Window::Forward(last..current)
    } else if current == 0 {
        Window::Forward(last..len)
    } else {
        Window::Wrapped(last..len, 0..current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_movement_is_empty() {
        assert_eq!(window(0, 0, 512), Window::Empty);
        assert_eq!(window(100, 100, 512), Window::Empty);
    }

    #[test]
    fn forward_movement_is_one_run() {
        assert_eq!(window(0, 10, 512), Window::Forward(0..10));
        assert_eq!(window(500, 512, 512), Window::Forward(500..512));
    }

    #[test]
    fn wrap_produces_tail_then_head() {
        assert_eq!(window(500, 20, 512), Window::Wrapped(500..512, 0..20));
        assert_eq!(window(511, 1, 512), Window::Wrapped(511..512, 0..1));
    }

    #[test]
    fn wrap_to_ring_start_has_no_head_run() {
        assert_eq!(window(500, 0, 512), Window::Forward(500..512));
    }
}
