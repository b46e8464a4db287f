//! Compile-time configuration
//!
//! The buffer and table capacities below are the defaults of the
//! const-generic parameters of [`Mux`](crate::Mux); instantiate the type
//! with explicit parameters to override them.

use embassy_time::Duration;

/// Capacity of the ingress byte ring in bytes.
pub const RX_BUFFER_SIZE: usize = 512;

/// Capacity of the transmit scratch buffer in bytes (line terminator
/// included).
pub const TX_BUFFER_SIZE: usize = 512;

/// Capacity of the send-receive accumulation buffer in bytes.
pub const SR_BUFFER_SIZE: usize = 512;

/// Number of handler table slots.
pub const MAX_HANDLERS: usize = 10;

/// Longest registrable prefix in bytes.
pub const MAX_PREFIX_LEN: usize = 32;

/// Line terminator for both directions.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Longest wait for line bytes before the dispatcher loops around.
pub const LINE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Handler-state lock timeout in the dispatcher; the line in flight is
/// dropped when it expires.
pub const DISPATCH_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Lock acquisition timeout for registration and for the transmit path.
pub const MUTEX_TIMEOUT: Duration = Duration::from_millis(500);

/// Longest wait for the transmit-complete notification.
pub const TX_TIMEOUT: Duration = Duration::from_millis(1000);
