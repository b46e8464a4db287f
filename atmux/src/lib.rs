//! # Atmux
//!
//! An async multiplexer for line-oriented command/response protocols of the
//! AT family, sitting between a byte-oriented serial link (a UART wired to a
//! cellular modem or similar device) and application code, for no_std
//! environments. All buffers are bounded and owned by the multiplexer; the
//! steady-state path performs no dynamic allocation.
//!
//! ## Architecture
//!
//! ```text
//!  idle-line ISR ──► DMA capture ──► byte ring ──► line framer
//!                                                      │
//!                                                      ▼
//!               ┌───────────┐   first hit   ┌──────────────────┐
//!               │  handler  │◄──────────────┤ dispatcher (run) │
//!               │   table   │               └──────────────────┘
//!               └───────────┘                        │
//!                URC entries first                   ▼
//!                                        user handler / sr signal
//!
//!  application ──► send / send_receive ──► transmitter ──► port TX
//! ```
//!
//! Components:
//! * _Byte ring_ is a bounded FIFO fed from interrupt context. The producer
//!   never blocks; bytes that do not fit are dropped and the drop is
//!   observable at the capture layer.
//! * _DMA capture_ translates circular DMA buffer positions into contiguous
//!   byte runs on each idle-line interrupt.
//! * _Line framer_ assembles terminator-delimited lines from the ring with a
//!   bounded wait.
//! * _Handler table_ is an ordered list of (prefix, callback) pairs with
//!   first-hit matching. Unsolicited result code (URC) entries are kept at
//!   the front and take precedence.
//! * _Dispatcher_ is the single consumer task: frame, match, invoke. The
//!   handler state lock is always released before a callback runs, so
//!   callbacks may re-enter registration or send-receive.
//! * _Send-receive coordinator_ serves one synchronous request at a time:
//!   it installs a temporary table entry for the expected reply prefix,
//!   transmits, and waits for the dispatcher to signal the match while every
//!   incoming line is accumulated for the caller.
//! * _Transmitter_ serializes outbound writes, appends the line terminator
//!   and waits for the port's completion notification.
//!
//! The response parsers live in [`parse`] and are pure functions usable from
//! any context.
//!
//! ## Concurrency model
//!
//! One cooperative consumer task ([`Mux::run`]) plus two interrupt
//! producers ([`Mux::idle_line_isr`] / [`Mux::rx_byte_isr`] and
//! [`Mux::tx_complete_isr`]). ISR entry points use non-blocking primitives
//! only and bounded critical sections; the DMA cursor is the single word
//! shared directly with interrupt context and is read and modified under
//! interrupt masking. Handler invocations all happen on the consumer task's
//! stack, strictly in line-arrival order. Within one line, the send-receive
//! accumulator is updated before the matching handler runs, so a handler
//! observes a buffer that already contains its own line.
#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod capture;
pub mod config;
mod ingress;
mod mux;
pub mod port;
mod table;

pub use atmux_parse as parse;
pub use mux::Mux;
pub use table::Handler;

/// Error codes of the multiplexer surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An argument does not satisfy the documented constraints
    InvalidArg,
    /// A bounded resource (the handler table) is exhausted
    Resource,
    /// The port failed to arm reception
    InitFail,
    /// A lock or the send-receive slot is occupied
    Busy,
    /// No entry with the given prefix is registered
    NotFound,
    /// The port rejected the transmission
    SendFail,
    /// The awaited signal did not arrive in time
    Timeout,
    /// The temporary send-receive entry could not be installed
    Internal,
}
