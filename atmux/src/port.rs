//! Platform capabilities consumed by the multiplexer
//!
//! The physical serial peripheral, its DMA controller and the interrupt
//! plumbing stay outside this crate. A platform integration implements
//! [`Port`] and routes three interrupts into the multiplexer:
//!
//! * the idle-line interrupt calls [`Mux::idle_line_isr`](crate::Mux::idle_line_isr)
//!   (circular DMA reception);
//! * alternatively, a per-byte RX-complete interrupt calls
//!   [`Mux::rx_byte_isr`](crate::Mux::rx_byte_isr);
//! * the TX-complete interrupt calls
//!   [`Mux::tx_complete_isr`](crate::Mux::tx_complete_isr).
//!
//! The multiplexer keeps the port behind an interrupt-masking mutex, so the
//! implementation is called from both task and interrupt context but never
//! concurrently.

/// One serial peripheral with circular-DMA reception and DMA transmission.
pub trait Port {
    type Error: core::fmt::Debug;

    /// Arms circular DMA reception into the hardware ring.
    fn start_receive(&mut self) -> Result<(), Self::Error>;

    /// Aborts an ongoing reception.
    fn abort_receive(&mut self);

    /// Value of the DMA remaining-count register: the number of bytes the
    /// controller will still write before wrapping to the ring start.
    fn rx_remaining(&self) -> usize;

    /// Read-only view of the hardware receive ring.
    fn rx_ring(&self) -> &[u8];

    /// Begins DMA transmission of `bytes`.
    ///
    /// The completion interrupt must call
    /// [`Mux::tx_complete_isr`](crate::Mux::tx_complete_isr). `bytes` stays
    /// readable until then; the multiplexer guarantees this by holding its
    /// transmit lock across the completion wait.
    fn start_transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Aborts an ongoing transmission.
    fn abort_transmit(&mut self);
}
