//! Shared fixtures for the integration tests: a mock serial port and a
//! serialisation lock for the process-wide mock time driver.
#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard};

// Provides the critical-section implementation the mutexes need on the host.
use critical_section as _;

use atmux::Mux;
use atmux::port::Port;

/// Observable side of the mock port, shared with the test body.
pub struct PortState {
    /// Value the DMA remaining-count register reports
    pub remaining: Cell<usize>,
    /// Everything handed to `start_transmit`
    pub tx: RefCell<Vec<u8>>,
    /// Next `start_transmit` fails when set
    pub fail_tx: Cell<bool>,
    /// Next `start_receive` fails when set
    pub fail_rx: Cell<bool>,
    /// Whether reception is currently armed
    pub rx_armed: Cell<bool>,
}

impl PortState {
    fn new() -> Self {
        Self {
            remaining: Cell::new(0),
            tx: RefCell::new(Vec::new()),
            fail_tx: Cell::new(false),
            fail_rx: Cell::new(false),
            rx_armed: Cell::new(false),
        }
    }
}

/// Serial port double with a fixed receive ring.
pub struct MockPort {
    ring: &'static [u8],
    state: &'static PortState,
}

impl Port for MockPort {
    type Error = ();

    fn start_receive(&mut self) -> Result<(), ()> {
        if self.state.fail_rx.get() {
            return Err(());
        }
        self.state.rx_armed.set(true);
        Ok(())
    }

    fn abort_receive(&mut self) {
        self.state.rx_armed.set(false);
    }

    fn rx_remaining(&self) -> usize {
        self.state.remaining.get()
    }

    fn rx_ring(&self) -> &[u8] {
        self.ring
    }

    fn start_transmit(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.state.fail_tx.get() {
            return Err(());
        }
        self.state.tx.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }

    fn abort_transmit(&mut self) {}
}

/// A fresh multiplexer with default capacities and no DMA ring.
pub fn fixture() -> (&'static Mux<MockPort>, &'static PortState) {
    fixture_with_ring(&[])
}

/// A fresh multiplexer whose mock port exposes `ring` as the DMA window.
pub fn fixture_with_ring(
    ring: &'static [u8],
) -> (&'static Mux<MockPort>, &'static PortState) {
    fixture_sized::<512>(ring)
}

/// Like [`fixture_with_ring`] with an explicit ingress ring capacity.
pub fn fixture_sized<const RX: usize>(
    ring: &'static [u8],
) -> (&'static Mux<MockPort, RX>, &'static PortState) {
    let state = &*Box::leak(Box::new(PortState::new()));
    state.remaining.set(ring.len());
    let mux = &*Box::leak(Box::new(Mux::new(MockPort { ring, state })));
    (mux, state)
}

/// Feeds bytes through the per-byte interrupt path.
pub fn inject<const RX: usize>(mux: &Mux<MockPort, RX>, bytes: &[u8]) {
    for &byte in bytes {
        mux.rx_byte_isr(byte);
    }
}

pub async fn run_dispatcher<const RX: usize>(mux: &'static Mux<MockPort, RX>) {
    mux.run().await
}

/// Tests in one binary share the mock time driver; hold this across each
/// test body to keep time manipulation isolated.
pub fn serial() -> MutexGuard<'static, ()> {
    static SERIAL: Mutex<()> = Mutex::new(());
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}
