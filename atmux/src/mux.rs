//! The multiplexer: dispatcher, send-receive coordinator and transmitter
//!
//! ## Examples
//!
//! ```no_run
//! use atmux::{Mux, port::Port};
//! use embassy_time::Duration;
//!
//! async fn bring_up<P: Port>(mux: &'static Mux<P>) -> Result<(), atmux::Error> {
//!     mux.start()?;
//!     mux.register_urc("+RING", |args| {
//!         let _ = args;
//!     })
//!     .await?;
//!
//!     let mut reply = [0u8; 256];
//!     let len = mux
//!         .send_receive("ATI", "OK", &mut reply, Duration::from_secs(1))
//!         .await?;
//!     let _ = &reply[..len];
//!     Ok(())
//! }
//! ```
//!
//! The dispatcher ([`Mux::run`]) must be driven for any line to be
//! delivered:
//!
//! ```no_run
//! use atmux::{Mux, port::Port};
//!
//! async fn dispatcher<P: Port>(mux: &'static Mux<P>) -> ! {
//!     mux.run().await
//! }
//! ```

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, with_timeout};
use heapless::Vec;

use crate::Error;
use crate::capture::{self, Window};
use crate::config::{self, SR_BUFFER_SIZE};
use crate::ingress::ByteRing;
use crate::port::Port;
use crate::table::{Action, Handler, HandlerTable};

/// Handler table plus the send-receive slot, guarded by one lock.
///
/// The lock is only ever held across straight-line sections, never across a
/// suspension point; every path that runs foreign code (a user handler)
/// captures what it needs and releases first.
struct State<const HANDLERS: usize> {
    table: HandlerTable<HANDLERS>,
    slot: SrSlot,
}

/// The one-shot synchronous request slot. Non-active means no send-receive
/// is outstanding.
struct SrSlot {
    active: bool,
    buf: Vec<u8, SR_BUFFER_SIZE>,
}

struct TxState<const TX: usize> {
    scratch: Vec<u8, TX>,
}

/// AT-command line multiplexer over one serial [`Port`].
///
/// All methods take `&self`; the value is normally placed in a static cell
/// and shared between the dispatcher task, application tasks and the
/// interrupt handlers. Const parameters: `RX` bytes of ingress ring (and
/// line buffer), `TX` bytes of transmit scratch, `HANDLERS` table slots.
pub struct Mux<P: Port, const RX: usize = 512, const TX: usize = 512, const HANDLERS: usize = 10> {
    port: BlockingMutex<CriticalSectionRawMutex, RefCell<P>>,
    ingress: ByteRing<RX>,
    /// The one word shared with the idle-line ISR; touched only under
    /// interrupt masking.
    dma_pos: BlockingMutex<CriticalSectionRawMutex, Cell<usize>>,
    state: Mutex<CriticalSectionRawMutex, State<HANDLERS>>,
    tx: Mutex<CriticalSectionRawMutex, TxState<TX>>,
    tx_done: Signal<CriticalSectionRawMutex, ()>,
    sr_matched: Signal<CriticalSectionRawMutex, ()>,
}

impl<P: Port, const RX: usize, const TX: usize, const HANDLERS: usize> Mux<P, RX, TX, HANDLERS> {
    pub fn new(port: P) -> Self {
        Self {
            port: BlockingMutex::new(RefCell::new(port)),
            ingress: ByteRing::new(),
            dma_pos: BlockingMutex::new(Cell::new(0)),
            state: Mutex::new(State {
                table: HandlerTable::new(),
                slot: SrSlot {
                    active: false,
                    buf: Vec::new(),
                },
            }),
            tx: Mutex::new(TxState { scratch: Vec::new() }),
            tx_done: Signal::new(),
            sr_matched: Signal::new(),
        }
    }

    /// Arms reception at the port.
    pub fn start(&self) -> Result<(), Error> {
        self.dma_pos.lock(|pos| pos.set(0));
        self.with_port(|port| port.start_receive())
            .map_err(|_| Error::InitFail)
    }

    /// Aborts peripheral I/O, drops all buffered bytes and restarts
    /// reception.
    ///
    /// The handler table and the send-receive slot are left as they are; an
    /// outstanding [`send_receive`](Self::send_receive) times out naturally.
    pub fn reset(&self) -> Result<(), Error> {
        self.with_port(|port| {
            port.abort_receive();
            port.abort_transmit();
        });
        self.ingress.clear();
        self.start()
    }

    /// Registers `handler` for lines starting with `prefix`.
    ///
    /// Re-registering a prefix replaces the stored callback and changes
    /// nothing else.
    pub async fn register(&self, prefix: &str, handler: Handler) -> Result<(), Error> {
        let mut state = self.lock_state(config::MUTEX_TIMEOUT).await?;
        state.table.register(prefix, handler)
    }

    /// Registers an unsolicited-result-code handler.
    ///
    /// URC entries are kept in front of ordinary entries and therefore match
    /// first, including while a send-receive is in flight.
    pub async fn register_urc(&self, prefix: &str, handler: Handler) -> Result<(), Error> {
        let mut state = self.lock_state(config::MUTEX_TIMEOUT).await?;
        state.table.register_urc(prefix, handler)
    }

    /// Removes the registration for `prefix`.
    pub async fn unregister(&self, prefix: &str) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.table.unregister(prefix)
    }

    /// Transmits `cmd` followed by the line terminator and waits for the
    /// completion notification.
    pub async fn send(&self, cmd: &str) -> Result<(), Error> {
        let mut tx = match with_timeout(config::MUTEX_TIMEOUT, self.tx.lock()).await {
            Ok(guard) => guard,
            Err(_) => return Err(Error::Busy),
        };

        tx.scratch.clear();
        if tx.scratch.extend_from_slice(cmd.as_bytes()).is_err()
            || tx.scratch.extend_from_slice(config::LINE_TERMINATOR).is_err()
        {
            return Err(Error::InvalidArg);
        }

        self.with_port(|port| port.start_transmit(&tx.scratch))
            .map_err(|_| Error::SendFail)?;

        // The scratch stays borrowed by the peripheral until this resolves;
        // the tx guard keeps it alive either way.
        match with_timeout(config::TX_TIMEOUT, self.tx_done.wait()).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Transmits `cmd` and waits until a line starting with `expected`
    /// arrives, collecting every line received in the meantime into `out`.
    ///
    /// Returns the number of bytes collected. Lines are accumulated verbatim
    /// (terminators included) and truncated silently once the accumulation
    /// buffer or `out` is exhausted. The lines collected so far are copied
    /// into `out` on every exit path, so after [`Error::Timeout`] the buffer
    /// still holds whatever arrived before the deadline. At most one
    /// send-receive can be in flight; a second caller gets [`Error::Busy`].
    /// Unsolicited lines arriving during the exchange still reach their
    /// handlers.
    pub async fn send_receive(
        &self,
        cmd: &str,
        expected: &str,
        out: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, Error> {
        if expected.is_empty() || expected.len() > config::MAX_PREFIX_LEN || out.is_empty() {
            return Err(Error::InvalidArg);
        }

        {
            let mut state = self.lock_state(timeout).await?;
            if state.slot.active {
                return Err(Error::Busy);
            }
            state.slot.active = true;
            state.slot.buf.clear();
            if state.table.register_sr(expected).is_err() {
                state.slot.active = false;
                return Err(Error::Internal);
            }
            self.sr_matched.reset();
        }

        // From here on the table holds the temporary entry; the guard undoes
        // the registration if this future is dropped before cleanup ran.
        let mut guard = SrCleanup {
            mux: self,
            expected,
            armed: true,
        };

        if self.send(cmd).await.is_err() {
            self.finish(expected, out).await;
            guard.armed = false;
            return Err(Error::SendFail);
        }

        let matched = with_timeout(timeout, self.sr_matched.wait()).await.is_ok();

        let copied = self.finish(expected, out).await;
        guard.armed = false;

        if matched { Ok(copied) } else { Err(Error::Timeout) }
    }

    /// Unregisters the temporary entry, hands the collected bytes to the
    /// caller and clears the slot. The copy happens on every exit path, so
    /// the caller keeps partial accumulation after a timeout. Lock
    /// acquisition is deliberately unbounded: cleanup must not fail.
    async fn finish(&self, expected: &str, out: &mut [u8]) -> usize {
        let mut state = self.state.lock().await;
        let _ = state.table.unregister(expected);
        let n = state.slot.buf.len().min(out.len());
        out[..n].copy_from_slice(&state.slot.buf[..n]);
        state.slot.active = false;
        state.slot.buf.clear();
        n
    }

    /// The dispatcher: frames lines from the byte ring and routes each to at
    /// most one registered handler. Never returns; run it as a task.
    pub async fn run(&self) -> ! {
        info!("atmux dispatcher started");
        let mut line = [0u8; RX];
        loop {
            let len = self
                .ingress
                .receive_until(config::LINE_TERMINATOR, &mut line, config::LINE_TIMEOUT)
                .await;
            if len == 0 {
                continue;
            }
            self.dispatch(&line[..len]).await;
        }
    }

    async fn dispatch(&self, line: &[u8]) {
        let Ok(mut state) = with_timeout(config::DISPATCH_LOCK_TIMEOUT, self.state.lock()).await
        else {
            warn!("handler state busy, line dropped");
            return;
        };

        // Accumulate before any handler decision, so a matching handler
        // already sees its own line in the buffer.
        if state.slot.active {
            let room = state.slot.buf.capacity() - state.slot.buf.len();
            let take = line.len().min(room);
            let _ = state.slot.buf.extend_from_slice(&line[..take]);
        }

        let hit = state.table.lookup(line);
        drop(state);

        // The single release-then-invoke point: handlers may call back into
        // registration or send-receive, so no callback runs under the lock.
        match hit {
            Some((Action::User(handler), prefix_len)) => {
                match core::str::from_utf8(&line[prefix_len..]) {
                    Ok(args) => handler(args.trim_start_matches(|c| c == ' ' || c == '\t')),
                    Err(_) => warn!("non-utf8 line not dispatched"),
                }
            }
            Some((Action::SrMatch, _)) => self.sr_matched.signal(()),
            None => {}
        }
    }

    /// Idle-line interrupt entry point for circular-DMA reception.
    ///
    /// Forwards the bytes the DMA controller wrote since the last call into
    /// the ingress ring. Returns false when some of them did not fit; the
    /// cursor still advances, dropped bytes are accepted as data loss.
    pub fn idle_line_isr(&self) -> bool {
        self.port.lock(|cell| {
            let port = cell.borrow();
            let dma = port.rx_ring();
            if dma.is_empty() {
                return false;
            }
            let current = dma.len().saturating_sub(port.rx_remaining());
            let last = self.dma_pos.lock(|pos| pos.get());

            let complete = match capture::window(last, current, dma.len()) {
                Window::Empty => return true,
                Window::Forward(span) => {
                    self.ingress.push_from_isr(&dma[span.clone()]) == span.len()
                }
                Window::Wrapped(tail, head) => {
                    self.ingress.push_from_isr(&dma[tail.clone()]) == tail.len()
                        && self.ingress.push_from_isr(&dma[head.clone()]) == head.len()
                }
            };

            self.dma_pos.lock(|pos| pos.set(current));
            if !complete {
                warn!("ingress ring full, rx bytes dropped");
            }
            complete
        })
    }

    /// RX-complete interrupt entry point for per-byte reception.
    pub fn rx_byte_isr(&self, byte: u8) {
        if self.ingress.push_from_isr(&[byte]) == 0 {
            warn!("ingress ring full, rx byte dropped");
        }
    }

    /// TX-complete interrupt entry point.
    pub fn tx_complete_isr(&self) {
        self.tx_done.signal(());
    }

    async fn lock_state(
        &self,
        timeout: Duration,
    ) -> Result<MutexGuard<'_, CriticalSectionRawMutex, State<HANDLERS>>, Error> {
        with_timeout(timeout, self.state.lock())
            .await
            .map_err(|_| Error::Busy)
    }

    fn with_port<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        self.port.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Undoes a send-receive registration when the request future is dropped at
/// a cancellation point.
///
/// The state lock is never held across a suspension point, so when a drop
/// happens at an await the lock is necessarily free and `try_lock` succeeds.
struct SrCleanup<'a, P: Port, const RX: usize, const TX: usize, const HANDLERS: usize> {
    mux: &'a Mux<P, RX, TX, HANDLERS>,
    expected: &'a str,
    armed: bool,
}

impl<P: Port, const RX: usize, const TX: usize, const HANDLERS: usize> Drop
    for SrCleanup<'_, P, RX, TX, HANDLERS>
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.mux.state.try_lock() {
            Ok(mut state) => {
                let _ = state.table.unregister(self.expected);
                state.slot.active = false;
                state.slot.buf.clear();
            }
            Err(_) => error!("send-receive cleanup lost: state lock held"),
        }
    }
}
