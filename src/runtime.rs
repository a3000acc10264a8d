use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::session::{Session, SessionEvent};

/// Unified event type consumed by the session runner
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// Pointer moved to (x, y) at timestamp `t` (milliseconds).
    Move { x: f64, y: f64, t: f64 },
    /// Button/select press at (x, y), timestamp `t`.
    Press { x: f64, y: f64, t: f64 },
    Tick,
}

/// Source of pointer events (mouse driver, gamepad poller, simulator)
pub trait PointerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<PointerEvent, RecvTimeoutError>;
}

/// Channel-backed event source. Input backends (and the headless
/// simulator) hold the sender half and feed events in; the session loop
/// drains the receiver half. Keeps the session a single-writer.
pub struct ChannelEventSource {
    rx: Receiver<PointerEvent>,
}

impl ChannelEventSource {
    pub fn new() -> (Sender<PointerEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }
}

impl PointerEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PointerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<PointerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<PointerEvent>) -> Self {
        Self { rx }
    }
}

impl PointerEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<PointerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the session one event/tick at a time
pub struct Runner<E: PointerEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: PointerEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> PointerEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                PointerEvent::Tick
            }
        }
    }

    /// Dispatch one event into the session, collecting any resulting
    /// notifications. Ticks pass through without touching the session.
    pub fn dispatch(&self, session: &mut Session) -> Vec<SessionEvent> {
        match self.step() {
            PointerEvent::Move { x, y, t } => {
                session.on_move(x, y, t);
                Vec::new()
            }
            PointerEvent::Press { x, y, t } => session.on_press(x, y, t),
            PointerEvent::Tick => Vec::new(),
        }
    }
}
