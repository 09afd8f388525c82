use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::api::{ApiError, RunReport};
use crate::session::{CommandKind, CommandOutcome, TimedSession};

const INPUT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeAction {
    Run,
    Submit,
}

/// Result of a run or submit request, tagged with the problem it was made for
#[derive(Debug, Clone, PartialEq)]
pub struct CodeOutcome {
    pub action: CodeAction,
    pub problem_id: String,
    pub result: Result<RunReport, ApiError>,
}

/// Unified event type consumed by the app runner
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Loaded(Result<TimedSession, ApiError>),
    Session(CommandOutcome),
    Code(CodeOutcome),
}

impl AppEvent {
    pub fn is_tick(&self) -> bool {
        matches!(self, AppEvent::Tick)
    }
}

/// Source of application events: terminal input plus results from worker threads
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Stops and joins the terminal reader thread when dropped
pub struct InputHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    _input: InputHandle,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let input_tx = tx.clone();
        let input_stop = Arc::clone(&stop);
        let thread = std::thread::spawn(move || {
            while !input_stop.load(Ordering::Relaxed) {
                match event::poll(INPUT_POLL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(_) => break,
                }
                let forwarded = match event::read() {
                    Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                        input_tx.send(AppEvent::Key(key))
                    }
                    Ok(CtEvent::Resize(_, _)) => input_tx.send(AppEvent::Resize),
                    Ok(_) => Ok(()),
                    Err(_) => break,
                };
                if forwarded.is_err() {
                    break;
                }
            }
            debug!("input thread stopped");
        });

        Self {
            tx,
            rx,
            _input: InputHandle {
                stop,
                thread: Some(thread),
            },
        }
    }

    /// Sender for worker threads to post their results on
    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
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
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are due on a fixed cadence measured from the previous tick, so a steady
/// stream of key presses cannot starve the countdown.
pub struct Runner<E: AppEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Instant,
}

impl<E: AppEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Instant::now(),
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }

    /// Blocks until the next event or until a tick is due
    pub fn step(&mut self) -> AppEvent {
        let interval = self.ticker.interval();
        let since = self.last_tick.elapsed();
        if since >= interval {
            self.last_tick = Instant::now();
            return AppEvent::Tick;
        }

        let wait = interval - since;
        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                self.last_tick = Instant::now();
                AppEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => {
                // a source with no senders returns at once, keep the cadence anyway
                std::thread::sleep(wait);
                self.last_tick = Instant::now();
                AppEvent::Tick
            }
        }
    }
}

/// Run `job` on its own thread and post whatever it produces back to the loop
pub fn spawn_job<F>(tx: &Sender<AppEvent>, job: F)
where
    F: FnOnce() -> AppEvent + Send + 'static,
{
    let tx = tx.clone();
    std::thread::spawn(move || {
        // receiver gone means the app is shutting down
        let _ = tx.send(job());
    });
}

/// Label used in logs and the status line for a command in flight
pub fn describe(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Start => "Starting session",
        CommandKind::Switch => "Switching problem",
        CommandKind::Complete => "Finishing session",
        CommandKind::Abandon => "Abandoning session",
    }
}
