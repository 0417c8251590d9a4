use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::debug;

/// Input the quiz loop reacts to
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

pub trait EventSource: Send + 'static {
    /// Wait up to `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Events arriving over an mpsc channel, whoever produces them.
pub struct ChannelSource {
    rx: Receiver<QuizEvent>,
}

/// Headless tests push scripted keys through the sender half.
pub type TestEventSource = ChannelSource;

impl ChannelSource {
    pub fn from_receiver(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }

    /// Source plus the sender that feeds it.
    pub fn channel() -> (Sender<QuizEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::from_receiver(rx))
    }
}

impl EventSource for ChannelSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Translate one crossterm event; `None` for anything the quiz ignores.
fn translate(ev: CtEvent) -> Option<QuizEvent> {
    match ev {
        // Windows reports both press and release
        CtEvent::Key(key) if key.kind == KeyEventKind::Press => Some(QuizEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(QuizEvent::Resize),
        _ => None,
    }
}

/// Spawn a reader thread over the terminal and hand back its channel.
pub fn terminal_events() -> ChannelSource {
    let (tx, source) = ChannelSource::channel();
    thread::spawn(move || loop {
        let ev = match event::read() {
            Ok(ev) => ev,
            Err(err) => {
                debug!(target: "runtime", %err, "terminal reader stopped");
                break;
            }
        };
        if let Some(ev) = translate(ev) {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });
    source
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Same tick length forever
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker(Duration);

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        FixedTicker(interval)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.0
    }
}

pub struct Runner<E: EventSource, T: Ticker> {
    source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(source: E, ticker: T) -> Self {
        Runner { source, ticker }
    }

    /// Next event, or `Tick` once the interval passes without one.
    /// A closed source keeps ticking so the loop can still redraw and quit.
    pub fn step(&self) -> QuizEvent {
        self.source
            .recv_timeout(self.ticker.interval())
            .unwrap_or(QuizEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn runner(ms: u64) -> (Sender<QuizEvent>, Runner<ChannelSource, FixedTicker>) {
        let (tx, es) = ChannelSource::channel();
        (tx, Runner::new(es, FixedTicker::new(Duration::from_millis(ms))))
    }

    #[test]
    fn idle_step_is_a_tick() {
        let (_tx, runner) = runner(1);
        assert!(matches!(runner.step(), QuizEvent::Tick));
    }

    #[test]
    fn events_come_out_in_send_order() {
        let (tx, runner) = runner(10);
        tx.send(QuizEvent::Resize).unwrap();
        tx.send(QuizEvent::Key(KeyEvent::new(KeyCode::Char('1'), KeyModifiers::NONE)))
            .unwrap();

        assert!(matches!(runner.step(), QuizEvent::Resize));
        match runner.step() {
            QuizEvent::Key(key) => assert_eq!(key.code, KeyCode::Char('1')),
            other => panic!("expected key event, got {other:?}"),
        }
    }

    #[test]
    fn closed_source_keeps_ticking() {
        let (tx, runner) = runner(1);
        drop(tx);
        assert!(matches!(runner.step(), QuizEvent::Tick));
        assert!(matches!(runner.step(), QuizEvent::Tick));
    }

    #[test]
    fn key_releases_are_dropped() {
        let press = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
            ..press
        };
        assert!(matches!(translate(CtEvent::Key(press)), Some(QuizEvent::Key(_))));
        assert!(translate(CtEvent::Key(release)).is_none());
        assert!(matches!(translate(CtEvent::Resize(80, 24)), Some(QuizEvent::Resize)));
        assert!(translate(CtEvent::FocusGained).is_none());
    }
}
