//! Timing events emitted per successful activity execution.

use std::time::Duration;

/// Emitted at most once per successful activity execution, and once per
/// setup activity. Setup-phase events carry `workflow` prefixed with
/// `*` — a low-bandwidth marker kept for compatibility with the
/// monitor's key-prefix convention.
#[derive(Clone, Debug)]
pub struct Event {
    pub workflow: String,
    pub activity: String,
    pub duration: Duration,
}

impl Event {
    pub fn new(workflow: impl Into<String>, activity: impl Into<String>, duration: Duration) -> Self {
        Self {
            workflow: workflow.into(),
            activity: activity.into(),
            duration,
        }
    }

    pub fn setup(workflow: &str, activity: impl Into<String>, duration: Duration) -> Self {
        Self {
            workflow: format!("*{workflow}"),
            activity: activity.into(),
            duration,
        }
    }

    pub fn is_setup(&self) -> bool {
        self.workflow.starts_with('*')
    }
}

pub type EventSender = tokio::sync::mpsc::Sender<Event>;
pub type EventReceiver = tokio::sync::mpsc::Receiver<Event>;

/// Buffered at a capacity of at least 1000. A slow or absent consumer
/// back-pressures onto schedulers rather than dropping events.
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
