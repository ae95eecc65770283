use tokio::sync::mpsc;

use crate::domain::word::WordItem;

/// Lifecycle notifications of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent<'a> {
    /// About to seed the grid; cancelling keeps the previous state untouched.
    Started,
    /// One list entry was handled; cancelling halts the run after it.
    WordProcessed { item: &'a WordItem, drawn: bool },
    Aborted,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResponse {
    #[default]
    Continue,
    Cancel,
}

impl EventResponse {
    pub fn is_cancel(self) -> bool {
        self == Self::Cancel
    }
}

pub trait RunObserver: Send {
    /// Only `Started` and `WordProcessed` honor a `Cancel` response.
    fn on_event(&mut self, event: &RunEvent<'_>) -> EventResponse;
}

impl<F> RunObserver for F
where
    F: FnMut(&RunEvent<'_>) -> EventResponse + Send,
{
    fn on_event(&mut self, event: &RunEvent<'_>) -> EventResponse {
        self(event)
    }
}

/// Observer that never cancels anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_event(&mut self, _event: &RunEvent<'_>) -> EventResponse {
        EventResponse::Continue
    }
}

/// Owned copy of a [`RunEvent`] that can cross a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RunNotice {
    Started,
    WordProcessed { item: WordItem, drawn: bool },
    Aborted,
    Stopped,
}

impl From<&RunEvent<'_>> for RunNotice {
    fn from(event: &RunEvent<'_>) -> Self {
        match event {
            RunEvent::Started => Self::Started,
            RunEvent::WordProcessed { item, drawn } => Self::WordProcessed {
                item: (*item).clone(),
                drawn: *drawn,
            },
            RunEvent::Aborted => Self::Aborted,
            RunEvent::Stopped => Self::Stopped,
        }
    }
}

/// Forwards every event over an unbounded channel and never cancels. A closed
/// receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<RunNotice>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RunObserver for ChannelObserver {
    fn on_event(&mut self, event: &RunEvent<'_>) -> EventResponse {
        let _ = self.tx.send(RunNotice::from(event));
        EventResponse::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_observers() {
        let mut seen = 0;
        {
            let mut observer = |event: &RunEvent<'_>| {
                seen += 1;
                if matches!(event, RunEvent::Started) {
                    EventResponse::Cancel
                } else {
                    EventResponse::Continue
                }
            };
            assert!(observer.on_event(&RunEvent::Started).is_cancel());
            assert!(!observer.on_event(&RunEvent::Stopped).is_cancel());
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn channel_observer_forwards_owned_notices() {
        let (mut observer, mut rx) = ChannelObserver::new();
        let item = WordItem::new("alpha", 3.0);
        observer.on_event(&RunEvent::WordProcessed {
            item: &item,
            drawn: true,
        });
        observer.on_event(&RunEvent::Stopped);
        assert_eq!(
            rx.try_recv().ok(),
            Some(RunNotice::WordProcessed { item, drawn: true })
        );
        assert_eq!(rx.try_recv().ok(), Some(RunNotice::Stopped));
    }

    #[test]
    fn closed_receiver_does_not_cancel() {
        let (mut observer, rx) = ChannelObserver::new();
        drop(rx);
        assert_eq!(observer.on_event(&RunEvent::Aborted), EventResponse::Continue);
    }
}
