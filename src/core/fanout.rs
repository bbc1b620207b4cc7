//! Terminal output fan-out.
//!
//! Every byte a spawned process emits, and every progress or error message
//! the orchestrator writes, reaches all attached terminal views. Sinks are
//! held weakly: a view that was dropped without unsubscribing is pruned on
//! the next broadcast.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// A terminal view that accepts text.
pub trait TerminalSink {
    fn write(&self, text: &str);
}

/// Registration handle returned by [`OutputFanOut::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SinkToken(u64);

#[derive(Default)]
struct Registry {
    sinks: RefCell<BTreeMap<SinkToken, Weak<dyn TerminalSink>>>,
    next: Cell<u64>,
}

/// Shared registry of terminal sinks. Cloning yields another handle to the
/// same registry.
#[derive(Clone, Default)]
pub struct OutputFanOut {
    inner: Rc<Registry>,
}

impl OutputFanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink. Sinks receive only output produced after this call;
    /// there is no replay.
    pub fn subscribe(&self, sink: &Rc<dyn TerminalSink>) -> SinkToken {
        let token = SinkToken(self.inner.next.get());
        self.inner.next.set(token.0 + 1);
        self.inner
            .sinks
            .borrow_mut()
            .insert(token, Rc::downgrade(sink));
        log::debug!("terminal sink {} attached", token.0);
        token
    }

    /// Detach a sink. Unknown tokens are ignored.
    pub fn unsubscribe(&self, token: SinkToken) {
        if self.inner.sinks.borrow_mut().remove(&token).is_some() {
            log::debug!("terminal sink {} detached", token.0);
        }
    }

    /// Deliver `text` to every sink attached at the time of the call, in
    /// subscription order.
    ///
    /// The registry is not borrowed while sinks run, so a sink may subscribe
    /// or unsubscribe from inside `write`; such changes apply to the next
    /// broadcast.
    pub fn broadcast(&self, text: &str) {
        if text.is_empty() {
            return;
        }

        let snapshot: Vec<Rc<dyn TerminalSink>> = {
            let mut sinks = self.inner.sinks.borrow_mut();
            sinks.retain(|_, weak| weak.strong_count() > 0);
            sinks.values().filter_map(Weak::upgrade).collect()
        };

        for sink in snapshot {
            sink.write(text);
        }
    }

    /// Number of live sinks.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner
            .sinks
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::RecordingSink;

    fn sink() -> (Rc<RecordingSink>, Rc<dyn TerminalSink>) {
        let recording = Rc::new(RecordingSink::default());
        let dynamic: Rc<dyn TerminalSink> = recording.clone();
        (recording, dynamic)
    }

    #[test]
    fn test_every_sink_receives_in_order() {
        let fanout = OutputFanOut::new();
        let (a, a_dyn) = sink();
        let (b, b_dyn) = sink();
        fanout.subscribe(&a_dyn);
        fanout.subscribe(&b_dyn);

        fanout.broadcast("one ");
        fanout.broadcast("two\n");

        assert_eq!(a.text(), "one two\n");
        assert_eq!(b.text(), "one two\n");
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let fanout = OutputFanOut::new();
        let (a, a_dyn) = sink();
        fanout.subscribe(&a_dyn);
        fanout.broadcast("early\n");

        let (b, b_dyn) = sink();
        fanout.subscribe(&b_dyn);
        fanout.broadcast("late\n");

        assert_eq!(a.text(), "early\nlate\n");
        assert_eq!(b.text(), "late\n");
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let fanout = OutputFanOut::new();
        let (a, a_dyn) = sink();
        let token = fanout.subscribe(&a_dyn);
        fanout.broadcast("x");
        fanout.unsubscribe(token);
        fanout.broadcast("y");

        assert_eq!(a.text(), "x");
        assert!(fanout.is_empty());
    }

    #[test]
    fn test_dropped_sink_pruned() {
        let fanout = OutputFanOut::new();
        let (a, a_dyn) = sink();
        fanout.subscribe(&a_dyn);
        {
            let (_b, b_dyn) = sink();
            fanout.subscribe(&b_dyn);
            assert_eq!(fanout.len(), 2);
        }
        fanout.broadcast("still here");

        assert_eq!(fanout.len(), 1);
        assert_eq!(a.text(), "still here");
    }

    #[test]
    fn test_subscribe_during_broadcast_applies_next_time() {
        struct Subscriber {
            fanout: OutputFanOut,
            late: Rc<dyn TerminalSink>,
            done: Cell<bool>,
        }

        impl TerminalSink for Subscriber {
            fn write(&self, _text: &str) {
                if !self.done.replace(true) {
                    self.fanout.subscribe(&self.late);
                }
            }
        }

        let fanout = OutputFanOut::new();
        let (late, late_dyn) = sink();
        let subscriber: Rc<dyn TerminalSink> = Rc::new(Subscriber {
            fanout: fanout.clone(),
            late: late_dyn,
            done: Cell::new(false),
        });
        fanout.subscribe(&subscriber);

        fanout.broadcast("first");
        assert_eq!(late.text(), "");
        fanout.broadcast("second");
        assert_eq!(late.text(), "second");
    }
}
