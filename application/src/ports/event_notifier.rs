//! Panel event port
//!
//! Receives the chronological event stream of a running session.
//! Implementations live in the presentation layer (console reporter) or
//! forward events elsewhere ([`ChannelEventNotifier`]).

use panel_domain::PanelEvent;
use tokio::sync::mpsc;

/// Callback for every event a session emits, in order
pub trait PanelEventNotifier: Send + Sync {
    fn notify(&self, event: &PanelEvent);
}

/// No-op notifier for when nobody is listening
pub struct NoEvents;

impl PanelEventNotifier for NoEvents {
    fn notify(&self, _event: &PanelEvent) {}
}

/// Forwards events into an unbounded channel, giving the caller an ordered
/// stream it can consume from another task.
pub struct ChannelEventNotifier {
    sender: mpsc::UnboundedSender<PanelEvent>,
}

impl ChannelEventNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PanelEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl PanelEventNotifier for ChannelEventNotifier {
    fn notify(&self, event: &PanelEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.sender.send(event.clone());
    }
}
