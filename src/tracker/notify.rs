use tokio::sync::mpsc;
use tracing::trace;

/// Part of the view that has to be drawn again. Rendering is idempotent, so receiving the same
/// refresh twice is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Refresh {
    TaskList,
    Calendar,
    Title,
}

pub type RefreshReceiver = mpsc::UnboundedReceiver<Refresh>;

/// Sending side of re-render requests. Nobody listening is not an error.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Refresh>,
}

impl Notifier {
    pub fn channel() -> (Notifier, RefreshReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Notifier { sender }, receiver)
    }

    pub fn notify(&self, refresh: Refresh) {
        if self.sender.send(refresh).is_err() {
            trace!("Nobody is listening for {refresh:?}");
        }
    }

    pub fn notify_all(&self, refreshes: &[Refresh]) {
        for refresh in refreshes {
            self.notify(*refresh);
        }
    }
}
