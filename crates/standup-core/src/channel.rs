use tokio::sync::mpsc;

use standup_types::events::Outbound;
use standup_types::models::ContactId;

/// Cloneable fire-and-forget handle into the channel adapter's outbound
/// queue. No delivery confirmation: the presence channel offers none.
#[derive(Clone)]
pub struct ChannelHandle {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelHandle {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send_chat(&self, to: &ContactId, body: impl Into<String>) {
        self.send(Outbound::Chat {
            to: to.clone(),
            body: body.into(),
        });
    }

    pub fn approve_subscription(&self, to: &ContactId) {
        self.send(Outbound::Subscribed { to: to.clone() });
    }

    pub fn request_subscription(&self, to: &ContactId) {
        self.send(Outbound::Subscribe { to: to.clone() });
    }

    fn send(&self, out: Outbound) {
        // A closed receiver means the channel is shutting down.
        let _ = self.tx.send(out);
    }
}
