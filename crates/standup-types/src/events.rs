use crate::models::{ContactId, SubscriptionState};

/// Inbound events from the presence channel, already decoded from the wire.
/// The adapter owns the encoding; the core only ever sees these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The session is authenticated and the initial roster was requested.
    SessionReady,

    /// Identity X asks to subscribe to our presence.
    SubscribeRequest { from: ContactId },

    /// Identity X withdrew its subscription.
    Unsubscribed { from: ContactId },

    /// Net roster state reported by the channel (full result or push).
    RosterSnapshot { items: Vec<RosterItem> },

    /// A chat-type message with a text body.
    ChatMessage { from: ContactId, body: String },

    /// The channel connection ended.
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterItem {
    pub id: ContactId,
    pub state: SubscriptionState,
}

/// Outbound traffic handed to the channel adapter, fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Chat { to: ContactId, body: String },

    /// Approve an inbound subscription request.
    Subscribed { to: ContactId },

    /// Ask for a subscription to `to`'s presence.
    Subscribe { to: ContactId },
}
