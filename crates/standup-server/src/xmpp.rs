//! XMPP channel adapter: owns the client connection and translates between
//! wire stanzas and the core's channel events.

use anyhow::Result;
use futures_util::StreamExt;
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio_xmpp::{AsyncClient, BareJid, Event};
use xmpp_parsers::Element;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use standup_types::events::{ChannelEvent, Outbound, RosterItem};
use standup_types::models::{ContactId, SubscriptionState};

const NS_CLIENT: &str = "jabber:client";
const NS_ROSTER: &str = "jabber:iq:roster";

pub fn connect(jid: &str, password: &str) -> Result<AsyncClient> {
    let jid = BareJid::from_str(jid)?;
    Ok(AsyncClient::new(jid, password.to_string()))
}

/// Drive the connection until it ends. The client has a single owner here:
/// inbound stanzas and outbound traffic are interleaved in one loop, so no
/// locking around the socket.
pub async fn run(
    mut client: AsyncClient,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    loop {
        tokio::select! {
            event = client.next() => match event {
                Some(Event::Online { bound_jid, .. }) => {
                    info!("signed in as {}", bound_jid);
                    if let Err(e) = on_online(&mut client).await {
                        error!("post-connect setup failed: {}", e);
                        break;
                    }
                    let _ = events.send(ChannelEvent::SessionReady);
                }
                Some(Event::Stanza(stanza)) => {
                    if let Some(ev) = translate_stanza(&stanza) {
                        if events.send(ev).is_err() {
                            break;
                        }
                    }
                }
                Some(Event::Disconnected(e)) => {
                    warn!("connection lost: {:?}", e);
                    let _ = events.send(ChannelEvent::Disconnected);
                    break;
                }
                None => {
                    warn!("connection stream ended");
                    let _ = events.send(ChannelEvent::Disconnected);
                    break;
                }
            },
            out = outbound.recv() => match out {
                Some(out) => {
                    let stanza = render(out);
                    if let Err(e) = client.send_stanza(stanza).await {
                        error!("failed to send stanza: {}", e);
                    }
                }
                // Sender side gone: the service is shutting down.
                None => break,
            },
        }
    }
}

/// Announce availability, then ask for the full roster.
async fn on_online(client: &mut AsyncClient) -> Result<()> {
    let presence = Element::builder("presence", NS_CLIENT).build();
    client.send_stanza(presence).await?;

    let query = Element::builder("query", NS_ROSTER).build();
    let iq = Element::builder("iq", NS_CLIENT)
        .attr("type", "get")
        .attr("id", Uuid::new_v4().to_string())
        .append(query)
        .build();
    client.send_stanza(iq).await?;
    Ok(())
}

fn translate_stanza(stanza: &Element) -> Option<ChannelEvent> {
    match stanza.name() {
        "presence" => translate_presence(stanza),
        "message" => translate_message(stanza),
        "iq" => translate_roster(stanza),
        other => {
            debug!("ignoring {} stanza", other);
            None
        }
    }
}

fn translate_presence(stanza: &Element) -> Option<ChannelEvent> {
    let from = ContactId::new(stanza.attr("from")?);
    match stanza.attr("type") {
        Some("subscribe") => Some(ChannelEvent::SubscribeRequest { from }),
        // Both forms mean the contact is gone from our side of the roster.
        Some("unsubscribe") | Some("unsubscribed") => Some(ChannelEvent::Unsubscribed { from }),
        _ => None,
    }
}

fn translate_message(stanza: &Element) -> Option<ChannelEvent> {
    if stanza.attr("type") != Some("chat") {
        return None;
    }
    let from = ContactId::new(stanza.attr("from")?);
    let body = stanza.children().find(|c| c.name() == "body")?.text();
    Some(ChannelEvent::ChatMessage { from, body })
}

/// Roster results and pushes both arrive as iq stanzas carrying a roster
/// query; either way the items describe net current state.
fn translate_roster(stanza: &Element) -> Option<ChannelEvent> {
    if !matches!(stanza.attr("type"), Some("result") | Some("set")) {
        return None;
    }
    let query = stanza.get_child("query", NS_ROSTER)?;

    let items = query
        .children()
        .filter(|c| c.name() == "item")
        .filter_map(|item| {
            let id = ContactId::new(item.attr("jid")?);
            let state = roster_state(item.attr("subscription"))?;
            Some(RosterItem { id, state })
        })
        .collect();

    Some(ChannelEvent::RosterSnapshot { items })
}

fn roster_state(subscription: Option<&str>) -> Option<SubscriptionState> {
    match subscription {
        Some("both") => Some(SubscriptionState::Both),
        Some("to") => Some(SubscriptionState::PendingOut),
        Some("from") => Some(SubscriptionState::PendingIn),
        None | Some("none") => Some(SubscriptionState::None),
        // "remove" pushes and anything unrecognized carry no state to keep.
        Some(_) => None,
    }
}

fn render(out: Outbound) -> Element {
    match out {
        Outbound::Chat { to, body } => {
            let mut body_el = Element::builder("body", NS_CLIENT).build();
            body_el.append_text_node(&body);
            Element::builder("message", NS_CLIENT)
                .attr("to", to.as_str())
                .attr("type", "chat")
                .attr("id", Uuid::new_v4().to_string())
                .append(body_el)
                .build()
        }
        Outbound::Subscribed { to } => presence_type(&to, "subscribed"),
        Outbound::Subscribe { to } => presence_type(&to, "subscribe"),
    }
}

fn presence_type(to: &ContactId, kind: &str) -> Element {
    Element::builder("presence", NS_CLIENT)
        .attr("to", to.as_str())
        .attr("type", kind)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(from: &str, kind: Option<&str>) -> Element {
        let mut b = Element::builder("presence", NS_CLIENT).attr("from", from);
        if let Some(kind) = kind {
            b = b.attr("type", kind);
        }
        b.build()
    }

    #[test]
    fn subscribe_presence_becomes_a_request() {
        let ev = translate_stanza(&presence("alice@example.org/phone", Some("subscribe")));
        assert_eq!(
            ev,
            Some(ChannelEvent::SubscribeRequest {
                from: ContactId::new("alice@example.org"),
            })
        );
    }

    #[test]
    fn available_presence_is_ignored() {
        assert_eq!(translate_stanza(&presence("alice@example.org", None)), None);
    }

    #[test]
    fn unsubscribe_variants_both_map_to_unsubscribed() {
        for kind in ["unsubscribe", "unsubscribed"] {
            let ev = translate_stanza(&presence("bob@example.org", Some(kind)));
            assert_eq!(
                ev,
                Some(ChannelEvent::Unsubscribed {
                    from: ContactId::new("bob@example.org"),
                })
            );
        }
    }

    #[test]
    fn chat_message_with_body_is_translated() {
        let mut body = Element::builder("body", NS_CLIENT).build();
        body.append_text_node("shipping the report");
        let msg = Element::builder("message", NS_CLIENT)
            .attr("from", "alice@example.org/laptop")
            .attr("type", "chat")
            .append(body)
            .build();

        assert_eq!(
            translate_stanza(&msg),
            Some(ChannelEvent::ChatMessage {
                from: ContactId::new("alice@example.org"),
                body: "shipping the report".to_string(),
            })
        );
    }

    #[test]
    fn non_chat_and_bodyless_messages_are_dropped() {
        let headline = Element::builder("message", NS_CLIENT)
            .attr("from", "news@example.org")
            .attr("type", "headline")
            .build();
        assert_eq!(translate_stanza(&headline), None);

        let empty = Element::builder("message", NS_CLIENT)
            .attr("from", "alice@example.org")
            .attr("type", "chat")
            .build();
        assert_eq!(translate_stanza(&empty), None);
    }

    #[test]
    fn roster_result_maps_subscription_states() {
        let mut query = Element::builder("query", NS_ROSTER);
        for (jid, sub) in [
            ("alice@example.org", "both"),
            ("bob@example.org", "to"),
            ("carol@example.org", "from"),
            ("dan@example.org", "none"),
        ] {
            query = query.append(
                Element::builder("item", NS_ROSTER)
                    .attr("jid", jid)
                    .attr("subscription", sub)
                    .build(),
            );
        }
        let iq = Element::builder("iq", NS_CLIENT)
            .attr("type", "result")
            .append(query.build())
            .build();

        let Some(ChannelEvent::RosterSnapshot { items }) = translate_stanza(&iq) else {
            panic!("expected a roster snapshot");
        };
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].state, SubscriptionState::Both);
        assert_eq!(items[1].state, SubscriptionState::PendingOut);
        assert_eq!(items[2].state, SubscriptionState::PendingIn);
        assert_eq!(items[3].state, SubscriptionState::None);
    }

    #[test]
    fn roster_remove_items_are_skipped() {
        let item = Element::builder("item", NS_ROSTER)
            .attr("jid", "gone@example.org")
            .attr("subscription", "remove")
            .build();
        let iq = Element::builder("iq", NS_CLIENT)
            .attr("type", "set")
            .append(Element::builder("query", NS_ROSTER).append(item).build())
            .build();

        assert_eq!(
            translate_stanza(&iq),
            Some(ChannelEvent::RosterSnapshot { items: vec![] })
        );
    }

    #[test]
    fn chat_render_carries_recipient_and_body() {
        let el = render(Outbound::Chat {
            to: ContactId::new("alice@example.org"),
            body: "OK".to_string(),
        });
        assert_eq!(el.name(), "message");
        assert_eq!(el.attr("to"), Some("alice@example.org"));
        assert_eq!(el.attr("type"), Some("chat"));
        let body = el.children().find(|c| c.name() == "body").unwrap();
        assert_eq!(body.text(), "OK");
    }

    #[test]
    fn subscription_renders_as_typed_presence() {
        let el = render(Outbound::Subscribed {
            to: ContactId::new("alice@example.org"),
        });
        assert_eq!(el.name(), "presence");
        assert_eq!(el.attr("type"), Some("subscribed"));

        let el = render(Outbound::Subscribe {
            to: ContactId::new("bob@example.org"),
        });
        assert_eq!(el.attr("type"), Some("subscribe"));
    }
}
