//! Subscription lifecycle: reacting to subscribe requests, unsubscribe
//! notices and roster snapshots from the presence channel.

use anyhow::Result;
use tracing::info;

use standup_types::events::RosterItem;
use standup_types::models::{Contact, ContactId, SubscriptionState};

use crate::service::Service;
use crate::store::StatusStore;

impl<S: StatusStore> Service<S> {
    /// Auto-approve an inbound subscription request and pull the requester
    /// onto the team: reciprocal subscribe, help text, a notice to everyone
    /// else already known.
    pub(crate) async fn on_subscribe_request(&mut self, from: ContactId) -> Result<()> {
        info!("subscription request from {}", from);
        self.channel.approve_subscription(&from);

        if self.directory.state_of(&from) != Some(SubscriptionState::Both) {
            self.channel.request_subscription(&from);
            match self
                .store
                .upsert_contact(&from, SubscriptionState::PendingIn)
                .await
            {
                Ok(()) => self
                    .directory
                    .upsert_state(&from, SubscriptionState::PendingIn),
                Err(e) => self.store_failure("persisting pending contact", e)?,
            }
        }

        let help = self.help_text(&from);
        self.channel.send_chat(&from, help);

        // Fire-and-forget; no delivery confirmation expected.
        let notice = format!("{from} joined the team. Say hi!");
        let others: Vec<ContactId> = self
            .directory
            .iter()
            .map(|c| c.id.clone())
            .filter(|id| *id != from)
            .collect();
        for id in others {
            self.channel.send_chat(&id, notice.clone());
        }
        Ok(())
    }

    /// The contact withdrew its subscription: forget the roster entry.
    /// History rows are retained.
    pub(crate) async fn on_unsubscribed(&mut self, from: ContactId) -> Result<()> {
        if self.directory.remove(&from).is_some() {
            info!("{} left the roster", from);
        }
        if let Err(e) = self.store.remove_contact(&from).await {
            self.store_failure("removing contact", e)?;
        }
        Ok(())
    }

    /// Reconcile the net roster state reported by the channel. Individual
    /// subscription events missed while offline are not replayed; only the
    /// net state is. Replaying an identical snapshot writes nothing.
    pub(crate) async fn on_roster_snapshot(&mut self, items: Vec<RosterItem>) -> Result<()> {
        for item in items {
            match self.directory.state_of(&item.id) {
                None if item.state == SubscriptionState::Both => {
                    info!("roster: new mutual contact {}", item.id);
                    match self.store.upsert_contact(&item.id, item.state).await {
                        Ok(()) => self.directory.insert(Contact::new(item.id, item.state)),
                        Err(e) => self.store_failure("inserting roster contact", e)?,
                    }
                }
                Some(current) if current != item.state => {
                    info!(
                        "roster: {} state {} -> {}",
                        item.id,
                        current.as_str(),
                        item.state.as_str()
                    );
                    match self.store.upsert_contact(&item.id, item.state).await {
                        Ok(()) => self.directory.upsert_state(&item.id, item.state),
                        Err(e) => self.store_failure("updating roster contact", e)?,
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
