use anyhow::Result;
use tracing::{debug, info, warn};

use standup_types::events::ChannelEvent;
use standup_types::models::{AdmissionPolicy, ContactId, StoreErrorPolicy};

use crate::channel::ChannelHandle;
use crate::directory::ContactDirectory;
use crate::store::StatusStore;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// The service's own bare identity on the channel.
    pub own_id: ContactId,
    /// Public base URL of the HTTP read surface.
    pub base_url: String,
    pub admission: AdmissionPolicy,
    pub store_errors: StoreErrorPolicy,
}

/// Everything the bot needs to react to one event, constructed once at
/// startup and handed to the event loop. No hidden statics.
pub struct Service<S> {
    pub(crate) directory: ContactDirectory,
    pub(crate) store: S,
    pub(crate) channel: ChannelHandle,
    pub(crate) config: ServiceConfig,
    session_ready: bool,
}

impl<S: StatusStore> Service<S> {
    /// Rebuild the in-memory directory from the durable contact rows.
    /// A failure here is fatal: no partial directory is safe to run with.
    pub async fn load(store: S, channel: ChannelHandle, config: ServiceConfig) -> Result<Self> {
        let rows = store.load_contacts().await?;
        info!("loaded {} contacts from store", rows.len());
        Ok(Self {
            directory: ContactDirectory::from_rows(rows),
            store,
            channel,
            config,
            session_ready: false,
        })
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    /// Process one inbound channel event at time `now` (epoch seconds).
    /// An `Err` is fatal to the process.
    pub async fn handle_event(&mut self, event: ChannelEvent, now: i64) -> Result<()> {
        match event {
            ChannelEvent::SessionReady => {
                self.session_ready = true;
                info!("channel session ready");
                Ok(())
            }
            ChannelEvent::SubscribeRequest { from } => self.on_subscribe_request(from).await,
            ChannelEvent::Unsubscribed { from } => self.on_unsubscribed(from).await,
            ChannelEvent::RosterSnapshot { items } => {
                if !self.session_ready {
                    debug!("roster snapshot before session ready, ignoring");
                    return Ok(());
                }
                self.on_roster_snapshot(items).await
            }
            ChannelEvent::ChatMessage { from, body } => self.on_chat_message(from, body, now).await,
            // The event loop exits on this; nothing to do here.
            ChannelEvent::Disconnected => Ok(()),
        }
    }

    pub fn help_text(&self, id: &ContactId) -> String {
        format!(
            "Tell me what you are working on by sending me a plain message.\n\
             Commands:\n\
             \x20 help - this text\n\
             \x20 invite <address> - invite a teammate\n\
             Your updates: {}/{}",
            self.config.base_url.trim_end_matches('/'),
            id
        )
    }

    /// Apply the configured store-error policy to a steady-state write
    /// failure: warn and carry on, or bubble up as fatal.
    pub(crate) fn store_failure(&self, context: &'static str, err: anyhow::Error) -> Result<()> {
        match self.config.store_errors {
            StoreErrorPolicy::Report => {
                warn!("{}: {:#}", context, err);
                Ok(())
            }
            StoreErrorPolicy::Fatal => Err(err.context(context)),
        }
    }
}
