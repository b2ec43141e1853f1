//! Message ingestion: classify an inbound chat message as a command or a
//! status update, execute it, and reply.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use standup_types::models::{AdmissionPolicy, Contact, ContactId, SubscriptionState};

use crate::service::Service;
use crate::store::StatusStore;

// "help" with an optional / or ! prefix and no trailing alphabetic text,
// so "help", "/help" and "Help!" match but "help me" does not.
static HELP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[/!]?help[^a-z]*$").expect("help regex"));

static INVITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[/!]?invite\s+(\S+)\s*$").expect("invite regex"));

/// What an inbound chat body turned out to be. Evaluated in order: help,
/// invite, then everything else is a status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Invite { target: String },
    Status,
}

impl Command {
    pub fn classify(body: &str) -> Command {
        if HELP_RE.is_match(body) {
            return Command::Help;
        }
        if let Some(caps) = INVITE_RE.captures(body) {
            return Command::Invite {
                target: caps[1].to_string(),
            };
        }
        Command::Status
    }
}

impl<S: StatusStore> Service<S> {
    pub(crate) async fn on_chat_message(
        &mut self,
        from: ContactId,
        body: String,
        now: i64,
    ) -> Result<()> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(());
        }

        match self.config.admission {
            AdmissionPolicy::Strict => {
                if self.directory.state_of(&from) != Some(SubscriptionState::Both) {
                    debug!("discarding message from non-mutual {}", from);
                    return Ok(());
                }
            }
            AdmissionPolicy::Permissive => {
                if !self.directory.contains(&from) {
                    // First time we hear from this sender: remember them.
                    // Reminders and the overview stay gated on a mutual
                    // subscription regardless.
                    match self
                        .store
                        .upsert_contact(&from, SubscriptionState::None)
                        .await
                    {
                        Ok(()) => self
                            .directory
                            .insert(Contact::new(from.clone(), SubscriptionState::None)),
                        Err(e) => self.store_failure("recording new sender", e)?,
                    }
                }
            }
        }

        match Command::classify(body) {
            Command::Help => {
                let help = self.help_text(&from);
                self.channel.send_chat(&from, help);
                Ok(())
            }
            Command::Invite { target } => {
                self.on_invite(&from, &target);
                Ok(())
            }
            Command::Status => self.on_status_update(from, body, now).await,
        }
    }

    fn on_invite(&mut self, from: &ContactId, target: &str) {
        if !target.contains('@') {
            self.channel.send_chat(
                from,
                format!("'{target}' does not look like an address (user@domain)"),
            );
            return;
        }
        let target = ContactId::new(target);
        if target == self.config.own_id {
            self.channel.send_chat(from, "That's me. Invite someone else.");
            return;
        }
        self.channel.send_chat(from, "Invitation sent");

        // Repeat invites to someone already on (or joining) the roster are
        // a no-op beyond the reply.
        let already = matches!(
            self.directory.state_of(&target),
            Some(state) if state != SubscriptionState::None
        );
        if !already {
            info!("{} invited {}", from, target);
            self.channel.request_subscription(&target);
        }
    }

    /// The only path that persists data or can fail on I/O.
    async fn on_status_update(&mut self, from: ContactId, body: &str, now: i64) -> Result<()> {
        match self.store.insert_message(&from, body, now).await {
            Ok(()) => {
                if let Some(contact) = self.directory.get_mut(&from) {
                    contact.last_activity = now;
                }
                self.channel.send_chat(&from, "OK");
                Ok(())
            }
            Err(e) => {
                self.channel
                    .send_chat(&from, format!("Could not record that: {e:#}"));
                self.store_failure("inserting status message", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_matches_with_prefix_and_punctuation() {
        for body in ["help", "Help", "/help", "!HELP", "help!", "help?!"] {
            assert_eq!(Command::classify(body), Command::Help, "body: {body}");
        }
    }

    #[test]
    fn help_with_trailing_text_is_a_status() {
        for body in ["help me", "helping", "help out the team"] {
            assert_eq!(Command::classify(body), Command::Status, "body: {body}");
        }
    }

    #[test]
    fn invite_captures_the_target() {
        assert_eq!(
            Command::classify("invite bob@example.com"),
            Command::Invite {
                target: "bob@example.com".into()
            }
        );
        assert_eq!(
            Command::classify("/Invite   carol@example.com "),
            Command::Invite {
                target: "carol@example.com".into()
            }
        );
    }

    #[test]
    fn invite_without_target_is_a_status() {
        assert_eq!(Command::classify("invite"), Command::Status);
        assert_eq!(Command::classify("invite two words"), Command::Status);
    }

    #[test]
    fn anything_else_is_a_status() {
        assert_eq!(Command::classify("shipping the release"), Command::Status);
    }
}
