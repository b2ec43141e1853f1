use std::collections::HashMap;

use standup_types::models::{Contact, ContactId, SubscriptionState};

/// In-memory projection of the durable contact rows.
///
/// Single source of truth for subscription state and activity bookkeeping
/// while the process runs; rebuilt from the store at startup. Owned
/// exclusively by the bot loop, so reads never see a half-applied update.
#[derive(Debug, Default)]
pub struct ContactDirectory {
    contacts: HashMap<ContactId, Contact>,
}

impl ContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<(ContactId, SubscriptionState, i64)>) -> Self {
        let contacts = rows
            .into_iter()
            .map(|(id, state, last_activity)| {
                let mut contact = Contact::new(id.clone(), state);
                contact.last_activity = last_activity;
                (id, contact)
            })
            .collect();
        Self { contacts }
    }

    pub fn get(&self, id: &ContactId) -> Option<&Contact> {
        self.contacts.get(id)
    }

    pub fn get_mut(&mut self, id: &ContactId) -> Option<&mut Contact> {
        self.contacts.get_mut(id)
    }

    pub fn contains(&self, id: &ContactId) -> bool {
        self.contacts.contains_key(id)
    }

    /// Subscription state if the contact is known at all.
    pub fn state_of(&self, id: &ContactId) -> Option<SubscriptionState> {
        self.contacts.get(id).map(|c| c.state)
    }

    pub fn insert(&mut self, contact: Contact) {
        self.contacts.insert(contact.id.clone(), contact);
    }

    /// Update the state of a known contact, or create it fresh.
    pub fn upsert_state(&mut self, id: &ContactId, state: SubscriptionState) {
        match self.contacts.get_mut(id) {
            Some(contact) => contact.state = state,
            None => self.insert(Contact::new(id.clone(), state)),
        }
    }

    pub fn remove(&mut self, id: &ContactId) -> Option<Contact> {
        self.contacts.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ContactId {
        ContactId::new(s)
    }

    #[test]
    fn from_rows_carries_last_activity() {
        let dir = ContactDirectory::from_rows(vec![
            (id("a@x"), SubscriptionState::Both, 500),
            (id("b@x"), SubscriptionState::PendingIn, 0),
        ]);
        assert_eq!(dir.len(), 2);
        let a = dir.get(&id("a@x")).unwrap();
        assert_eq!(a.last_activity, 500);
        assert_eq!(a.last_reminder, 0);
    }

    #[test]
    fn upsert_state_creates_or_updates() {
        let mut dir = ContactDirectory::new();
        dir.upsert_state(&id("a@x"), SubscriptionState::PendingIn);
        assert_eq!(dir.state_of(&id("a@x")), Some(SubscriptionState::PendingIn));

        dir.upsert_state(&id("a@x"), SubscriptionState::Both);
        assert_eq!(dir.state_of(&id("a@x")), Some(SubscriptionState::Both));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn remove_forgets_the_contact() {
        let mut dir = ContactDirectory::new();
        dir.upsert_state(&id("a@x"), SubscriptionState::Both);
        assert!(dir.remove(&id("a@x")).is_some());
        assert!(!dir.contains(&id("a@x")));
        assert!(dir.remove(&id("a@x")).is_none());
    }
}
