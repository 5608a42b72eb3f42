//! Local mirror of the server's user collection.
//!
//! # Design
//! State changes only through `UserState::apply`, a pure
//! `(state, event) -> state` transition. Events describe server-confirmed
//! outcomes: a created record is appended as the server returned it and a
//! deleted id is filtered out, so no mutation needs a full refetch. Failed
//! calls produce no event and leave the state untouched.

use chrono::{DateTime, Utc};

use crate::types::{User, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// A full listing replaced the collection.
    Loaded { users: Vec<User>, at: DateTime<Utc> },
    /// The server created this record.
    Created(User),
    /// The server deleted the record with this id.
    Deleted(UserId),
    Selected(UserId),
    SelectionCleared,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserState {
    users: Vec<User>,
    selected: Option<UserId>,
    last_fetch: Option<DateTime<Utc>>,
}

impl UserState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn apply(mut self, event: UserEvent) -> Self {
        match event {
            UserEvent::Loaded { users, at } => {
                self.users = users;
                self.last_fetch = Some(at);
                if self.selected.is_some_and(|id| self.find(id).is_none()) {
                    self.selected = None;
                }
            }
            UserEvent::Created(user) => self.users.push(user),
            UserEvent::Deleted(id) => {
                self.users.retain(|user| user.id != id);
                if self.selected == Some(id) {
                    self.selected = None;
                }
            }
            UserEvent::Selected(id) => {
                if self.find(id).is_some() {
                    self.selected = Some(id);
                }
            }
            UserEvent::SelectionCleared => self.selected = None,
        }
        self
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn find(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn selected(&self) -> Option<UserId> {
        self.selected
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.selected.and_then(|id| self.find(id))
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    pub fn total(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, name: &str) -> User {
        User {
            id: UserId::new(id).unwrap(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            age: 30,
            city: None,
        }
    }

    fn id(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn loaded(users: Vec<User>) -> UserState {
        UserState::new().apply(UserEvent::Loaded { users, at: Utc::now() })
    }

    #[test]
    fn created_appends_exactly_one_record() {
        let state = loaded(vec![user(1, "John"), user(2, "Jane")]);
        let state = state.apply(UserEvent::Created(user(7, "Ann")));
        assert_eq!(state.total(), 3);
        assert_eq!(state.users()[2].id, id(7));
        assert_eq!(state.users().iter().filter(|u| u.id == id(7)).count(), 1);
    }

    #[test]
    fn selection_cleared_drops_only_the_selection() {
        let selected = loaded(vec![user(1, "John"), user(2, "Jane")]).apply(UserEvent::Selected(id(2)));
        assert_eq!(selected.selected_user().map(|u| u.name.as_str()), Some("Jane"));

        let cleared = selected.clone().apply(UserEvent::SelectionCleared);
        assert_eq!(cleared.selected(), None);
        assert_eq!(cleared.users(), selected.users());
    }

    #[test]
    fn deleted_filters_out_the_id_and_clears_selection() {
        let state = loaded(vec![user(1, "John"), user(7, "Ann")])
            .apply(UserEvent::Selected(id(7)))
            .apply(UserEvent::Deleted(id(7)));
        assert!(state.find(id(7)).is_none());
        assert_eq!(state.selected(), None);
        assert_eq!(state.total(), 1);
    }

    #[test]
    fn deleting_another_record_keeps_selection() {
        let state = loaded(vec![user(1, "John"), user(7, "Ann")])
            .apply(UserEvent::Selected(id(1)))
            .apply(UserEvent::Deleted(id(7)));
        assert_eq!(state.selected_user().map(|u| u.name.as_str()), Some("John"));
    }

    #[test]
    fn selecting_an_unknown_id_is_a_no_op() {
        let state = loaded(vec![user(1, "John")]).apply(UserEvent::Selected(id(9)));
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn reload_drops_a_selection_that_vanished() {
        let state = loaded(vec![user(1, "John")])
            .apply(UserEvent::Selected(id(1)))
            .apply(UserEvent::Loaded {
                users: vec![user(2, "Jane")],
                at: Utc::now(),
            });
        assert_eq!(state.selected(), None);
        assert!(state.last_fetch().is_some());
    }

    #[test]
    fn insertion_order_follows_arrival() {
        let state = UserState::new()
            .apply(UserEvent::Created(user(9, "Zed")))
            .apply(UserEvent::Created(user(3, "Amy")));
        let ids: Vec<u64> = state.users().iter().map(|u| u.id.get()).collect();
        assert_eq!(ids, vec![9, 3]);
    }
}
