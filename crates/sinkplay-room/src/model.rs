//! The mutable room model.
//!
//! A `RoomModel` has exactly one owner (the session inside the connection
//! task), so none of this needs locking. Every user-keyed operation is a
//! linear scan; SyncPlay rooms hold a handful of people.

use crate::{ChatEntry, MediaInfo, RoomSnapshot, User};

/// Users, readiness, files and chat for the current connection.
///
/// Each name appears at most once. Operations keyed by a name that is not
/// present do nothing and return `false`.
#[derive(Debug, Default)]
pub struct RoomModel {
    state: RoomSnapshot,
}

impl RoomModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Users --------------------------------------------------------------

    /// Inserts `user`, or replaces the existing user with the same name in
    /// place (keeping its position in the list).
    ///
    /// Returns `true` if the user was new.
    pub fn upsert_user(&mut self, user: User) -> bool {
        match self.position_of(&user.name) {
            Some(index) => {
                tracing::trace!(name = %user.name, "replacing user");
                self.state.users[index] = user;
                false
            }
            None => {
                tracing::trace!(name = %user.name, "adding user");
                self.state.users.push(user);
                true
            }
        }
    }

    /// Removes a user. Returns the removed record, if there was one.
    pub fn remove_user(&mut self, name: &str) -> Option<User> {
        let index = self.position_of(name)?;
        tracing::trace!(name, "removing user");
        Some(self.state.users.remove(index))
    }

    /// Sets a user's readiness. Also updates the self-ready flag when
    /// `name` is us.
    pub fn set_ready(&mut self, name: &str, ready: bool) -> bool {
        if !self.state.local_name.is_empty() && name == self.state.local_name {
            self.state.self_ready = ready;
        }
        self.update(name, |user| user.ready = ready)
    }

    /// Replaces a user's file.
    pub fn set_file(&mut self, name: &str, file: Option<MediaInfo>) -> bool {
        self.update(name, |user| user.file = file)
    }

    /// Moves a user to another room.
    pub fn set_room(&mut self, name: &str, room: Option<String>) -> bool {
        self.update(name, |user| user.room = room)
    }

    /// Looks up a user by name.
    pub fn user(&self, name: &str) -> Option<&User> {
        self.state.user(name)
    }

    /// All users, in the order they first appeared.
    pub fn users(&self) -> &[User] {
        &self.state.users
    }

    // -- Chat ---------------------------------------------------------------

    pub fn append_chat(&mut self, entry: ChatEntry) {
        self.state.chat.push(entry);
    }

    // -- Local state --------------------------------------------------------

    /// Records the local playback position, in seconds. Non-finite values
    /// are ignored.
    pub fn set_position(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.state.position = seconds;
        }
    }

    pub fn set_self_ready(&mut self, ready: bool) {
        self.state.self_ready = ready;
        let name = self.state.local_name.clone();
        self.update(&name, |user| user.ready = ready);
    }

    pub fn set_local_name(&mut self, name: impl Into<String>) {
        self.state.local_name = name.into();
    }

    pub fn local_name(&self) -> &str {
        &self.state.local_name
    }

    pub fn self_ready(&self) -> bool {
        self.state.self_ready
    }

    /// Records the file we have open, and mirrors it onto our own user
    /// entry if the server has listed us already.
    pub fn set_local_file(&mut self, file: Option<MediaInfo>) {
        let name = self.state.local_name.clone();
        self.update(&name, |user| user.file = file.clone());
        self.state.local_file = file;
    }

    // -- Playlist -----------------------------------------------------------

    pub fn set_playlist(&mut self, files: Vec<String>) {
        self.state.playlist = files;
    }

    pub fn set_playlist_index(&mut self, index: Option<u64>) {
        self.state.playlist_index = index;
    }

    // -- Whole-model --------------------------------------------------------

    /// Forgets everything. Used when the connection ends.
    pub fn clear(&mut self) {
        self.state = RoomSnapshot::default();
    }

    /// Copies the current state out.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.state.clone()
    }

    fn position_of(&self, name: &str) -> Option<usize> {
        self.state.users.iter().position(|u| u.name == name)
    }

    fn update(&mut self, name: &str, apply: impl FnOnce(&mut User)) -> bool {
        match self.state.users.iter_mut().find(|u| u.name == name) {
            Some(user) => {
                apply(user);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("alice", Some("main".into()))
    }

    #[test]
    fn test_upsert_user_returns_true_only_when_new() {
        let mut model = RoomModel::new();
        assert!(model.upsert_user(alice()));
        assert!(!model.upsert_user(alice()));
        assert_eq!(model.users().len(), 1);
    }

    #[test]
    fn test_upsert_user_keeps_list_position() {
        let mut model = RoomModel::new();
        model.upsert_user(alice());
        model.upsert_user(User::new("bob", None));
        model.upsert_user(alice().with_ready(true));

        let names: Vec<_> = model.users().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
        assert!(model.user("alice").unwrap().ready);
    }

    #[test]
    fn test_keyed_updates_on_unknown_user_are_noops() {
        let mut model = RoomModel::new();
        assert!(!model.set_ready("ghost", true));
        assert!(!model.set_room("ghost", None));
        assert!(!model.set_file("ghost", None));
        assert!(model.remove_user("ghost").is_none());
        assert!(model.users().is_empty());
    }

    #[test]
    fn test_set_ready_for_local_name_updates_self_ready() {
        let mut model = RoomModel::new();
        model.set_local_name("alice");
        model.upsert_user(alice());
        model.set_ready("alice", true);
        assert!(model.self_ready());
        assert!(model.user("alice").unwrap().ready);
    }

    #[test]
    fn test_set_position_ignores_non_finite() {
        let mut model = RoomModel::new();
        model.set_position(12.0);
        model.set_position(f64::NAN);
        assert_eq!(model.snapshot().position, 12.0);
    }
}
