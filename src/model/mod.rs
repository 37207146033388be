// SPDX-License-Identifier: MPL-2.0

use std::collections::HashMap;

use crate::identity::{Identity, SystemIdentity};

pub mod error;
pub mod message;
pub mod role;
pub mod user;

use error::{Operation, UserError};
use message::{ModelEvent, Reply, Request, Signal};
use role::{Role, RoleValue};
use user::UserInfo;

/// Cached list of user accounts kept in step with the user manager.
///
/// The model never talks to the bus itself. Local edits return the [`Request`]
/// to send, and the outcome comes back through [`UserModel::apply_reply`].
/// Broadcasts from the daemon are fed in with [`UserModel::apply_signal`].
/// Every change is queued as a [`ModelEvent`] for the owner to drain.
///
/// Rows are ordered for display. A trailing placeholder row may stand in for
/// a user that is still being created; it is the only row without a uid.
pub struct UserModel<I: Identity = SystemIdentity> {
    identity: I,
    users: Vec<UserInfo>,
    // Row of every listed uid, the placeholder has no entry
    uids_to_rows: HashMap<u32, usize>,
    current_uid: Option<u32>,
    events: Vec<ModelEvent>,
}

impl<I: Identity> UserModel<I> {
    /// Builds the initial list from the members of `group`.
    pub fn new(identity: I, group: &str) -> Self {
        let current_uid = identity.current_uid();
        let mut model = Self {
            identity,
            users: Vec::new(),
            uids_to_rows: HashMap::new(),
            current_uid,
            events: Vec::new(),
        };

        for username in model.identity.group_members(group) {
            let Some(user) = UserInfo::from_username(&model.identity, &username, current_uid)
            else {
                tracing::debug!(%username, "skipping group member without account");
                continue;
            };
            let Some(uid) = user.uid() else { continue };
            if model.uids_to_rows.contains_key(&uid) {
                continue;
            }
            model.uids_to_rows.insert(uid, model.users.len());
            model.users.push(user);
        }

        model
    }

    pub fn row_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user(&self, row: usize) -> Option<&UserInfo> {
        self.users.get(row)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserInfo> {
        self.users.iter()
    }

    pub fn row_of(&self, uid: u32) -> Option<usize> {
        self.uids_to_rows.get(&uid).copied()
    }

    pub fn data(&self, row: usize, role: Role) -> Option<RoleValue> {
        self.users.get(row).map(|user| RoleValue::of(user, role))
    }

    pub fn role_names(&self) -> Vec<(Role, &'static str)> {
        Role::all().iter().map(|role| (*role, role.role_name())).collect()
    }

    /// Whether the last row is a placeholder.
    pub fn placeholder(&self) -> bool {
        self.users.last().is_some_and(|user| !user.is_valid())
    }

    pub fn current_user(&self) -> Option<&UserInfo> {
        let row = self.row_of(self.current_uid?)?;
        self.users.get(row)
    }

    /// Hands out the change notifications queued since the last call.
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_placeholder(&mut self, value: bool) {
        if self.placeholder() == value {
            return;
        }

        if value {
            let row = self.users.len();
            self.users.push(UserInfo::placeholder());
            self.emit(ModelEvent::RowInserted(row));
        } else {
            let row = self.users.len() - 1;
            self.users.pop();
            self.emit(ModelEvent::RowRemoved(row));
        }
        self.emit(ModelEvent::PlaceholderChanged(value));
    }

    /// Writes an editable role. Only [`Role::Name`] accepts values.
    pub fn set_data(&mut self, row: usize, role: Role, value: &RoleValue) -> Option<Request> {
        if !role.is_editable() {
            return None;
        }
        self.set_name(row, value.as_text()?)
    }

    /// Renames a row right away and returns the command that makes it stick.
    ///
    /// The placeholder is renamed locally only, its name is used once
    /// [`UserModel::create_user`] is called.
    pub fn set_name(&mut self, row: usize, name: &str) -> Option<Request> {
        let user = self.users.get_mut(row)?;
        if name.is_empty() || name == user.name() {
            return None;
        }

        user.set_name(name);
        let request = user.uid().map(|uid| Request::ModifyUser {
            uid,
            name: name.to_string(),
        });
        self.emit(ModelEvent::DataChanged {
            row,
            roles: vec![Role::Name],
        });
        request
    }

    /// Creates a user from the placeholder row, which needs a name.
    pub fn create_user(&self) -> Option<Request> {
        if !self.placeholder() {
            return None;
        }

        let name = self.users.last()?.name();
        if name.is_empty() {
            return None;
        }

        Some(Request::AddUser {
            name: name.to_string(),
        })
    }

    /// The row stays until the daemon broadcasts the removal.
    pub fn remove_user(&self, row: usize) -> Option<Request> {
        let uid = self.valid_uid(row)?;
        Some(Request::RemoveUser { uid })
    }

    pub fn set_current_user(&self, row: usize) -> Option<Request> {
        let uid = self.valid_uid(row)?;
        Some(Request::SetCurrentUser { uid })
    }

    pub fn add_groups(&self, row: usize, groups: Vec<String>) -> Option<Request> {
        let uid = self.valid_uid(row)?;
        Some(Request::AddToGroups { uid, groups })
    }

    pub fn remove_groups(&self, row: usize, groups: Vec<String>) -> Option<Request> {
        let uid = self.valid_uid(row)?;
        Some(Request::RemoveFromGroups { uid, groups })
    }

    pub fn has_group(&self, row: usize, group: &str) -> bool {
        self.valid_uid(row)
            .is_some_and(|uid| self.identity.in_group(uid, group))
    }

    /// Restores a row from the system, dropping unsaved edits.
    pub fn reset(&mut self, row: usize) {
        let Some(user) = self.users.get_mut(row) else {
            return;
        };
        user.reset(&self.identity);
        self.emit(ModelEvent::DataChanged { row, roles: Vec::new() });
    }

    pub fn apply_reply(&mut self, reply: Reply) {
        match reply {
            Reply::UserAdded(Ok(uid)) => {
                // The userAdded broadcast may have listed it already
                if !self.uids_to_rows.contains_key(&uid) {
                    match UserInfo::from_uid(&self.identity, uid, self.current_uid) {
                        Some(user) => self.insert_user(user),
                        None => tracing::warn!(uid, "added user has no account"),
                    }
                }
                // Placeholder stays for the next user, only its name goes
                if self.placeholder() {
                    self.reset(self.users.len() - 1);
                }
            }
            Reply::UserAdded(Err(error)) => {
                tracing::warn!(%error, "adding user with user manager failed");
                self.fail(Operation::AddUser, None, error);
            }
            Reply::UserModified { uid, result } => {
                if let Err(error) = result {
                    tracing::warn!(uid, %error, "modifying user with user manager failed");
                    let Some(row) = self.reply_row(uid, Operation::ModifyUser) else {
                        return;
                    };
                    self.fail(Operation::ModifyUser, Some(row), error);
                    self.reset(row);
                }
            }
            Reply::UserRemoved { uid, result } => match result {
                // Row goes away with the userRemoved broadcast
                Ok(()) => tracing::debug!(uid, "user removal accepted"),
                Err(error) => {
                    tracing::warn!(uid, %error, "removing user with user manager failed");
                    self.fail_row(uid, Operation::RemoveUser, error);
                }
            },
            Reply::CurrentUserSet { uid, result } => match result {
                Ok(()) => tracing::debug!(uid, "user switch initiated"),
                Err(error) => {
                    tracing::warn!(uid, %error, "switching user with user manager failed");
                    self.fail_row(uid, Operation::SetCurrentUser, error);
                }
            },
            Reply::AddedToGroups { uid, result } => {
                self.groups_reply(uid, Operation::AddToGroups, result)
            }
            Reply::RemovedFromGroups { uid, result } => {
                self.groups_reply(uid, Operation::RemoveFromGroups, result)
            }
        }
    }

    pub fn apply_signal(&mut self, signal: Signal) {
        match signal {
            Signal::UserAdded(uid) => {
                if self.uids_to_rows.contains_key(&uid) {
                    return;
                }
                match UserInfo::from_uid(&self.identity, uid, self.current_uid) {
                    Some(user) => self.insert_user(user),
                    None => tracing::debug!(uid, "ignoring added user without account"),
                }
            }
            Signal::UserModified { uid, name } => {
                let Some(row) = self.row_of(uid) else { return };
                let user = &mut self.users[row];
                if user.name() != name {
                    user.set_name(name);
                    self.emit(ModelEvent::DataChanged {
                        row,
                        roles: vec![Role::Name],
                    });
                }
            }
            Signal::UserRemoved(uid) => {
                let Some(row) = self.uids_to_rows.remove(&uid) else {
                    return;
                };
                self.users.remove(row);
                for value in self.uids_to_rows.values_mut() {
                    if *value > row {
                        *value -= 1;
                    }
                }
                self.emit(ModelEvent::RowRemoved(row));
            }
            Signal::CurrentUserChanged(uid) => {
                if let Some(previous) = self.current_uid.replace(uid)
                    && previous != uid
                {
                    self.update_current(previous, false);
                }
                self.update_current(uid, true);
            }
            Signal::CurrentUserChangeFailed(uid) => {
                if let Some(row) = self.row_of(uid) {
                    self.fail(Operation::SetCurrentUser, Some(row), UserError::Failure);
                }
            }
        }
    }

    fn valid_uid(&self, row: usize) -> Option<u32> {
        self.users.get(row)?.uid()
    }

    // Keeps the placeholder last
    fn insert_user(&mut self, user: UserInfo) {
        let Some(uid) = user.uid() else { return };
        let row = if self.placeholder() {
            self.users.len() - 1
        } else {
            self.users.len()
        };
        self.users.insert(row, user);
        self.uids_to_rows.insert(uid, row);
        self.emit(ModelEvent::RowInserted(row));
    }

    fn update_current(&mut self, uid: u32, current: bool) {
        let Some(row) = self.row_of(uid) else { return };
        if self.users[row].set_current(current) {
            self.emit(ModelEvent::DataChanged {
                row,
                roles: vec![Role::Current],
            });
        }
    }

    fn groups_reply(&mut self, uid: u32, operation: Operation, result: Result<(), UserError>) {
        match result {
            Ok(()) => {
                if let Some(row) = self.reply_row(uid, operation) {
                    self.emit(ModelEvent::GroupsChanged { row });
                }
            }
            Err(error) => {
                tracing::warn!(uid, %error, %operation, "changing user groups failed");
                self.fail_row(uid, operation, error);
            }
        }
    }

    fn reply_row(&self, uid: u32, operation: Operation) -> Option<usize> {
        let row = self.row_of(uid);
        if row.is_none() {
            tracing::debug!(uid, %operation, "reply for user no longer listed");
        }
        row
    }

    fn fail_row(&mut self, uid: u32, operation: Operation, error: UserError) {
        if let Some(row) = self.reply_row(uid, operation) {
            self.fail(operation, Some(row), error);
        }
    }

    fn fail(&mut self, operation: Operation, row: Option<usize>, error: UserError) {
        self.emit(ModelEvent::Failed {
            operation,
            row,
            error,
        });
    }

    fn emit(&mut self, event: ModelEvent) {
        self.events.push(event);
    }
}
