use super::error::{Operation, UserError};
use super::role::Role;

/// Command to be sent to the user manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    AddUser { name: String },
    ModifyUser { uid: u32, name: String },
    RemoveUser { uid: u32 },
    SetCurrentUser { uid: u32 },
    AddToGroups { uid: u32, groups: Vec<String> },
    RemoveFromGroups { uid: u32, groups: Vec<String> },
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::AddUser { .. } => Operation::AddUser,
            Request::ModifyUser { .. } => Operation::ModifyUser,
            Request::RemoveUser { .. } => Operation::RemoveUser,
            Request::SetCurrentUser { .. } => Operation::SetCurrentUser,
            Request::AddToGroups { .. } => Operation::AddToGroups,
            Request::RemoveFromGroups { .. } => Operation::RemoveFromGroups,
        }
    }

    pub fn uid(&self) -> Option<u32> {
        match self {
            Request::AddUser { .. } => None,
            Request::ModifyUser { uid, .. }
            | Request::RemoveUser { uid }
            | Request::SetCurrentUser { uid }
            | Request::AddToGroups { uid, .. }
            | Request::RemoveFromGroups { uid, .. } => Some(*uid),
        }
    }

    /// Reply to use when the request could not reach the daemon at all.
    pub fn fail(self, error: UserError) -> Reply {
        match self {
            Request::AddUser { .. } => Reply::UserAdded(Err(error)),
            Request::ModifyUser { uid, .. } => Reply::UserModified { uid, result: Err(error) },
            Request::RemoveUser { uid } => Reply::UserRemoved { uid, result: Err(error) },
            Request::SetCurrentUser { uid } => Reply::CurrentUserSet { uid, result: Err(error) },
            Request::AddToGroups { uid, .. } => Reply::AddedToGroups { uid, result: Err(error) },
            Request::RemoveFromGroups { uid, .. } => {
                Reply::RemovedFromGroups { uid, result: Err(error) }
            }
        }
    }
}

/// Completion of a [`Request`], keyed by the uid it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    UserAdded(Result<u32, UserError>),
    UserModified { uid: u32, result: Result<(), UserError> },
    UserRemoved { uid: u32, result: Result<(), UserError> },
    CurrentUserSet { uid: u32, result: Result<(), UserError> },
    AddedToGroups { uid: u32, result: Result<(), UserError> },
    RemovedFromGroups { uid: u32, result: Result<(), UserError> },
}

impl Reply {
    pub fn operation(&self) -> Operation {
        match self {
            Reply::UserAdded(_) => Operation::AddUser,
            Reply::UserModified { .. } => Operation::ModifyUser,
            Reply::UserRemoved { .. } => Operation::RemoveUser,
            Reply::CurrentUserSet { .. } => Operation::SetCurrentUser,
            Reply::AddedToGroups { .. } => Operation::AddToGroups,
            Reply::RemovedFromGroups { .. } => Operation::RemoveFromGroups,
        }
    }

    /// Uid the command was issued for, `None` for add-user.
    pub fn uid(&self) -> Option<u32> {
        match self {
            Reply::UserAdded(_) => None,
            Reply::UserModified { uid, .. }
            | Reply::UserRemoved { uid, .. }
            | Reply::CurrentUserSet { uid, .. }
            | Reply::AddedToGroups { uid, .. }
            | Reply::RemovedFromGroups { uid, .. } => Some(*uid),
        }
    }

    pub fn error(&self) -> Option<&UserError> {
        match self {
            Reply::UserAdded(result) => result.as_ref().err(),
            Reply::UserModified { result, .. }
            | Reply::UserRemoved { result, .. }
            | Reply::CurrentUserSet { result, .. }
            | Reply::AddedToGroups { result, .. }
            | Reply::RemovedFromGroups { result, .. } => result.as_ref().err(),
        }
    }

    /// Whether this is the completion of `request`.
    pub fn answers(&self, request: &Request) -> bool {
        self.operation() == request.operation() && self.uid() == request.uid()
    }
}

/// Unsolicited notification broadcast by the user manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    UserAdded(u32),
    UserModified { uid: u32, name: String },
    UserRemoved(u32),
    CurrentUserChanged(u32),
    CurrentUserChangeFailed(u32),
}

/// Change notification emitted by the list model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    RowInserted(usize),
    RowRemoved(usize),
    /// An empty role list means every role may have changed.
    DataChanged { row: usize, roles: Vec<Role> },
    PlaceholderChanged(bool),
    GroupsChanged { row: usize },
    /// `row` is `None` for failures not tied to an existing row.
    Failed {
        operation: Operation,
        row: Option<usize>,
        error: UserError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_keeps_uid() {
        let request = Request::AddToGroups {
            uid: 1001,
            groups: vec!["audio".to_string()],
        };
        let reply = request.clone().fail(UserError::Transport("gone".to_string()));
        assert_eq!(reply.uid(), Some(1001));
        assert_eq!(reply.operation(), Operation::AddToGroups);
        assert_eq!(reply.error(), Some(&UserError::Transport("gone".to_string())));
        assert!(reply.answers(&request));
    }

    #[test]
    fn test_answers_matches_uid_and_operation() {
        let reply = Reply::UserRemoved {
            uid: 1000,
            result: Ok(()),
        };
        assert!(reply.answers(&Request::RemoveUser { uid: 1000 }));
        assert!(!reply.answers(&Request::RemoveUser { uid: 1001 }));
        assert!(!reply.answers(&Request::SetCurrentUser { uid: 1000 }));
        assert_eq!(reply.error(), None);

        let added = Reply::UserAdded(Ok(1002));
        assert!(added.answers(&Request::AddUser {
            name: "carol".to_string()
        }));
    }
}
