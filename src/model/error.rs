// SPDX-License-Identifier: MPL-2.0

use crate::usermanager_dbus::ERROR_PREFIX;

const DBUS_ERROR_PREFIX: &str = "org.freedesktop.DBus.Error.";

/// Failure reported for a user manager command or broadcast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("user manager is busy")]
    Busy,
    #[error("creating home directory failed")]
    HomeCreateFailed,
    #[error("removing home directory failed")]
    HomeRemoveFailed,
    #[error("creating user group failed")]
    GroupCreateFailed,
    #[error("adding user failed")]
    UserAddFailed,
    #[error("modifying user failed")]
    UserModifyFailed,
    #[error("removing user failed")]
    UserRemoveFailed,
    #[error("getting uid failed")]
    GetUidFailed,
    #[error("user not found")]
    UserNotFound,
    #[error("adding user to group failed")]
    AddToGroupFailed,
    #[error("removing user from group failed")]
    RemoveFromGroupFailed,
    /// Error name the user manager does not document.
    #[error("user manager error: {0}")]
    Other(String),
    /// Bus level failure such as a timeout or a lost connection.
    #[error("bus error: {0}")]
    Transport(String),
    /// Failure announced by a broadcast, without an error payload.
    #[error("operation failed")]
    Failure,
}

impl UserError {
    /// Maps a daemon error name to its kind, if the daemon documents it.
    pub fn from_error_name(name: &str) -> Option<Self> {
        let kind = name.strip_prefix(ERROR_PREFIX)?;
        Some(match kind {
            "Busy" => UserError::Busy,
            "HomeCreateFailed" => UserError::HomeCreateFailed,
            "HomeRemoveFailed" => UserError::HomeRemoveFailed,
            "GroupCreateFailed" => UserError::GroupCreateFailed,
            "UserAddFailed" => UserError::UserAddFailed,
            "UserModifyFailed" => UserError::UserModifyFailed,
            "UserRemoveFailed" => UserError::UserRemoveFailed,
            "GetUidFailed" => UserError::GetUidFailed,
            "UserNotFound" => UserError::UserNotFound,
            "AddToGroupFailed" => UserError::AddToGroupFailed,
            "RemoveFromGroupFailed" => UserError::RemoveFromGroupFailed,
            _ => return None,
        })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, UserError::Transport(_))
    }
}

impl From<zbus::Error> for UserError {
    fn from(err: zbus::Error) -> Self {
        match &err {
            zbus::Error::MethodError(name, _, _) => {
                let name = name.as_str();
                if name.starts_with(DBUS_ERROR_PREFIX) {
                    UserError::Transport(name.to_string())
                } else {
                    UserError::from_error_name(name)
                        .unwrap_or_else(|| UserError::Other(name.to_string()))
                }
            }
            _ => UserError::Transport(err.to_string()),
        }
    }
}

/// Remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddUser,
    ModifyUser,
    RemoveUser,
    SetCurrentUser,
    AddToGroups,
    RemoveFromGroups,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::AddUser => "add-user",
            Operation::ModifyUser => "modify-user",
            Operation::RemoveUser => "remove-user",
            Operation::SetCurrentUser => "set-current-user",
            Operation::AddToGroups => "add-to-groups",
            Operation::RemoveFromGroups => "remove-from-groups",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::message::Message;
    use zbus::names::ErrorName;

    fn create_method_error(name: &str) -> zbus::Error {
        let msg = Message::method_call("/", "addUser")
            .unwrap()
            .destination("org.sailfishos.usermanager")
            .unwrap()
            .build(&())
            .unwrap();

        let error_name = ErrorName::try_from(name).unwrap();
        zbus::Error::MethodError(error_name.into(), None, msg)
    }

    #[test]
    fn test_zbus_error_conversion() {
        let test_cases = vec![
            ("org.sailfishos.usermanager.Error.Busy", UserError::Busy),
            ("org.sailfishos.usermanager.Error.HomeCreateFailed", UserError::HomeCreateFailed),
            ("org.sailfishos.usermanager.Error.HomeRemoveFailed", UserError::HomeRemoveFailed),
            ("org.sailfishos.usermanager.Error.GroupCreateFailed", UserError::GroupCreateFailed),
            ("org.sailfishos.usermanager.Error.UserAddFailed", UserError::UserAddFailed),
            ("org.sailfishos.usermanager.Error.UserModifyFailed", UserError::UserModifyFailed),
            ("org.sailfishos.usermanager.Error.UserRemoveFailed", UserError::UserRemoveFailed),
            ("org.sailfishos.usermanager.Error.GetUidFailed", UserError::GetUidFailed),
            ("org.sailfishos.usermanager.Error.UserNotFound", UserError::UserNotFound),
            ("org.sailfishos.usermanager.Error.AddToGroupFailed", UserError::AddToGroupFailed),
            (
                "org.sailfishos.usermanager.Error.RemoveFromGroupFailed",
                UserError::RemoveFromGroupFailed,
            ),
        ];

        for (error_str, expected) in test_cases {
            let zbus_err = create_method_error(error_str);
            let user_err = UserError::from(zbus_err);
            assert_eq!(user_err, expected, "Failed for error: {}", error_str);
        }
    }

    #[test]
    fn test_unknown_daemon_error() {
        let error_str = "org.sailfishos.usermanager.Error.SomethingNew";
        let user_err = UserError::from(create_method_error(error_str));
        assert_eq!(user_err, UserError::Other(error_str.to_string()));
    }

    #[test]
    fn test_standard_bus_error_is_transport() {
        let error_str = "org.freedesktop.DBus.Error.NoReply";
        let user_err = UserError::from(create_method_error(error_str));
        assert_eq!(user_err, UserError::Transport(error_str.to_string()));
        assert!(user_err.is_transport());
    }

    #[test]
    fn test_non_method_error() {
        let zbus_err = zbus::Error::from(std::io::Error::other("socket closed"));
        let user_err = UserError::from(zbus_err);

        if let UserError::Transport(msg) = user_err {
            assert!(msg.contains("socket closed"));
        } else {
            panic!("Expected UserError::Transport, got {:?}", user_err);
        }
    }

    #[test]
    fn test_error_name_requires_prefix() {
        assert_eq!(UserError::from_error_name("Busy"), None);
        assert_eq!(
            UserError::from_error_name("org.sailfishos.usermanager.Error.Busy"),
            Some(UserError::Busy)
        );
    }
}
