// SPDX-License-Identifier: MPL-2.0

use crate::identity::{Account, Identity};

pub const DEVICE_OWNER_UID: u32 = 100000;
pub const GUEST_UID: u32 = 105000;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserType {
    #[default]
    Regular,
    DeviceOwner,
    Guest,
}

impl UserType {
    pub fn from_uid(uid: u32) -> Self {
        match uid {
            DEVICE_OWNER_UID => UserType::DeviceOwner,
            GUEST_UID => UserType::Guest,
            _ => UserType::Regular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Regular => "regular",
            UserType::DeviceOwner => "device-owner",
            UserType::Guest => "guest",
        }
    }
}

/// One row of the user list.
///
/// A record without a uid is the placeholder for a user that has not been
/// created yet. Every other record mirrors an account known to the system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    uid: Option<u32>,
    username: String,
    name: String,
    user_type: UserType,
    current: bool,
}

impl UserInfo {
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn from_account(account: Account, current_uid: Option<u32>) -> Self {
        Self {
            uid: Some(account.uid),
            user_type: UserType::from_uid(account.uid),
            current: current_uid == Some(account.uid),
            username: account.username,
            name: account.name,
        }
    }

    pub fn from_uid(identity: &impl Identity, uid: u32, current_uid: Option<u32>) -> Option<Self> {
        identity
            .user_by_uid(uid)
            .map(|account| Self::from_account(account, current_uid))
    }

    pub fn from_username(
        identity: &impl Identity,
        username: &str,
        current_uid: Option<u32>,
    ) -> Option<Self> {
        identity
            .user_by_name(username)
            .map(|account| Self::from_account(account, current_uid))
    }

    pub fn is_valid(&self) -> bool {
        self.uid.is_some()
    }

    pub fn uid(&self) -> Option<u32> {
        self.uid
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    pub fn current(&self) -> bool {
        self.current
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.username
        } else {
            &self.name
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns true if the flag changed.
    pub fn set_current(&mut self, current: bool) -> bool {
        if self.current == current {
            return false;
        }
        self.current = current;
        true
    }

    /// Drops local edits and reloads the record from `identity`.
    pub fn reset(&mut self, identity: &impl Identity) {
        let Some(uid) = self.uid else {
            self.name.clear();
            return;
        };

        match identity.user_by_uid(uid) {
            Some(account) => {
                self.username = account.username;
                self.name = account.name;
                self.user_type = UserType::from_uid(uid);
            }
            None => tracing::debug!(uid, "account vanished, keeping cached record"),
        }
    }
}

impl std::fmt::Display for UserInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() || self.name == self.username {
            write!(f, "{}", self.username)
        } else {
            write!(f, "{} ({})", self.name, self.username)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneAccount(Account);

    impl Identity for OneAccount {
        fn user_by_uid(&self, uid: u32) -> Option<Account> {
            (uid == self.0.uid).then(|| self.0.clone())
        }

        fn user_by_name(&self, username: &str) -> Option<Account> {
            (username == self.0.username).then(|| self.0.clone())
        }

        fn group_members(&self, _group: &str) -> Vec<String> {
            vec![self.0.username.clone()]
        }

        fn in_group(&self, _uid: u32, _group: &str) -> bool {
            false
        }

        fn current_uid(&self) -> Option<u32> {
            None
        }
    }

    fn identity() -> OneAccount {
        OneAccount(Account {
            uid: 1000,
            username: "alice".to_string(),
            name: "Alice Liddell".to_string(),
        })
    }

    #[test]
    fn test_user_type_from_uid() {
        assert_eq!(UserType::from_uid(100000), UserType::DeviceOwner);
        assert_eq!(UserType::from_uid(105000), UserType::Guest);
        assert_eq!(UserType::from_uid(100001), UserType::Regular);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut user = UserInfo::from_uid(&identity(), 1000, None).unwrap();
        assert_eq!(user.display_name(), "Alice Liddell");
        assert_eq!(user.to_string(), "Alice Liddell (alice)");
        user.set_name("");
        assert_eq!(user.display_name(), "alice");
        assert_eq!(user.to_string(), "alice");
    }

    #[test]
    fn test_set_current_reports_flip() {
        let mut user = UserInfo::from_uid(&identity(), 1000, Some(1000)).unwrap();
        assert!(user.current());
        assert!(!user.set_current(true));
        assert!(user.set_current(false));
        assert!(!user.current());
    }

    #[test]
    fn test_reset() {
        let identity = identity();
        let mut user = UserInfo::from_username(&identity, "alice", None).unwrap();
        user.set_name("Ally");
        user.reset(&identity);
        assert_eq!(user.name(), "Alice Liddell");

        let mut placeholder = UserInfo::placeholder();
        placeholder.set_name("carol");
        placeholder.reset(&identity);
        assert_eq!(placeholder.name(), "");
        assert!(!placeholder.is_valid());
    }

    #[test]
    fn test_unknown_uid() {
        assert_eq!(UserInfo::from_uid(&identity(), 4242, None), None);
    }
}
