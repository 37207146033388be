// SPDX-License-Identifier: MPL-2.0

use nix::unistd::{Group, Uid, User, getuid};

/// Password database entry for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: u32,
    pub username: String,
    pub name: String,
}

/// Authoritative source for account data. The list model only reads through it.
pub trait Identity {
    fn user_by_uid(&self, uid: u32) -> Option<Account>;
    fn user_by_name(&self, username: &str) -> Option<Account>;
    /// Usernames listed as members of `group`.
    fn group_members(&self, group: &str) -> Vec<String>;
    fn in_group(&self, uid: u32, group: &str) -> bool;
    fn current_uid(&self) -> Option<u32>;
}

/// Looks accounts up in the system password and group databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl SystemIdentity {
    fn account(user: User) -> Account {
        let gecos = user.gecos.to_string_lossy();
        let name = gecos.split(',').next().unwrap_or_default().to_string();
        Account {
            uid: user.uid.as_raw(),
            username: user.name,
            name,
        }
    }
}

impl Identity for SystemIdentity {
    fn user_by_uid(&self, uid: u32) -> Option<Account> {
        match User::from_uid(Uid::from_raw(uid)) {
            Ok(user) => user.map(Self::account),
            Err(err) => {
                tracing::warn!(uid, %err, "password lookup failed");
                None
            }
        }
    }

    fn user_by_name(&self, username: &str) -> Option<Account> {
        match User::from_name(username) {
            Ok(user) => user.map(Self::account),
            Err(err) => {
                tracing::warn!(username, %err, "password lookup failed");
                None
            }
        }
    }

    fn group_members(&self, group: &str) -> Vec<String> {
        match Group::from_name(group) {
            Ok(Some(group)) => group.mem,
            Ok(None) => {
                tracing::warn!(group, "group not found");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(group, %err, "group lookup failed");
                Vec::new()
            }
        }
    }

    fn in_group(&self, uid: u32, group: &str) -> bool {
        let Ok(Some(user)) = User::from_uid(Uid::from_raw(uid)) else {
            return false;
        };
        let Ok(Some(group)) = Group::from_name(group) else {
            return false;
        };

        // Primary group membership is not listed in the member list
        user.gid == group.gid || group.mem.contains(&user.name)
    }

    fn current_uid(&self) -> Option<u32> {
        Some(getuid().as_raw())
    }
}
