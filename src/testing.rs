use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use zbus::object_server::SignalEmitter;

use crate::identity::{Account, Identity};
use crate::session::Input;

pub const ADDED_UID: u32 = 1002;
/// Uid the fake daemon refuses to remove.
pub const UNKNOWN_UID: u32 = 4242;
/// Delay before the fake daemon answers removeUser.
pub const REPLY_DELAY: Duration = Duration::from_millis(150);

const WAIT: Duration = Duration::from_secs(5);

static NAME_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Bus name nobody else uses, so tests can run side by side.
pub fn unique_name(tag: &str) -> String {
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "org.sailfishos.usermanager.Test{}x{}x{}",
        tag,
        std::process::id(),
        n
    )
}

pub async fn next_input(receiver: &mut UnboundedReceiver<Input>) -> Input {
    tokio::time::timeout(WAIT, receiver.recv())
        .await
        .expect("timed out waiting for input")
        .expect("input channel closed")
}

/// True if nothing arrives within `quiet`.
pub async fn stays_quiet(receiver: &mut UnboundedReceiver<Input>, quiet: Duration) -> bool {
    tokio::time::timeout(quiet, receiver.recv()).await.is_err()
}

#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "org.sailfishos.usermanager.Error")]
pub enum DaemonError {
    #[zbus(error)]
    ZBus(zbus::Error),
    UserRemoveFailed(String),
}

/// Stand-in for the user manager, served from its own connection.
pub struct FakeDaemon;

#[zbus::interface(name = "org.sailfishos.usermanager")]
impl FakeDaemon {
    #[zbus(name = "addUser")]
    async fn add_user(&self, _name: String) -> Result<u32, DaemonError> {
        Ok(ADDED_UID)
    }

    #[zbus(name = "modifyUser")]
    async fn modify_user(&self, _uid: u32, _new_name: String) -> Result<(), DaemonError> {
        Ok(())
    }

    /// Broadcasts the removal before replying, like the real daemon.
    #[zbus(name = "removeUser")]
    async fn remove_user(
        &self,
        uid: u32,
        #[zbus(signal_emitter)] emitter: SignalEmitter<'_>,
    ) -> Result<(), DaemonError> {
        if uid == UNKNOWN_UID {
            return Err(DaemonError::UserRemoveFailed("no such user".to_string()));
        }
        tokio::time::sleep(REPLY_DELAY).await;
        Self::user_removed(&emitter, uid).await?;
        Ok(())
    }

    #[zbus(name = "setCurrentUser")]
    async fn set_current_user(&self, _uid: u32) -> Result<(), DaemonError> {
        Ok(())
    }

    #[zbus(name = "addToGroups")]
    async fn add_to_groups(&self, _uid: u32, _groups: Vec<String>) -> Result<(), DaemonError> {
        Ok(())
    }

    #[zbus(name = "removeFromGroups")]
    async fn remove_from_groups(
        &self,
        _uid: u32,
        _groups: Vec<String>,
    ) -> Result<(), DaemonError> {
        Ok(())
    }

    #[zbus(signal, name = "userRemoved")]
    async fn user_removed(emitter: &SignalEmitter<'_>, uid: u32) -> zbus::Result<()>;
}

pub struct Daemon {
    pub name: String,
    /// Connection the code under test talks through.
    pub client: zbus::Connection,
    pub server: zbus::Connection,
}

impl Daemon {
    /// Serves a [`FakeDaemon`] on the session bus, `None` if there is no bus.
    pub async fn start(tag: &str) -> Option<Self> {
        let Ok(client) = zbus::Connection::session().await else {
            eprintln!("no session bus, skipping");
            return None;
        };

        let name = unique_name(tag);
        let server = zbus::connection::Builder::session()
            .unwrap()
            .name(name.as_str())
            .unwrap()
            .serve_at("/", FakeDaemon)
            .unwrap()
            .build()
            .await
            .unwrap();

        Some(Self {
            name,
            client,
            server,
        })
    }

    pub async fn emit_user_removed(&self, uid: u32) {
        let iface = self
            .server
            .object_server()
            .interface::<_, FakeDaemon>("/")
            .await
            .unwrap();
        FakeDaemon::user_removed(iface.signal_emitter(), uid)
            .await
            .unwrap();
    }
}

/// In-memory accounts: alice and bob in the group, carol known but not listed.
pub struct TestIdentity {
    accounts: HashMap<u32, Account>,
}

impl Default for TestIdentity {
    fn default() -> Self {
        let accounts = [(1000, "alice"), (1001, "bob"), (ADDED_UID, "carol")]
            .into_iter()
            .map(|(uid, username)| {
                let account = Account {
                    uid,
                    username: username.to_string(),
                    name: String::new(),
                };
                (uid, account)
            })
            .collect();
        Self { accounts }
    }
}

impl Identity for TestIdentity {
    fn user_by_uid(&self, uid: u32) -> Option<Account> {
        self.accounts.get(&uid).cloned()
    }

    fn user_by_name(&self, username: &str) -> Option<Account> {
        self.accounts
            .values()
            .find(|account| account.username == username)
            .cloned()
    }

    fn group_members(&self, _group: &str) -> Vec<String> {
        vec!["alice".to_string(), "bob".to_string()]
    }

    fn in_group(&self, _uid: u32, _group: &str) -> bool {
        false
    }

    fn current_uid(&self) -> Option<u32> {
        None
    }
}
