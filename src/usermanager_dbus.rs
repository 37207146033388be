use serde::{Deserialize, Serialize};
use zbus::proxy;
use zbus::zvariant::Type;

pub const SERVICE_NAME: &str = "org.sailfishos.usermanager";
pub const OBJECT_PATH: &str = "/";

/// Prefix of the error names returned by the daemon.
pub const ERROR_PREFIX: &str = "org.sailfishos.usermanager.Error.";

/// Entry carried by the `userAdded` signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct UserEntry {
    pub uid: u32,
    pub user: String,
    pub name: String,
}

#[proxy(
    interface = "org.sailfishos.usermanager",
    default_service = "org.sailfishos.usermanager",
    default_path = "/"
)]
pub trait UserManager {
    #[zbus(name = "addUser")]
    fn add_user(&self, name: &str) -> zbus::Result<u32>;

    #[zbus(name = "modifyUser")]
    fn modify_user(&self, uid: u32, new_name: &str) -> zbus::Result<()>;

    #[zbus(name = "removeUser")]
    fn remove_user(&self, uid: u32) -> zbus::Result<()>;

    #[zbus(name = "setCurrentUser")]
    fn set_current_user(&self, uid: u32) -> zbus::Result<()>;

    #[zbus(name = "addToGroups")]
    fn add_to_groups(&self, uid: u32, groups: &[String]) -> zbus::Result<()>;

    #[zbus(name = "removeFromGroups")]
    fn remove_from_groups(&self, uid: u32, groups: &[String]) -> zbus::Result<()>;

    #[zbus(signal, name = "userAdded")]
    fn user_added(&self, entry: UserEntry) -> zbus::Result<()>;

    #[zbus(signal, name = "userModified")]
    fn user_modified(&self, uid: u32, new_name: String) -> zbus::Result<()>;

    #[zbus(signal, name = "userRemoved")]
    fn user_removed(&self, uid: u32) -> zbus::Result<()>;

    #[zbus(signal, name = "currentUserChanged")]
    fn current_user_changed(&self, uid: u32) -> zbus::Result<()>;

    #[zbus(signal, name = "currentUserChangeFailed")]
    fn current_user_change_failed(&self, uid: u32) -> zbus::Result<()>;
}
