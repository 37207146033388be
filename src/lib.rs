// SPDX-License-Identifier: MPL-2.0

//! List model of the user accounts managed by the user manager daemon.

pub mod config;
pub mod identity;
pub mod manager;
pub mod model;
pub mod session;
pub mod usermanager_dbus;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use identity::{Identity, SystemIdentity};
pub use model::UserModel;
pub use model::error::{Operation, UserError};
pub use model::message::{ModelEvent, Reply, Request, Signal};
pub use model::role::{Role, RoleValue};
pub use model::user::{UserInfo, UserType};
pub use session::Session;
