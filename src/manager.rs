use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::model::error::UserError;
use crate::model::message::{Reply, Request, Signal};
use crate::session::Input;
use crate::usermanager_dbus::UserManagerProxy;

/// Live proxy together with the task forwarding its signals.
struct Interface {
    proxy: UserManagerProxy<'static>,
    signals: JoinHandle<()>,
}

/// Owner of the connection to the user manager.
///
/// At most one proxy exists at a time. It is created on first use or when
/// the daemon shows up, and dropped when the daemon leaves the bus.
pub struct UserManager {
    connection: zbus::Connection,
    service: String,
    path: String,
    interface: Option<Interface>,
}

impl UserManager {
    pub fn new(
        connection: zbus::Connection,
        service: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            service: service.into(),
            path: path.into(),
            interface: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.interface.is_some()
    }

    /// Returns the live proxy, creating it and subscribing to signals if needed.
    pub async fn create_interface(
        &mut self,
        inputs: &UnboundedSender<Input>,
    ) -> zbus::Result<UserManagerProxy<'static>> {
        if let Some(interface) = &self.interface {
            return Ok(interface.proxy.clone());
        }

        tracing::debug!(service = %self.service, "creating interface to user manager");
        let proxy = UserManagerProxy::builder(&self.connection)
            .destination(self.service.clone())?
            .path(self.path.clone())?
            .build()
            .await?;

        let mut signals = subscribe(&proxy).await?;
        let inputs = inputs.clone();
        let signals = tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                if inputs.send(Input::Signal(signal)).is_err() {
                    break;
                }
            }
        });

        self.interface = Some(Interface {
            proxy: proxy.clone(),
            signals,
        });
        Ok(proxy)
    }

    pub fn destroy_interface(&mut self) {
        if let Some(interface) = self.interface.take() {
            tracing::debug!(service = %self.service, "destroying interface to user manager");
            interface.signals.abort();
        }
    }

    /// Sends `request` in the background, its [`Reply`] arrives on `inputs`.
    ///
    /// The command keeps its own proxy handle, so it completes even if the
    /// interface is torn down in the meantime.
    pub async fn dispatch(&mut self, request: Request, inputs: &UnboundedSender<Input>) {
        let proxy = match self.create_interface(inputs).await {
            Ok(proxy) => proxy,
            Err(err) => {
                tracing::warn!(%err, "creating interface to user manager failed");
                let _ = inputs.send(Input::Reply(request.fail(err.into())));
                return;
            }
        };

        let inputs = inputs.clone();
        tokio::spawn(async move {
            let reply = execute(&proxy, request).await;
            let _ = inputs.send(Input::Reply(reply));
        });
    }
}

impl Drop for UserManager {
    fn drop(&mut self) {
        self.destroy_interface();
    }
}

pub async fn execute(proxy: &UserManagerProxy<'_>, request: Request) -> Reply {
    match request {
        Request::AddUser { name } => {
            Reply::UserAdded(proxy.add_user(&name).await.map_err(UserError::from))
        }
        Request::ModifyUser { uid, name } => Reply::UserModified {
            uid,
            result: proxy.modify_user(uid, &name).await.map_err(UserError::from),
        },
        Request::RemoveUser { uid } => Reply::UserRemoved {
            uid,
            result: proxy.remove_user(uid).await.map_err(UserError::from),
        },
        Request::SetCurrentUser { uid } => Reply::CurrentUserSet {
            uid,
            result: proxy.set_current_user(uid).await.map_err(UserError::from),
        },
        Request::AddToGroups { uid, groups } => Reply::AddedToGroups {
            uid,
            result: proxy.add_to_groups(uid, &groups).await.map_err(UserError::from),
        },
        Request::RemoveFromGroups { uid, groups } => Reply::RemovedFromGroups {
            uid,
            result: proxy
                .remove_from_groups(uid, &groups)
                .await
                .map_err(UserError::from),
        },
    }
}

/// Merges the five broadcasts of the user manager into one stream.
async fn subscribe(
    proxy: &UserManagerProxy<'static>,
) -> zbus::Result<BoxStream<'static, Signal>> {
    let added = proxy
        .receive_user_added()
        .await?
        .filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Signal::UserAdded(args.entry.uid)),
                Err(err) => {
                    tracing::warn!(%err, "failed to parse userAdded");
                    None
                }
            }
        })
        .boxed();

    let modified = proxy
        .receive_user_modified()
        .await?
        .filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Signal::UserModified {
                    uid: args.uid,
                    name: args.new_name,
                }),
                Err(err) => {
                    tracing::warn!(%err, "failed to parse userModified");
                    None
                }
            }
        })
        .boxed();

    let removed = proxy
        .receive_user_removed()
        .await?
        .filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Signal::UserRemoved(args.uid)),
                Err(err) => {
                    tracing::warn!(%err, "failed to parse userRemoved");
                    None
                }
            }
        })
        .boxed();

    let current_changed = proxy
        .receive_current_user_changed()
        .await?
        .filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Signal::CurrentUserChanged(args.uid)),
                Err(err) => {
                    tracing::warn!(%err, "failed to parse currentUserChanged");
                    None
                }
            }
        })
        .boxed();

    let current_failed = proxy
        .receive_current_user_change_failed()
        .await?
        .filter_map(|signal| async move {
            match signal.args() {
                Ok(args) => Some(Signal::CurrentUserChangeFailed(args.uid)),
                Err(err) => {
                    tracing::warn!(%err, "failed to parse currentUserChangeFailed");
                    None
                }
            }
        })
        .boxed();

    Ok(stream::select_all([
        added,
        modified,
        removed,
        current_changed,
        current_failed,
    ])
    .boxed())
}
