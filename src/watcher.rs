// SPDX-License-Identifier: MPL-2.0

use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use zbus::fdo::DBusProxy;
use zbus::names::BusName;

use crate::session::Input;

/// Whether the user manager currently owns its bus name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Registered,
    Unregistered,
}

impl Presence {
    pub fn from_owner(has_owner: bool) -> Self {
        if has_owner {
            Presence::Registered
        } else {
            Presence::Unregistered
        }
    }
}

/// Reports registration changes of `service` on `inputs`.
///
/// If the service is already on the bus a [`Presence::Registered`] is sent
/// right away.
pub async fn watch(
    connection: &zbus::Connection,
    service: &str,
    inputs: UnboundedSender<Input>,
) -> zbus::Result<JoinHandle<()>> {
    let dbus = DBusProxy::new(connection).await?;

    // Subscribe before asking, so a registration in between is not lost
    let mut changes = dbus
        .receive_name_owner_changed_with_args(&[(0, service)])
        .await?;

    let name = BusName::try_from(service)?;
    if dbus.name_has_owner(name).await? {
        let _ = inputs.send(Input::Presence(Presence::Registered));
    }

    Ok(tokio::spawn(async move {
        while let Some(signal) = changes.next().await {
            let presence = match signal.args() {
                Ok(args) => Presence::from_owner(args.new_owner().is_some()),
                Err(err) => {
                    tracing::warn!(%err, "failed to parse NameOwnerChanged");
                    continue;
                }
            };
            if inputs.send(Input::Presence(presence)).is_err() {
                break;
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{next_input, unique_name};
    use tokio::sync::mpsc;

    #[test]
    fn test_presence_from_owner() {
        assert_eq!(Presence::from_owner(true), Presence::Registered);
        assert_eq!(Presence::from_owner(false), Presence::Unregistered);
    }

    #[tokio::test]
    async fn test_watch_registration() {
        let Ok(connection) = zbus::Connection::session().await else {
            eprintln!("no session bus, skipping");
            return;
        };
        let service = unique_name("Watch");
        let (inputs, mut receiver) = mpsc::unbounded_channel();
        let task = watch(&connection, &service, inputs).await.unwrap();

        let owner = zbus::Connection::session().await.unwrap();
        owner.request_name(service.as_str()).await.unwrap();
        assert_eq!(
            next_input(&mut receiver).await,
            Input::Presence(Presence::Registered)
        );

        owner.release_name(service.as_str()).await.unwrap();
        assert_eq!(
            next_input(&mut receiver).await,
            Input::Presence(Presence::Unregistered)
        );
        task.abort();
    }
}
