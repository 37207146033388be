// SPDX-License-Identifier: MPL-2.0

use std::collections::VecDeque;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::identity::{Identity, SystemIdentity};
use crate::manager::UserManager;
use crate::model::UserModel;
use crate::model::message::{ModelEvent, Reply, Request, Signal};
use crate::watcher::{self, Presence};

/// Everything that can change the model after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Presence(Presence),
    Reply(Reply),
    Signal(Signal),
}

/// Drives a [`UserModel`] from a single task.
///
/// Replies, broadcasts and presence changes are queued on one channel and
/// applied in arrival order, so the model is never touched concurrently.
pub struct Session<I: Identity = SystemIdentity> {
    model: UserModel<I>,
    manager: UserManager,
    inputs: UnboundedSender<Input>,
    receiver: UnboundedReceiver<Input>,
    pending: VecDeque<ModelEvent>,
    watcher: JoinHandle<()>,
}

impl<I: Identity> Session<I> {
    pub async fn new(
        connection: zbus::Connection,
        config: &Config,
        identity: I,
    ) -> zbus::Result<Self> {
        let (inputs, receiver) = mpsc::unbounded_channel();
        let model = UserModel::new(identity, &config.users_group);
        let manager = UserManager::new(connection.clone(), &config.service, &config.path);
        let watcher = watcher::watch(&connection, &config.service, inputs.clone()).await?;

        Ok(Self {
            model,
            manager,
            inputs,
            receiver,
            pending: VecDeque::new(),
            watcher,
        })
    }

    pub fn model(&self) -> &UserModel<I> {
        &self.model
    }

    /// Applies a local edit and sends the command it produced, if any.
    pub async fn perform<F>(&mut self, edit: F) -> Option<Request>
    where
        F: FnOnce(&mut UserModel<I>) -> Option<Request>,
    {
        let request = edit(&mut self.model);
        self.pending.extend(self.model.take_events());

        let request = request?;
        self.manager.dispatch(request.clone(), &self.inputs).await;
        Some(request)
    }

    /// Like [`Session::perform`], then waits for the command to complete.
    ///
    /// Other input arriving meanwhile is applied as usual.
    pub async fn call<F>(&mut self, edit: F) -> Option<Reply>
    where
        F: FnOnce(&mut UserModel<I>) -> Option<Request>,
    {
        let request = self.perform(edit).await?;
        loop {
            let input = self.receiver.recv().await?;
            let answer = match &input {
                Input::Reply(reply) if reply.answers(&request) => Some(reply.clone()),
                _ => None,
            };
            self.handle(input).await;
            if answer.is_some() {
                return answer;
            }
        }
    }

    /// Waits for the next change notification of the model.
    pub async fn next_event(&mut self) -> Option<ModelEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let input = self.receiver.recv().await?;
            self.handle(input).await;
        }
    }

    async fn handle(&mut self, input: Input) {
        match input {
            Input::Presence(Presence::Registered) => {
                if let Err(err) = self.manager.create_interface(&self.inputs).await {
                    tracing::warn!(%err, "creating interface to user manager failed");
                }
            }
            Input::Presence(Presence::Unregistered) => self.manager.destroy_interface(),
            Input::Reply(reply) => self.model.apply_reply(reply),
            Input::Signal(signal) => self.model.apply_signal(signal),
        }
        self.pending.extend(self.model.take_events());
    }
}

impl<I: Identity> Drop for Session<I> {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
