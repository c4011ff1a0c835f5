use crate::state::messages::{ChatCommand, ChatEvent};
use futures_util::StreamExt;
use hub_api::client::HubApi;
use hub_api::{ChatMessage, Collection, validate_chat_body};
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::mpsc;

/// Keeps the live chat subscription open and performs sends and deletes.
///
/// Snapshots arrive through the same poll-based live query the rest of the
/// dashboard uses; a send or delete shows up in the next snapshot.
pub struct ChatWorker {
    pub api: HubApi,
    pub every: Duration,
    pub author: String,
    pub uid: String,
    pub commands: mpsc::Receiver<ChatCommand>,
    pub events: mpsc::Sender<ChatEvent>,
}

impl ChatWorker {
    pub async fn run(mut self) {
        let mut feed = Box::pin(self.api.subscribe::<ChatMessage>(Collection::LiveChat, self.every));
        loop {
            tokio::select! {
                maybe_cmd = self.commands.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        return;
                    };
                    let event = match cmd {
                        ChatCommand::Identify { token, author, uid } => {
                            debug!("chat identity is now {author}");
                            self.api = self.api.clone().with_id_token(token);
                            self.author = author;
                            self.uid = uid;
                            feed = Box::pin(self.api.subscribe::<ChatMessage>(Collection::LiveChat, self.every));
                            continue;
                        }
                        ChatCommand::Send { body } => self.send(body).await,
                        ChatCommand::Delete { message_id } => self.delete(message_id).await,
                    };
                    if self.events.send(event).await.is_err() {
                        return;
                    }
                }
                snapshot = feed.next() => {
                    let event = match snapshot {
                        Some(Ok(messages)) => ChatEvent::Snapshot(messages),
                        Some(Err(e)) => {
                            warn!("chat feed: {e}");
                            ChatEvent::Error(format!("chat feed failed: {e}"))
                        }
                        None => return,
                    };
                    if self.events.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    async fn send(&self, body: String) -> ChatEvent {
        let body = match validate_chat_body(&body) {
            Ok(body) => body,
            Err(reason) => return ChatEvent::Error(reason),
        };
        match self.api.send_chat_message(&self.author, &self.uid, &body).await {
            Ok(id) => {
                debug!("chat message {id} sent");
                ChatEvent::Sent
            }
            Err(e) => ChatEvent::Error(format!("chat send failed: {e}")),
        }
    }

    async fn delete(&self, message_id: String) -> ChatEvent {
        match self.api.delete_chat_message(&message_id).await {
            Ok(()) => ChatEvent::Deleted { message_id },
            Err(e) => ChatEvent::Error(format!("chat delete failed: {e}")),
        }
    }
}
