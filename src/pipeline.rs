use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::{ChatStore, Message, StoreError, ThreadId};
use crate::completion::{CompletionClient, CompletionError, WireMessage};
use crate::notify::{Notification, Notifications};

/// Whether a request is currently in flight
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending { thread_id: ThreadId },
}

impl SendState {
    pub fn is_sending(&self) -> bool {
        matches!(self, SendState::Sending { .. })
    }
}

/// How the most recent send ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Succeeded,
    Failed,
}

/// A request ready to go out, bound to the thread it was sent from
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub thread_id: ThreadId,
    pub history: Vec<WireMessage>,
}

#[derive(Debug)]
pub struct SendOutcome {
    pub thread_id: ThreadId,
    pub result: Result<String, CompletionError>,
}

/// Record the user's message and prepare the request.
///
/// Returns `None` without touching anything when the input is blank or a
/// send is already in flight. With no thread selected a new one is created.
pub fn begin(store: &mut ChatStore, state: &mut SendState, input: &str) -> Option<PendingSend> {
    if input.trim().is_empty() || state.is_sending() {
        return None;
    }

    let thread_id = match store.selected_id() {
        Some(id) => id.to_string(),
        None => store.create_thread(),
    };

    store.append_message(&thread_id, Message::user(input)).ok()?;

    let history: Vec<WireMessage> = store
        .thread(&thread_id)?
        .messages()
        .iter()
        .map(WireMessage::from)
        .collect();

    info!(thread = %thread_id, messages = history.len(), "sending conversation");
    *state = SendState::Sending {
        thread_id: thread_id.clone(),
    };

    Some(PendingSend { thread_id, history })
}

/// Perform the network call for a pending send
pub async fn execute(client: &dyn CompletionClient, pending: PendingSend) -> SendOutcome {
    let result = client.complete(&pending.history).await;
    SendOutcome {
        thread_id: pending.thread_id,
        result,
    }
}

/// Run the send on its own task and deliver the outcome over `tx`
pub fn spawn(
    client: Arc<dyn CompletionClient>,
    pending: PendingSend,
    tx: UnboundedSender<SendOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = execute(client.as_ref(), pending).await;
        if tx.send(outcome).is_err() {
            debug!("send outcome dropped: receiver closed");
        }
    })
}

/// Apply a finished send to the thread it came from and return to idle
pub fn finish(
    store: &mut ChatStore,
    state: &mut SendState,
    notifications: &mut Notifications,
    outcome: SendOutcome,
) -> SendStatus {
    *state = SendState::Idle;

    match outcome.result {
        Ok(reply) => {
            let reply = Message::assistant(reply);
            let message_id = reply.id().to_string();
            match store.append_message(&outcome.thread_id, reply) {
                Ok(()) => {
                    info!(thread = %outcome.thread_id, message = %message_id, "assistant reply appended")
                }
                Err(StoreError::ThreadNotFound(id)) => {
                    debug!(thread = %id, "reply dropped: thread no longer exists")
                }
            }
            SendStatus::Succeeded
        }
        Err(err) => {
            warn!(thread = %outcome.thread_id, error = %err, "send failed");
            notifications.push(Notification::error("Error", err.user_message()));
            SendStatus::Failed
        }
    }
}
