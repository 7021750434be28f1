//! The response broker: one-shot reply channel and background continuations.
//!
//! Each invocation gets a [`Responder`] bound to a single-assignment slot.
//! The first reply operation the runner calls fills the slot, and the
//! webhook returns that response immediately. The runner itself keeps
//! running on a tracked background task after that point, so it can edit or
//! follow up on the already-answered turn.
//!
//! Continuations cannot be cancelled and are not ordered relative to each
//! other. A runner failure before the slot is filled becomes the response
//! (`CoreError::Handler`); a failure afterwards is only logged.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::command::Runner;
use crate::error::CoreError;
use crate::interaction::InteractionKind;
use crate::invocation::Invocation;
use crate::response::{Choice, InteractionResponse, MAX_CHOICES, Message, Modal};

type Outcome = Result<InteractionResponse, CoreError>;

/// Single-assignment slot backing one pending response.
#[derive(Debug, Clone)]
struct ResponseSlot {
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl ResponseSlot {
    fn new() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let slot = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (slot, rx)
    }

    fn take(&self) -> Option<oneshot::Sender<Outcome>> {
        self.sender
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }

    /// Fills the slot. Returns `false` if it was already filled.
    fn fill(&self, outcome: Outcome) -> bool {
        match self.take() {
            Some(tx) => {
                // The receiver is gone only if the HTTP caller went away.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Closes the slot without a response. Returns `false` if already filled.
    fn close(&self) -> bool {
        self.take().is_some()
    }

    fn is_filled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_none()
    }
}

/// Reply operations for one pending interaction response.
///
/// Only the first successful call has any effect; later calls are logged
/// and ignored. Calls that are not legal for the interaction kind (e.g. a
/// modal in answer to autocomplete) fail with `CoreError::ReplyNotAllowed`
/// whether or not the response was already sent.
#[derive(Debug, Clone)]
pub struct Responder {
    slot: ResponseSlot,
    kind: InteractionKind,
}

impl Responder {
    /// Replies with a new message.
    ///
    /// # Errors
    ///
    /// `CoreError::ReplyNotAllowed` for autocomplete interactions.
    pub fn reply(&self, message: Message) -> Result<(), CoreError> {
        self.send(InteractionResponse::Message(message))
    }

    /// Shows a "thinking" placeholder; fill it in later with
    /// [`FollowUp::edit_original`](crate::FollowUp::edit_original).
    ///
    /// # Errors
    ///
    /// `CoreError::ReplyNotAllowed` for autocomplete interactions.
    pub fn defer(&self, ephemeral: bool) -> Result<(), CoreError> {
        self.send(InteractionResponse::DeferredMessage { ephemeral })
    }

    /// Opens a modal.
    ///
    /// # Errors
    ///
    /// `CoreError::ReplyNotAllowed` for autocomplete and modal-submit interactions.
    pub fn modal(&self, modal: Modal) -> Result<(), CoreError> {
        self.send(InteractionResponse::Modal(modal))
    }

    /// Edits the message the component lives on.
    ///
    /// # Errors
    ///
    /// `CoreError::ReplyNotAllowed` unless answering a component or modal submission.
    pub fn update(&self, message: Message) -> Result<(), CoreError> {
        self.send(InteractionResponse::UpdateMessage(message))
    }

    /// Acknowledges without changing the message yet.
    ///
    /// # Errors
    ///
    /// `CoreError::ReplyNotAllowed` unless answering a component or modal submission.
    pub fn defer_update(&self) -> Result<(), CoreError> {
        self.send(InteractionResponse::DeferredUpdate)
    }

    /// Returns autocomplete suggestions, truncated to the platform maximum.
    ///
    /// # Errors
    ///
    /// `CoreError::ReplyNotAllowed` unless answering an autocomplete request.
    pub fn autocomplete(&self, mut choices: Vec<Choice>) -> Result<(), CoreError> {
        choices.truncate(MAX_CHOICES);
        self.send(InteractionResponse::Autocomplete(choices))
    }

    /// Returns `true` once the response has been sent (or the runner failed
    /// before sending one).
    pub fn is_resolved(&self) -> bool {
        self.slot.is_filled()
    }

    /// The interaction kind this responder answers.
    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    fn send(&self, response: InteractionResponse) -> Result<(), CoreError> {
        let name = response.name();
        if !reply_allowed(self.kind, &response) {
            return Err(CoreError::ReplyNotAllowed {
                reply: name,
                kind: self.kind.as_str(),
            });
        }
        if self.slot.fill(Ok(response)) {
            debug!(reply = name, "Interaction response resolved");
        } else {
            warn!(reply = name, "Interaction already answered, ignoring reply");
        }
        Ok(())
    }
}

/// Which reply kinds each interaction kind may answer with.
fn reply_allowed(kind: InteractionKind, response: &InteractionResponse) -> bool {
    use InteractionResponse as R;
    match kind {
        InteractionKind::Ping => matches!(response, R::Pong),
        InteractionKind::Command => {
            matches!(response, R::Message(_) | R::DeferredMessage { .. } | R::Modal(_))
        }
        InteractionKind::Component => matches!(
            response,
            R::Message(_)
                | R::DeferredMessage { .. }
                | R::Modal(_)
                | R::UpdateMessage(_)
                | R::DeferredUpdate
        ),
        InteractionKind::ModalSubmit => matches!(
            response,
            R::Message(_) | R::DeferredMessage { .. } | R::UpdateMessage(_) | R::DeferredUpdate
        ),
        InteractionKind::Autocomplete => matches!(response, R::Autocomplete(_)),
    }
}

/// The receiving half of a response slot.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Outcome>,
}

impl PendingResponse {
    /// Waits for the first reply, a pre-response failure, or the runner
    /// finishing without replying (`Ok(None)`).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Handler` if the runner failed before replying.
    pub async fn wait(self) -> Result<Option<InteractionResponse>, CoreError> {
        match self.rx.await {
            Ok(Ok(response)) => Ok(Some(response)),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}

/// Runs invocations and tracks their background continuations.
///
/// # Examples
///
/// ```
/// use chime_core::{Broker, InteractionKind, Message};
///
/// # tokio_test_block(async {
/// let broker = Broker::new();
/// let (responder, pending) = broker.open(InteractionKind::Command);
/// responder.reply(Message::text("first")).unwrap();
/// responder.reply(Message::text("second")).unwrap();
/// let response = pending.wait().await.unwrap().unwrap();
/// assert_eq!(response.to_json()["data"]["content"], "first");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Broker {
    tracker: TaskTracker,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the reply operations and pending response for one invocation.
    pub fn open(&self, kind: InteractionKind) -> (Responder, PendingResponse) {
        let (slot, rx) = ResponseSlot::new();
        (Responder { slot, kind }, PendingResponse { rx })
    }

    /// Starts `runner` as a tracked background task and waits only until it
    /// resolves the response.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Handler` if the runner fails or panics before
    /// calling any reply operation.
    pub async fn invoke(
        &self,
        runner: &Runner,
        invocation: Invocation,
        pending: PendingResponse,
    ) -> Result<Option<InteractionResponse>, CoreError> {
        let slot = invocation.respond.slot.clone();
        let command = invocation.command.clone();
        let runner_name = invocation.runner.clone();
        let runner = Arc::clone(runner);

        self.tracker.spawn(async move {
            // The runner is called inside the boundary so a panic while it
            // builds its future is caught too.
            let run = async move { runner(invocation).await };
            let failure = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(format!("{e:#}")),
                Err(panic) => Some(format!("runner panicked: {}", panic_message(&*panic))),
            };

            match failure {
                None => {
                    if slot.close() {
                        warn!(command, runner = runner_name, "Runner finished without responding");
                    }
                }
                Some(message) => {
                    if slot.fill(Err(CoreError::Handler(message.clone()))) {
                        warn!(command, runner = runner_name, error = message, "Runner failed before responding");
                    } else {
                        error!(
                            command,
                            runner = runner_name,
                            error = message,
                            "Continuation failed after response was sent"
                        );
                    }
                }
            }
        });

        pending.wait().await
    }

    /// Number of continuations still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stops accepting new continuations and waits for the running ones.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
