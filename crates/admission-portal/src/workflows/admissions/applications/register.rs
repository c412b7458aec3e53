use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::domain::RegisterNumber;
use super::store::{ApplicationStore, StoreError};

/// Quiet period after the last keystroke before the store is queried.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(800);

pub const REGISTER_NUMBER_TAKEN: &str = "This register number is already in use.";
pub const REGISTER_CHECK_FAILED: &str = "Error checking register number. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterAvailability {
    Available,
    Taken,
}

/// Exact case-insensitive lookup. Store failures propagate so callers fail closed.
pub fn check_availability<S>(
    store: &S,
    register_number: &RegisterNumber,
) -> Result<RegisterAvailability, StoreError>
where
    S: ApplicationStore + ?Sized,
{
    Ok(match store.find_by_register_number(register_number)? {
        Some(_) => RegisterAvailability::Taken,
        None => RegisterAvailability::Available,
    })
}

/// What the form shows next to the register number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterCheckState {
    #[default]
    Idle,
    Checking,
    Available,
    Taken,
    Failed,
}

impl RegisterCheckState {
    pub const fn blocks_submission(self) -> bool {
        matches!(self, Self::Checking | Self::Taken | Self::Failed)
    }

    pub const fn message(self) -> Option<&'static str> {
        match self {
            Self::Taken => Some(REGISTER_NUMBER_TAKEN),
            Self::Failed => Some(REGISTER_CHECK_FAILED),
            Self::Idle | Self::Checking | Self::Available => None,
        }
    }

    /// True once a check has finished or input went blank.
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Checking)
    }

    fn from_outcome(outcome: Result<RegisterAvailability, StoreError>) -> Self {
        match outcome {
            Ok(RegisterAvailability::Available) => Self::Available,
            Ok(RegisterAvailability::Taken) => Self::Taken,
            Err(error) => {
                warn!(%error, "register number check failed");
                Self::Failed
            }
        }
    }
}

/// Debounced background checker fed with raw field values.
///
/// Each new value restarts the quiet period. Only the value still current when
/// the period elapses is looked up. Dropping the debouncer stops its task.
pub struct RegisterNumberDebouncer {
    input: mpsc::UnboundedSender<String>,
    state: watch::Receiver<RegisterCheckState>,
    task: JoinHandle<()>,
}

impl RegisterNumberDebouncer {
    pub fn spawn<S>(store: Arc<S>, delay: Duration) -> Self
    where
        S: ApplicationStore + 'static,
    {
        let (input, receiver) = mpsc::unbounded_channel();
        let (publisher, state) = watch::channel(RegisterCheckState::Idle);
        let task = tokio::spawn(run_debouncer(store, delay, receiver, publisher));
        Self { input, state, task }
    }

    /// Feeds the latest raw field value.
    pub fn input(&self, raw: impl Into<String>) {
        if self.input.send(raw.into()).is_err() {
            debug!("register number debouncer already stopped");
        }
    }

    pub fn current(&self) -> RegisterCheckState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegisterCheckState> {
        self.state.clone()
    }
}

impl Drop for RegisterNumberDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_debouncer<S>(
    store: Arc<S>,
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<String>,
    publisher: watch::Sender<RegisterCheckState>,
) where
    S: ApplicationStore + 'static,
{
    let mut pending: Option<RegisterNumber> = None;

    loop {
        let received = if pending.is_some() {
            tokio::select! {
                received = input.recv() => received,
                _ = tokio::time::sleep(delay) => {
                    if let Some(register_number) = pending.take() {
                        let outcome = check_availability(store.as_ref(), &register_number);
                        publisher.send_replace(RegisterCheckState::from_outcome(outcome));
                    }
                    continue;
                }
            }
        } else {
            input.recv().await
        };

        let Some(raw) = received else {
            break;
        };

        match RegisterNumber::normalize(&raw) {
            Some(register_number) => {
                pending = Some(register_number);
                publisher.send_replace(RegisterCheckState::Checking);
            }
            None => {
                pending = None;
                publisher.send_replace(RegisterCheckState::Idle);
            }
        }
    }
}
