//! Task submission and status polling against the model service.
//!
//! The service is asynchronous: a submission returns a task id, and the
//! result is fetched by polling the task status at a fixed interval.

use web_time::Duration;

use super::contract::{ModelRequest, TaskStatus, TaskStatusResponse};
use super::error::AiError;
use crate::constants::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::model::ModelKind;

/// HTTP status used by the service for rate limiting.
pub const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// Host-provided connection to the model service.
pub trait AiTransport {
    /// Submit a task for `model` and return its task id.
    fn submit(&mut self, model: ModelKind, body: &ModelRequest) -> Result<String, AiError>;

    /// Fetch the current status of a task.
    fn fetch_status(&mut self, task_uuid: &str) -> Result<TaskStatusResponse, AiError>;

    /// Wait between polls.
    ///
    /// Blocks the thread on native targets. On wasm32 the default returns at
    /// once, since the browser thread cannot block; web hosts drive requests
    /// through `Editor::begin_ai_request` and `Editor::complete_ai_request`.
    fn sleep(&mut self, duration: Duration) {
        #[cfg(not(target_arch = "wasm32"))]
        std::thread::sleep(duration);
        #[cfg(target_arch = "wasm32")]
        let _ = duration;
    }
}

/// Map a non-success HTTP status to an error.
pub fn error_for_http_status(status: u16, message: impl Into<String>) -> AiError {
    if status == HTTP_TOO_MANY_REQUESTS {
        AiError::RateLimited
    } else {
        AiError::transport(format!("HTTP {}: {}", status, message.into()))
    }
}

/// Polling budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

/// Poll `task_uuid` until it succeeds, fails or the budget runs out.
pub fn poll_task(
    transport: &mut dyn AiTransport,
    task_uuid: &str,
    config: &PollConfig,
) -> Result<TaskStatusResponse, AiError> {
    let mut attempts = 0;
    while attempts < config.max_poll_attempts {
        let response = transport.fetch_status(task_uuid)?;
        match response.status {
            TaskStatus::Success => return Ok(response),
            TaskStatus::Failed => {
                return Err(AiError::TaskFailed(response.error.unwrap_or_default()));
            }
            TaskStatus::Waiting | TaskStatus::Running => {}
        }
        transport.sleep(config.poll_interval);
        attempts += 1;
    }
    Err(AiError::Timeout { attempts })
}

/// Submit a request and wait for its result.
pub fn fetch_model_result(
    transport: &mut dyn AiTransport,
    model: ModelKind,
    body: &ModelRequest,
    config: &PollConfig,
) -> Result<TaskStatusResponse, AiError> {
    let task_uuid = transport.submit(model, body)?;
    log::debug!("🤖 AI: submitted {} task {}", model.wire_id(), task_uuid);
    poll_task(transport, &task_uuid, config)
}
