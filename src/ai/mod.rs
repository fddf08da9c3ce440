//! AI-assisted annotation: the model service contract, task polling and the
//! translation between editor state and model requests/results.

pub mod client;
pub mod contract;
mod error;
pub mod orchestrator;

pub use client::{error_for_http_status, fetch_model_result, poll_task, AiTransport, PollConfig};
pub use contract::{ModelRequest, SegmentEverythingParams, TaskStatus, TaskStatusResponse};
pub use error::AiError;
pub use orchestrator::{
    apply_failure, apply_response, build_request, AiRequest, AiTrigger, ImageSource, RequestContext,
};
