//! AI request lifecycle of the editor.
//!
//! Requests go through two phases so hosts with their own async runtime can
//! do the network part themselves: [`Editor::begin_ai_request`] builds the
//! request and raises the loading flag, [`Editor::complete_ai_request`] folds
//! the outcome back in and lowers it. [`Editor::run_ai_request`] does both
//! synchronously over an [`AiTransport`].

use super::Editor;
use crate::ai::{
    apply_failure, apply_response, build_request, fetch_model_result, AiError, AiRequest,
    AiTransport, AiTrigger, RequestContext, TaskStatusResponse,
};
use crate::error::EditorResult;

impl Editor {
    fn request_context(&self) -> RequestContext {
        let basics = self.object_basics();
        RequestContext {
            natural: self.store.natural_size(),
            client: self.store.client_size(),
            label_id: basics.label_id,
            color: basics.color,
            visual_prompt_threshold: self.config.ai.visual_prompt_threshold,
        }
    }

    /// Build the request for `trigger` and mark the editor as loading.
    ///
    /// Returns `Ok(None)` while another request is in flight. A request that
    /// cannot be built clears the prompt being drawn and returns the error.
    pub fn begin_ai_request(&mut self, trigger: AiTrigger) -> Result<Option<AiRequest>, AiError> {
        if self.edit.is_requiring {
            log::debug!("🤖 AI: busy, ignoring {} request", trigger.model.wire_id());
            return Ok(None);
        }
        let context = self.request_context();
        match build_request(trigger, self.store.data(), &self.image_source, &context) {
            Ok(request) => {
                self.edit.is_requiring = true;
                log::debug!(
                    "🤖 AI: {} request with {} prompts",
                    request.model().wire_id(),
                    request.body.prompts.len()
                );
                Ok(Some(request))
            }
            Err(e) => {
                let data = self.store.data_mut();
                apply_failure(data);
                data.prompt.active_rect_while_loading = None;
                log::warn!("⚠️ AI request not sent: {}", e);
                Err(e)
            }
        }
    }

    /// Fold the outcome of a request into the state and clear the loading flag.
    ///
    /// Returns whether the state changed. Committed objects are never touched
    /// by a failure.
    pub fn complete_ai_request(
        &mut self,
        request: &AiRequest,
        result: Result<TaskStatusResponse, AiError>,
    ) -> EditorResult<bool> {
        self.edit.is_requiring = false;
        let natural = self.store.natural_size();
        let client = self.store.client_size();
        let data = self.store.data_mut();
        data.prompt.active_rect_while_loading = None;

        let outcome = result.and_then(|response| apply_response(data, request, &response, natural, client));
        match outcome {
            Ok(changed) => {
                if changed {
                    self.store.push_history();
                }
                log::debug!("🤖 AI: {} done, changed = {}", request.model().wire_id(), changed);
                Ok(changed)
            }
            Err(e) => {
                apply_failure(self.store.data_mut());
                log::warn!("⚠️ AI {} failed: {}", request.model().wire_id(), e);
                Err(e.into())
            }
        }
    }

    /// Send `trigger` over `transport` and wait for the result.
    ///
    /// Returns `Ok(false)` without sending while another request is in flight.
    pub fn run_ai_request(
        &mut self,
        transport: &mut dyn AiTransport,
        trigger: AiTrigger,
    ) -> EditorResult<bool> {
        let Some(request) = self.begin_ai_request(trigger)? else {
            return Ok(false);
        };
        let poll = self.config.ai.to_poll_config();
        let result = fetch_model_result(transport, request.model(), &request.body, &poll);
        self.complete_ai_request(&request, result)
    }

    /// Run the request a tool asked for, if any.
    pub fn run_pending_ai(&mut self, transport: &mut dyn AiTransport) -> EditorResult<bool> {
        match self.pending_ai.take() {
            Some(trigger) => self.run_ai_request(transport, trigger),
            None => Ok(false),
        }
    }
}
