//! Shared utilities for use cases.
//!
//! Cancellation checking and usage-tracked generation, used by both the
//! panel orchestrator and the consensus engine.

use crate::ports::llm_gateway::{GatewayError, GenerationRequest, LlmGateway};
use crate::ports::usage::UsageTracker;
use crate::use_cases::run_panel::RunPanelError;
use panel_domain::SessionId;
use tokio_util::sync::CancellationToken;

/// Returns `Err(RunPanelError::Cancelled)` once the session's token is cancelled.
pub(crate) fn check_cancelled(
    token: &CancellationToken,
    session_id: &SessionId,
) -> Result<(), RunPanelError> {
    if token.is_cancelled() {
        return Err(RunPanelError::Cancelled(session_id.clone()));
    }
    Ok(())
}

/// Generate a reply and report the call to the usage tracker.
pub(crate) async fn generate_tracked<G: LlmGateway + ?Sized>(
    gateway: &G,
    usage: &dyn UsageTracker,
    purpose: &str,
    request: &GenerationRequest,
) -> Result<String, GatewayError> {
    let reply = gateway.generate(request).await?;
    usage.record(purpose, request.prompt_chars(), reply.chars().count());
    Ok(reply)
}
