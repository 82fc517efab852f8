//! Event handler glue

use crate::error::ResizeError;
use crate::invoker::Invoker;
use crate::request::{DelegateEnv, ResizeEvent, ResizeRequest};

/// Handle one resize event.
///
/// Returns the base64-encoded image, or the failure that stopped it.
pub async fn handle(
    event: ResizeEvent,
    env: &DelegateEnv,
    invoker: &Invoker,
) -> Result<String, ResizeError> {
    let request = ResizeRequest::from_event(event, env)?;
    invoker.resize(&request).await
}
