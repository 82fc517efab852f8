//! Lambda runtime integration

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use resizer_invoker::{handle, DelegateEnv, Invoker, ResizeEvent};
use tracing::{error, info, info_span, Instrument};

/// Run the Lambda runtime loop until the runtime shuts us down
pub async fn serve(invoker: Invoker) -> Result<(), Error> {
    info!(binary = %invoker.config().binary.display(), "Starting resize function");

    let invoker = &invoker;
    run(service_fn(move |event| function_handler(event, invoker))).await
}

async fn function_handler(
    event: LambdaEvent<ResizeEvent>,
    invoker: &Invoker,
) -> Result<String, Error> {
    let (event, context) = event.into_parts();
    let span = info_span!("invocation", request_id = %context.request_id);

    async move {
        // Read on every invocation, never cached
        let env = DelegateEnv::from_process_env()?;

        handle(event, &env, invoker).await.map_err(|e| {
            error!(kind = e.kind(), exit_code = ?e.exit_code(), error = %e, "Resize failed");
            Error::from(e)
        })
    }
    .instrument(span)
    .await
}
