//! Sequential execution of a command's extends chain and its own action.
//!
//! Extensions run strictly in declaration order, each awaited to completion
//! before the next starts. Whatever an extension resolves with is merged into
//! the shared input's pipe result, so the owning action, which always runs
//! last, sees the union of every result. The first failure stops the chain.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use crate::args::{CommandArgs, PipeResult};
use crate::command::{Command, Extension};
use crate::error::ActionError;

/// Runs `command` with its extends chain in front and returns what its own
/// action resolved with.
pub(crate) async fn invoke(
    command: &Command,
    mut input: CommandArgs,
) -> Result<PipeResult, ActionError> {
    invoke_shared(command, &mut input).await
}

/// Recursive step sharing one input across nested extends chains.
fn invoke_shared<'a>(
    command: &'a Command,
    input: &'a mut CommandArgs,
) -> BoxFuture<'a, Result<PipeResult, ActionError>> {
    async move {
        invoke_each(command, command.extensions(), input).await?;
        run_action(command, input).await
    }
    .boxed()
}

async fn invoke_each(
    owner: &Command,
    extensions: &[Extension],
    input: &mut CommandArgs,
) -> Result<(), ActionError> {
    for (cursor, extension) in extensions.iter().enumerate() {
        extension.apply_override(input);
        debug!(
            command = %owner.name(),
            extension = %extension.command().name(),
            cursor,
            "Invoking extension"
        );
        match invoke_shared(extension.command(), input).await {
            Ok(result) => input.absorb(result),
            Err(err) => {
                debug!(
                    command = %owner.name(),
                    extension = %extension.command().name(),
                    error = %err,
                    "Extension rejected, stopping chain"
                );
                return Err(err);
            }
        }
    }
    Ok(())
}

async fn run_action(command: &Command, input: &CommandArgs) -> Result<PipeResult, ActionError> {
    let Some(action) = command.action().map(Arc::clone) else {
        return Err(ActionError::msg(format!(
            "command '{}' has no action",
            command.name()
        )));
    };
    let snapshot = input.clone();
    AssertUnwindSafe(async move { action(snapshot).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ActionError::Panicked(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
