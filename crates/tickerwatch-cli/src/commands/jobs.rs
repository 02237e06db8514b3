use tickerwatch_core::PipelineTrigger;

use crate::cli::NotifyArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn notify(
    args: &NotifyArgs,
    trigger: &dyn PipelineTrigger,
) -> Result<CommandResult, CliError> {
    let response = trigger.send_test_notification(&args.message).await?;
    tracing::info!("test notification requested");
    Ok(CommandResult::ok(
        "notify",
        serde_json::json!({ "message": args.message, "response": response }),
    ))
}

pub async fn pull(trigger: &dyn PipelineTrigger) -> Result<CommandResult, CliError> {
    let response = trigger.pull_market_data().await?;
    tracing::info!("market data pull-down requested");
    Ok(CommandResult::ok("pull", serde_json::json!({ "response": response })))
}
