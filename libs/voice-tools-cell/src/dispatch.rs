use futures::FutureExt;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::handlers;

async fn run_tool(tool_name: &str, params: &Value, ctx: &ToolContext) -> Option<Value> {
    match tool_name {
        "calendar_check" => Some(handlers::calendar_check(params, ctx).await),
        "validate_slot" => Some(handlers::validate_slot(params, ctx).await),
        "available_slots" => Some(handlers::available_slots(params, ctx).await),
        "distance_check" => Some(handlers::distance_check(params, ctx).await),
        "log_event" => Some(handlers::log_event(params, ctx).await),
        "provider_lookup" => Some(handlers::provider_lookup(params, ctx).await),
        "propose_alternatives" => Some(handlers::propose_alternatives(params, ctx).await),
        _ => None,
    }
}

/// Routes a named tool call to its handler and returns `(payload, is_error)`.
///
/// An unknown tool name or a handler panic both become an error payload
/// rather than propagating — the agent runtime always gets a result back.
pub async fn dispatch_tool(tool_name: &str, params: Value, ctx: &ToolContext) -> (Value, bool) {
    let outcome = std::panic::AssertUnwindSafe(run_tool(tool_name, &params, ctx))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Some(value)) => (value, false),
        Ok(None) => {
            tracing::warn!("unknown tool called: {tool_name}");
            (json!({"error": format!("Unknown tool: {tool_name}")}), true)
        }
        Err(_) => {
            tracing::error!("tool {tool_name} panicked");
            (
                json!({"error": format!("Tool {tool_name} encountered an error")}),
                true,
            )
        }
    }
}
