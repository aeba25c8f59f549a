use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use swarm_domain::{CallOutcome, CallResult, SlotOffer};
use voice_tools_cell::{dispatch_tool, extract_offers, ToolContext};

use crate::message::{AgentEvent, Speaker, ToolResult};

const TRANSCRIPT_TAIL: usize = 10;
const TRANSCRIPT_SNIPPET_CHARS: usize = 500;

/// Bridges one call's conversational-agent session to the rest of the core.
///
/// A `MediaBridge` owns the only in-scope half of spec.md §4.8: receiving
/// named tool invocations and transcript fragments, dispatching tools to
/// `voice-tools-cell`, and deriving + recording the call's outcome exactly
/// once. The audio transport that produces `AgentEvent`s is out of scope
/// (spec.md §1) and is represented here only as an `mpsc::Receiver`.
#[async_trait]
pub trait MediaBridge: Send + Sync {
    /// Drains `events` to completion, dispatching tool calls against `ctx`
    /// and writing any `ToolResult`s onto `tool_results` for the (out of
    /// scope) transport to relay back to the agent. Always calls
    /// `ctx.store.complete_call(call_id, ..)` exactly once before returning,
    /// whether the session ended cleanly, errored, or the channel closed.
    async fn run(
        &self,
        call_id: &str,
        ctx: ToolContext,
        events: mpsc::Receiver<AgentEvent>,
        tool_results: mpsc::Sender<ToolResult>,
    );
}

/// Reference implementation driving an abstract in-process message stream —
/// the shape a real Twilio/ElevenLabs WebSocket adapter would feed, minus
/// the audio frames themselves.
pub struct InProcessMediaBridge;

#[async_trait]
impl MediaBridge for InProcessMediaBridge {
    async fn run(
        &self,
        call_id: &str,
        ctx: ToolContext,
        mut events: mpsc::Receiver<AgentEvent>,
        tool_results: mpsc::Sender<ToolResult>,
    ) {
        let mut transcript: Vec<String> = Vec::new();
        let mut offers: Vec<SlotOffer> = Vec::new();
        let mut session_error = false;

        while let Some(event) = events.recv().await {
            match event {
                AgentEvent::Transcript { speaker, text } => {
                    transcript.push(format!("{}: {}", speaker.label(), text));
                }
                AgentEvent::ToolCall {
                    tool_call_id,
                    tool_name,
                    params,
                } => {
                    tracing::info!(
                        call_id,
                        tool = %tool_name,
                        tool_call_id = %tool_call_id,
                        "dispatching agent tool call"
                    );
                    let (result, is_error) = dispatch_tool(&tool_name, params.clone(), &ctx).await;

                    if tool_name == "log_event" && !is_error {
                        extract_offers(&params, &ctx.provider_id, &mut offers);
                    }

                    let _ = tool_results
                        .send(ToolResult {
                            tool_call_id,
                            result,
                            is_error,
                        })
                        .await;
                }
                AgentEvent::SessionEnded => break,
                AgentEvent::Error(message) => {
                    tracing::warn!(call_id, "media bridge session error: {}", message);
                    session_error = true;
                    break;
                }
            }
        }

        let outcome = if session_error && offers.is_empty() {
            CallOutcome::Failed
        } else if !offers.is_empty() {
            CallOutcome::Success
        } else {
            CallOutcome::CompletedNoMatch
        };

        if transcript.len() > TRANSCRIPT_TAIL {
            let drop = transcript.len() - TRANSCRIPT_TAIL;
            transcript.drain(0..drop);
        }
        let joined = transcript.join("\n");
        let snippet: String = joined.chars().take(TRANSCRIPT_SNIPPET_CHARS).collect();

        let result = CallResult {
            provider_id: ctx.provider_id.clone(),
            call_sid: call_id.to_string(),
            outcome,
            offers,
            transcript_snippet: snippet,
            notes: format!("Call completed at {}", Utc::now().to_rfc3339()),
        };

        tracing::info!(
            call_id,
            outcome = result.outcome.as_str(),
            offers = result.offers.len(),
            "media stream finalized"
        );

        // Idempotent: a call with no mapping in the store (e.g. the
        // simulated driver never registers one) is a silent no-op.
        ctx.store.complete_call(call_id, result).await;
    }
}
