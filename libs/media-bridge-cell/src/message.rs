use serde_json::Value;

/// Who said a transcript fragment. The original labels these "Agent" (the
/// ElevenLabs voice) and "Receptionist" (the human on the other end, surfaced
/// from ElevenLabs as `user_transcript`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Agent,
    Receptionist,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Agent => "Agent",
            Speaker::Receptionist => "Receptionist",
        }
    }
}

/// One event surfaced from the conversational-agent session, already
/// stripped of audio payloads — raw mu-law/PCM transcoding is the
/// out-of-scope transport layer (spec.md §1). A real transport adapter turns
/// Twilio media frames + ElevenLabs WS messages into this stream; the
/// in-process reference bridge is exercised by feeding it a scripted one.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Transcript {
        speaker: Speaker,
        text: String,
    },
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        params: Value,
    },
    /// The session ended cleanly (the agent hung up / Twilio sent `stop`).
    SessionEnded,
    /// Transport-level failure (WS error, disconnect mid-conversation).
    Error(String),
}

/// A tool's result, addressed back to the conversational agent by
/// `tool_call_id` — mirrors ElevenLabs' `client_tool_result` message.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub result: Value,
    pub is_error: bool,
}
