use serde::{Deserialize, Serialize};

use crate::slot::SlotOffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallOutcome {
    Success,
    NoAnswer,
    Busy,
    Failed,
    NoSlots,
    CompletedNoMatch,
    BookingConfirmed,
    BookingRejected,
}

impl Default for CallOutcome {
    fn default() -> Self {
        CallOutcome::Failed
    }
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "SUCCESS",
            CallOutcome::NoAnswer => "NO_ANSWER",
            CallOutcome::Busy => "BUSY",
            CallOutcome::Failed => "FAILED",
            CallOutcome::NoSlots => "NO_SLOTS",
            CallOutcome::CompletedNoMatch => "COMPLETED_NO_MATCH",
            CallOutcome::BookingConfirmed => "BOOKING_CONFIRMED",
            CallOutcome::BookingRejected => "BOOKING_REJECTED",
        }
    }
}

/// Outcome of a single provider call, produced by whichever call driver ran it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallResult {
    pub provider_id: String,
    #[serde(default)]
    pub call_sid: String,
    pub outcome: CallOutcome,
    #[serde(default)]
    pub offers: Vec<SlotOffer>,
    #[serde(default)]
    pub transcript_snippet: String,
    #[serde(default)]
    pub notes: String,
}
