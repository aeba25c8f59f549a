use thiserror::Error;

/// Failure modes of the confirm-slot surface (spec.md §4.9 / §6). Does not
/// cover `run_campaign`, which never returns to a caller — failures there are
/// folded into the campaign's own status instead.
#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("campaign {0} not found")]
    CampaignNotFound(String),

    #[error("requested slot is not among this campaign's ranked offers")]
    SlotNotRanked,

    #[error("slot is no longer free")]
    SlotConflict,

    #[error("calendar unavailable")]
    CalendarUnavailable,
}
