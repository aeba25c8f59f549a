use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::call::CallResult;
use crate::provider::Provider;
use crate::request::AppointmentRequest;
use crate::slot::SlotOffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Running,
    Booking,
    Booked,
    Completed,
    Failed,
}

impl CampaignStatus {
    /// Whether this status is a terminal state the campaign will not leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignStatus::Booked | CampaignStatus::Completed | CampaignStatus::Failed
        )
    }

    /// Legal transitions for the two-phase campaign state machine:
    /// `running -> {completed, failed, booking}`, `booking -> {booked, completed}`.
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        match (self, next) {
            (Running, Running) => true,
            (Running, Completed) | (Running, Failed) | (Running, Booking) => true,
            (Booking, Booking) => true,
            (Booking, Booked) | (Booking, Completed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CampaignProgress {
    #[serde(default)]
    pub total_providers: usize,
    #[serde(default)]
    pub calls_in_progress: usize,
    #[serde(default)]
    pub completed_calls: usize,
    #[serde(default)]
    pub successful_calls: usize,
    #[serde(default)]
    pub failed_calls: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub provider_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub confirmation_ref: String,
    pub confirmed_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_phone: String,
}

/// Full server-side state for one campaign. Mutated only through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: String,
    pub request: AppointmentRequest,
    pub status: CampaignStatus,
    pub progress: CampaignProgress,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub call_results: Vec<CallResult>,
    #[serde(default)]
    pub ranked: Vec<SlotOffer>,
    #[serde(default)]
    pub best: Option<SlotOffer>,
    #[serde(default)]
    pub booking: Option<BookingConfirmation>,
    #[serde(default)]
    pub debug: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(campaign_id: String, request: AppointmentRequest) -> Self {
        Self {
            campaign_id,
            request,
            status: CampaignStatus::Running,
            progress: CampaignProgress::default(),
            providers: Vec::new(),
            call_results: Vec::new(),
            ranked: Vec::new(),
            best: None,
            booking: None,
            debug: HashMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCampaignResponse {
    pub campaign_id: String,
    pub status: CampaignStatus,
    #[serde(default)]
    pub call_mode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResponse {
    pub campaign_id: String,
    pub status: CampaignStatus,
    pub progress: CampaignProgress,
    pub best: Option<SlotOffer>,
    pub ranked: Vec<SlotOffer>,
    pub booking: Option<BookingConfirmation>,
    pub debug: HashMap<String, serde_json::Value>,
}

impl From<&Campaign> for CampaignResponse {
    fn from(campaign: &Campaign) -> Self {
        Self {
            campaign_id: campaign.campaign_id.clone(),
            status: campaign.status,
            progress: campaign.progress,
            best: campaign.best.clone(),
            ranked: campaign.ranked.clone(),
            booking: campaign.booking.clone(),
            debug: campaign.debug.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    pub provider_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub user_contact: UserContact,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmResponse {
    pub campaign_id: String,
    pub confirmed: bool,
    pub confirmation_ref: String,
}
