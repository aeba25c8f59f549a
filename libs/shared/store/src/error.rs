use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("campaign {0} not found")]
    CampaignNotFound(String),

    #[error("invalid campaign transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: swarm_domain::CampaignStatus,
        to: swarm_domain::CampaignStatus,
    },

    #[error("call {0} not found")]
    CallNotFound(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}
