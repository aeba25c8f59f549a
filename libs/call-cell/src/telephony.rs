use async_trait::async_trait;

use crate::error::CallError;

/// Seam for the outbound telephony collaborator (Twilio in the original).
/// Placing the call and bridging its audio is the out-of-scope transport
/// layer; this trait is only the boundary `call-cell` needs to start one
/// and get back a call id to wait on.
#[async_trait]
pub trait TelephonyClient: Send + Sync {
    async fn create_call(
        &self,
        to_phone: &str,
        campaign_id: &str,
        provider_id: &str,
    ) -> Result<String, CallError>;
}

/// Stand-in used whenever no telephony collaborator is configured. Always
/// fails, so a misconfigured "real" call mode degrades to a clean `FAILED`
/// outcome instead of hanging.
pub struct NullTelephonyClient;

#[async_trait]
impl TelephonyClient for NullTelephonyClient {
    async fn create_call(
        &self,
        _to_phone: &str,
        _campaign_id: &str,
        _provider_id: &str,
    ) -> Result<String, CallError> {
        Err(CallError::new("no telephony collaborator configured"))
    }
}
