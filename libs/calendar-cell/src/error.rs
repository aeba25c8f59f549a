use thiserror::Error;

/// The calendar layer's only failure mode visible to callers.
///
/// Every caller (the tool dispatcher, the simulated call driver, the
/// confirm-slot surface) must treat this as "unknown" and refuse to book or
/// propose the slot — never assume free.
#[derive(Error, Debug, Clone)]
#[error("calendar unavailable: {0}")]
pub struct CalendarUnavailable(pub String);

impl CalendarUnavailable {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
