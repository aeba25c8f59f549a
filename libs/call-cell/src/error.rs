use thiserror::Error;

#[derive(Error, Debug, Clone)]
#[error("call setup failed: {0}")]
pub struct CallError(pub String);

impl CallError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
