use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider search failed: {0}")]
    SearchFailed(String),
}
