pub mod cache;
pub mod directory;
pub mod error;

pub use cache::ProviderCache;
pub use directory::{DemoProviderDirectory, ProviderDirectory, RemoteProviderDirectory};
pub use error::ProviderError;
