pub mod error;
pub mod persistence;
pub mod signal;
pub mod store;

pub use error::*;
pub use persistence::*;
pub use signal::*;
pub use store::*;
