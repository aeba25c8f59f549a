pub mod call_mode;
pub mod error;
pub mod manager;
pub mod progress;

pub use call_mode::{generate_confirmation_ref, resolve_call_mode};
pub use error::ConfirmError;
pub use manager::SwarmManager;
pub use progress::ProgressTracker;
