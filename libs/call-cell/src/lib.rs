pub mod booking;
pub mod discovery;
pub mod error;
pub mod telephony;

pub use booking::{BookingCallDriver, RealBookingDriver, SimulatedBookingDriver};
pub use discovery::{DiscoveryCallDriver, RealDiscoveryDriver, SimulatedDiscoveryDriver};
pub use error::CallError;
pub use telephony::{NullTelephonyClient, TelephonyClient};
