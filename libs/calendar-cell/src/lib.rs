pub mod error;
pub mod factory;
pub mod interval;
pub mod mock;
pub mod oauth;
pub mod remote;
pub mod service;

pub use error::CalendarUnavailable;
pub use factory::build_calendar_service;
pub use interval::{resolve_tz, FreeWindow};
pub use mock::MockCalendarService;
pub use oauth::UserOAuthCalendarService;
pub use remote::RemoteCalendarService;
pub use service::CalendarService;
