pub mod partner;
pub mod screen;
pub mod session;

pub use partner::{normalize_prices, Partner, Price, ProfilePatch, Status, SubType};
pub use screen::{Credential, Screen};
pub use session::{Session, SessionEvent, SessionEventKind};
