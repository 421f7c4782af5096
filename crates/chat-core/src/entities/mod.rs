//! Domain entities - the records the relay persists and broadcasts

mod record;
mod user;

pub use record::{ChatRecord, VisitRecord, VISIT_TIME_FORMAT};
pub use user::UserProfile;
