//! Booth module - wizard state, UI policy, and session registry

pub mod progress;
pub mod session;
pub mod store;

pub use progress::ProgressCurve;
pub use session::{BoothSession, Gender, Operation, SessionSnapshot, Stage};
pub use store::{SessionStore, SharedSession};
