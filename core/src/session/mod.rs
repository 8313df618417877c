//! Authenticated-session state machine.
//!
//! `Uninitialized -> Resolving -> {Authenticated, Anonymous}`, then
//! `Authenticated <-> Anonymous` through logout and login. The session is
//! owned by one [`SessionManager`] and handed to consumers as a clone of the
//! handle; state changes are broadcast as [`SessionEvent`]s.

pub mod manager;
pub mod transitions;
pub mod types;

pub use manager::SessionManager;
pub use transitions::{SessionTransition, TransitionError};
pub use types::{Session, SessionEvent, SessionStatus};
