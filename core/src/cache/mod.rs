//! Local mirror of the task list for the current query.

pub mod controller;
pub mod debounce;
pub mod locks;
pub mod types;

pub use controller::{TaskCacheController, DELETE_CONFIRMATION};
pub use debounce::Debouncer;
pub use locks::KeyedLocks;
pub use types::{CacheEvent, DeleteOutcome, ReloadOutcome};
