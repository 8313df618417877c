pub mod client;
pub mod error;

pub use client::HttpTaskService;
pub use error::{TaskHttpError, TaskHttpErrorKind};
