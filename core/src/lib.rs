pub mod api;
pub mod cache;
pub mod config;
pub mod confirm;
pub mod context;
pub mod credentials;
pub mod error;
pub mod models;
pub mod notify;
pub mod query;
pub mod remote;
pub mod session;
pub mod stats;
pub mod validation;
