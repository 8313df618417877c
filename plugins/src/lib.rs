pub mod credentials;
pub mod factory;
pub mod http;
pub mod notify;
pub mod prompt;
