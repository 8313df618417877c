mod memory;
pub mod r#trait;

pub use memory::MemoryCredentialStore;
pub use r#trait::CredentialStore;
