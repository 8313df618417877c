//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskdeck_core::api` instead of reaching into internal modules.

pub use crate::cache::{
    CacheEvent, DeleteOutcome, ReloadOutcome, TaskCacheController, DELETE_CONFIRMATION,
};
pub use crate::config::{
    load_default, ApiConfig, AppConfig, CredentialsConfig, LoggingConfig, SyncConfig,
};
pub use crate::confirm::{ConfirmPrompt, StaticConfirm};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::credentials::{CredentialStore, MemoryCredentialStore};
pub use crate::error::{CliError, ErrorCode, FieldErrors, ServiceError};
pub use crate::models::{
    AuthResponse, ChangePasswordPayload, ChangePasswordResponse, LoginPayload, ProfileUpdate,
    RegisterPayload, StatsSnapshot, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus,
    UserProfile,
};
pub use crate::notify::{BroadcastNotifier, Notice, NoticeLevel, Notifier, NoopNotifier};
pub use crate::query::{QueryState, SortField, SortOrder};
pub use crate::remote::TaskService;
pub use crate::session::{Session, SessionEvent, SessionManager, SessionStatus};
pub use crate::stats::{RefreshOutcome, StatsAggregator};
pub use crate::validation::{
    ensure_valid, validate_login, validate_password_change, validate_profile,
    validate_registration, validate_task_draft, validate_task_patch,
};
