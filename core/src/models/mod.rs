mod payloads;
mod stats;
mod task;
mod user;

pub use payloads::{
    AuthResponse, ChangePasswordPayload, ChangePasswordResponse, LoginPayload, ProfileUpdate,
    RegisterPayload, StatsEnvelope, TaskEnvelope, TaskListEnvelope, UserEnvelope,
};
pub use stats::StatsSnapshot;
pub use task::{ParseEnumError, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};
pub use user::UserProfile;
