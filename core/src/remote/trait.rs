use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::{
    AuthResponse, ChangePasswordPayload, ChangePasswordResponse, LoginPayload, ProfileUpdate,
    RegisterPayload, StatsSnapshot, Task, TaskDraft, TaskPatch, UserProfile,
};
use crate::query::QueryState;

/// Remote task service: auth endpoints plus task CRUD and stats.
///
/// Protected calls take the bearer token explicitly; the session manager
/// owns it and decides whether a call may be made at all.
#[async_trait]
pub trait TaskService: Send + Sync {
    fn name(&self) -> &str;

    async fn login(&self, payload: LoginPayload) -> Result<AuthResponse, ServiceError>;
    async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse, ServiceError>;
    async fn me(&self, token: &str) -> Result<UserProfile, ServiceError>;
    async fn update_profile(
        &self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ServiceError>;
    async fn change_password(
        &self,
        token: &str,
        payload: ChangePasswordPayload,
    ) -> Result<ChangePasswordResponse, ServiceError>;

    async fn list_tasks(&self, token: &str, query: &QueryState) -> Result<Vec<Task>, ServiceError>;
    async fn task_stats(&self, token: &str) -> Result<StatsSnapshot, ServiceError>;
    async fn create_task(&self, token: &str, draft: TaskDraft) -> Result<Task, ServiceError>;
    async fn update_task(
        &self,
        token: &str,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError>;
    async fn delete_task(&self, token: &str, id: &str) -> Result<(), ServiceError>;
}
