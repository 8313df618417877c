use async_trait::async_trait;
use serde::de::DeserializeOwned;
use taskdeck_core::api::{
    AuthResponse, ChangePasswordPayload, ChangePasswordResponse, LoginPayload, ProfileUpdate,
    QueryState, RegisterPayload, ServiceError, StatsSnapshot, Task, TaskDraft, TaskPatch,
    TaskService, UserProfile,
};
use taskdeck_core::models::{StatsEnvelope, TaskEnvelope, TaskListEnvelope, UserEnvelope};

use super::error::TaskHttpError;

async fn parse_json_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, TaskHttpError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;

    if !status.is_success() {
        return Err(TaskHttpError::status_error(status.as_u16(), url, &body));
    }

    serde_json::from_str::<T>(&body)
        .map_err(|err| TaskHttpError::decode_error(status.as_u16(), url, err, &body))
}

async fn ensure_success(resp: reqwest::Response) -> Result<(), TaskHttpError> {
    let status = resp.status();
    let url = resp.url().to_string();

    if status.is_success() {
        return Ok(());
    }

    let body = resp
        .text()
        .await
        .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;
    Err(TaskHttpError::status_error(status.as_u16(), url, &body))
}

/// REST client for the task API.
#[derive(Clone)]
pub struct HttpTaskService {
    http: reqwest::Client,
    url_login: String,
    url_register: String,
    url_me: String,
    url_profile: String,
    url_password: String,
    url_tasks: String,
    url_stats: String,
    task_base: reqwest::Url,
}

impl HttpTaskService {
    pub fn new(base_url: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        let normalized = base_url.trim().trim_end_matches('/');
        let task_base = reqwest::Url::parse(&format!("{}/tasks", normalized))?;
        if task_base.cannot_be_a_base() {
            anyhow::bail!("api base url is not hierarchical: {}", base_url);
        }
        Ok(Self {
            http,
            url_login: format!("{}/auth/login", normalized),
            url_register: format!("{}/auth/register", normalized),
            url_me: format!("{}/auth/me", normalized),
            url_profile: format!("{}/auth/profile", normalized),
            url_password: format!("{}/auth/change-password", normalized),
            url_tasks: format!("{}/tasks", normalized),
            url_stats: format!("{}/tasks/stats", normalized),
            task_base,
        })
    }

    /// `/tasks/{id}` with the id percent-encoded as one path segment.
    fn task_url(&self, id: &str) -> String {
        let mut url = self.task_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url.into()
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, TaskHttpError> {
        req.send()
            .await
            .map_err(|err| TaskHttpError::from_reqwest(err, url.to_string()))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
        stage: &'static str,
    ) -> Result<T, ServiceError> {
        let resp = self.send(req, url).await?;
        let status = resp.status();
        let result = parse_json_response::<T>(resp).await;
        match &result {
            Ok(_) => tracing::debug!(target: "taskdeck.http", stage = stage, status = %status),
            Err(err) => tracing::debug!(
                target: "taskdeck.http",
                stage = stage,
                kind = %err.kind(),
                status = ?err.status(),
                error = %err
            ),
        }
        result.map_err(ServiceError::from)
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    fn name(&self) -> &str {
        "http"
    }

    async fn login(&self, payload: LoginPayload) -> Result<AuthResponse, ServiceError> {
        let url = &self.url_login;
        tracing::debug!(target: "taskdeck.http", stage = "http.login.in", url = %url);
        self.fetch(self.http.post(url).json(&payload), url, "http.login.out")
            .await
    }

    async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse, ServiceError> {
        let url = &self.url_register;
        tracing::debug!(
            target: "taskdeck.http",
            stage = "http.register.in",
            url = %url,
            name_len = payload.name.len()
        );
        self.fetch(self.http.post(url).json(&payload), url, "http.register.out")
            .await
    }

    async fn me(&self, token: &str) -> Result<UserProfile, ServiceError> {
        let url = &self.url_me;
        tracing::debug!(target: "taskdeck.http", stage = "http.me.in", url = %url);
        let env: UserEnvelope = self
            .fetch(self.http.get(url).bearer_auth(token), url, "http.me.out")
            .await?;
        Ok(env.user)
    }

    async fn update_profile(
        &self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ServiceError> {
        let url = &self.url_profile;
        tracing::debug!(
            target: "taskdeck.http",
            stage = "http.profile.in",
            url = %url,
            name = update.name.is_some(),
            email = update.email.is_some()
        );
        let req = self.http.put(url).bearer_auth(token).json(&update);
        let env: UserEnvelope = self.fetch(req, url, "http.profile.out").await?;
        Ok(env.user)
    }

    async fn change_password(
        &self,
        token: &str,
        payload: ChangePasswordPayload,
    ) -> Result<ChangePasswordResponse, ServiceError> {
        let url = &self.url_password;
        tracing::debug!(target: "taskdeck.http", stage = "http.password.in", url = %url);
        let req = self.http.put(url).bearer_auth(token).json(&payload);
        let resp = self.send(req, url).await?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| TaskHttpError::from_reqwest(err, url.clone()))?;
        if !status.is_success() {
            return Err(TaskHttpError::status_error(status.as_u16(), url.clone(), &body).into());
        }
        tracing::debug!(target: "taskdeck.http", stage = "http.password.out", status = %status);
        // The rotated token is optional; an empty or non-JSON body means none.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn list_tasks(&self, token: &str, query: &QueryState) -> Result<Vec<Task>, ServiceError> {
        let url = &self.url_tasks;
        let params = query.to_params();
        tracing::debug!(
            target: "taskdeck.http",
            stage = "http.tasks.list.in",
            url = %url,
            params = params.len()
        );
        let req = self.http.get(url).bearer_auth(token).query(&params);
        let env: TaskListEnvelope = self.fetch(req, url, "http.tasks.list.out").await?;
        Ok(env.tasks)
    }

    async fn task_stats(&self, token: &str) -> Result<StatsSnapshot, ServiceError> {
        let url = &self.url_stats;
        tracing::debug!(target: "taskdeck.http", stage = "http.tasks.stats.in", url = %url);
        let env: StatsEnvelope = self
            .fetch(self.http.get(url).bearer_auth(token), url, "http.tasks.stats.out")
            .await?;
        Ok(env.stats)
    }

    async fn create_task(&self, token: &str, draft: TaskDraft) -> Result<Task, ServiceError> {
        let url = &self.url_tasks;
        tracing::debug!(
            target: "taskdeck.http",
            stage = "http.tasks.create.in",
            url = %url,
            title_len = draft.title.len()
        );
        let req = self.http.post(url).bearer_auth(token).json(&draft);
        let env: TaskEnvelope = self.fetch(req, url, "http.tasks.create.out").await?;
        Ok(env.task)
    }

    async fn update_task(
        &self,
        token: &str,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError> {
        let url = self.task_url(id);
        tracing::debug!(target: "taskdeck.http", stage = "http.tasks.update.in", url = %url);
        let req = self.http.put(&url).bearer_auth(token).json(&patch);
        let env: TaskEnvelope = self.fetch(req, &url, "http.tasks.update.out").await?;
        Ok(env.task)
    }

    async fn delete_task(&self, token: &str, id: &str) -> Result<(), ServiceError> {
        let url = self.task_url(id);
        tracing::debug!(target: "taskdeck.http", stage = "http.tasks.delete.in", url = %url);
        let resp = self
            .send(self.http.delete(&url).bearer_auth(token), &url)
            .await?;
        let status = resp.status();
        ensure_success(resp).await?;
        tracing::debug!(target: "taskdeck.http", stage = "http.tasks.delete.out", status = %status);
        Ok(())
    }
}
