#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::oneshot;

use taskdeck_core::api::{
    AppConfig, AppContext, AuthResponse, ChangePasswordPayload, ChangePasswordResponse,
    ConfirmPrompt, LoginPayload, MemoryCredentialStore, Notice, NoticeLevel, Notifier,
    ProfileUpdate, QueryState, RegisterPayload, ServiceError, Services, StaticConfirm,
    StatsSnapshot, Task, TaskDraft, TaskPatch, TaskPriority, TaskService, TaskStatus, UserProfile,
};

pub const ADA_EMAIL: &str = "ada@example.com";
pub const ADA_PASSWORD: &str = "Secret1";
pub const ADA_TOKEN: &str = "tok-ada";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login(String),
    Register(String),
    Me(String),
    UpdateProfile(ProfileUpdate),
    ChangePassword,
    ListTasks(QueryState),
    TaskStats,
    CreateTask(String),
    UpdateTask(String),
    DeleteTask(String),
}

impl Call {
    pub fn op(&self) -> &'static str {
        match self {
            Call::Login(_) => "login",
            Call::Register(_) => "register",
            Call::Me(_) => "me",
            Call::UpdateProfile(_) => "update_profile",
            Call::ChangePassword => "change_password",
            Call::ListTasks(_) => "list_tasks",
            Call::TaskStats => "task_stats",
            Call::CreateTask(_) => "create_task",
            Call::UpdateTask(_) => "update_task",
            Call::DeleteTask(_) => "delete_task",
        }
    }
}

struct Account {
    user: UserProfile,
    password: String,
}

#[derive(Default)]
struct FakeState {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    tasks: Vec<Task>,
    calls: Vec<Call>,
    failures: HashMap<&'static str, VecDeque<ServiceError>>,
    gates: HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>,
    rotate_token_on_password_change: Option<String>,
    issued: u64,
}

/// In-memory stand-in for the task API.
///
/// Responses are computed when the call arrives; a gated call then waits for
/// its release before returning, so a late response carries old data.
pub struct FakeTaskService {
    state: Mutex<FakeState>,
}

pub fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn ada() -> UserProfile {
    UserProfile {
        id: "u-ada".into(),
        name: "Ada".into(),
        email: ADA_EMAIL.into(),
        created_at: Some(ts(0)),
        updated_at: Some(ts(0)),
    }
}

pub fn task(id: &str, title: &str, status: TaskStatus, priority: TaskPriority) -> Task {
    Task {
        id: id.into(),
        title: title.into(),
        description: None,
        status,
        priority,
        created_at: ts(0),
        due_date: None,
        updated_at: ts(0),
    }
}

impl FakeTaskService {
    pub fn new() -> Self {
        let mut state = FakeState::default();
        state.accounts.insert(
            ADA_EMAIL.into(),
            Account {
                user: ada(),
                password: ADA_PASSWORD.into(),
            },
        );
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        self.state.lock().unwrap().tasks = tasks;
        self
    }

    /// Makes `token` valid for ada.
    pub fn accept_token(&self, token: &str) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert(token.into(), ADA_EMAIL.into());
    }

    pub fn revoke_all_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    pub fn rotate_token_on_password_change(&self, token: &str) {
        self.state.lock().unwrap().rotate_token_on_password_change = Some(token.into());
    }

    pub fn fail_next(&self, op: &'static str, err: ServiceError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Holds the next `op` call until the returned sender fires (or drops).
    pub fn gate(&self, op: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .gates
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .count()
    }

    pub fn list_queries(&self) -> Vec<QueryState> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::ListTasks(q) => Some(q.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn server_tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn push_server_task(&self, task: Task) {
        self.state.lock().unwrap().tasks.push(task);
    }

    fn begin<T>(
        &self,
        call: Call,
        token: Option<&str>,
        compute: impl FnOnce(&mut FakeState) -> Result<T, ServiceError>,
    ) -> (Result<T, ServiceError>, Option<oneshot::Receiver<()>>) {
        let mut state = self.state.lock().unwrap();
        let op = call.op();
        state.calls.push(call);
        let gate = state.gates.get_mut(op).and_then(VecDeque::pop_front);

        if let Some(err) = state.failures.get_mut(op).and_then(VecDeque::pop_front) {
            return (Err(err), gate);
        }
        if let Some(token) = token {
            if !state.tokens.contains_key(token) {
                return (Err(ServiceError::Auth("Invalid token".into())), gate);
            }
        }
        (compute(&mut *state), gate)
    }

    async fn run<T>(
        &self,
        call: Call,
        token: Option<&str>,
        compute: impl FnOnce(&mut FakeState) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let (result, gate) = self.begin(call, token, compute);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }
}

fn issue_token(state: &mut FakeState, email: &str) -> String {
    state.issued += 1;
    let token = format!("tok-{}", state.issued);
    state.tokens.insert(token.clone(), email.into());
    token
}

fn user_for(state: &FakeState, token: &str) -> Result<UserProfile, ServiceError> {
    state
        .tokens
        .get(token)
        .and_then(|email| state.accounts.get(email))
        .map(|a| a.user.clone())
        .ok_or_else(|| ServiceError::Auth("Invalid token".into()))
}

fn matches(task: &Task, query: &QueryState) -> bool {
    let term = query.search_term.to_lowercase();
    (term.is_empty() || task.title.to_lowercase().contains(&term))
        && query.status_filter.map_or(true, |s| task.status == s)
        && query.priority_filter.map_or(true, |p| task.priority == p)
}

fn stats_of(tasks: &[Task]) -> StatsSnapshot {
    let mut by_status = BTreeMap::new();
    let mut by_priority = BTreeMap::new();
    for t in tasks {
        *by_status.entry(t.status.as_str().to_string()).or_insert(0) += 1;
        *by_priority.entry(t.priority.as_str().to_string()).or_insert(0) += 1;
    }
    StatsSnapshot {
        total: tasks.len() as u64,
        by_status,
        by_priority,
    }
}

#[async_trait]
impl TaskService for FakeTaskService {
    fn name(&self) -> &str {
        "fake"
    }

    async fn login(&self, payload: LoginPayload) -> Result<AuthResponse, ServiceError> {
        self.run(Call::Login(payload.email.clone()), None, |state| {
            let user = match state.accounts.get(&payload.email) {
                Some(a) if a.password == payload.password => a.user.clone(),
                _ => return Err(ServiceError::Auth("Invalid credentials".into())),
            };
            let token = issue_token(state, &payload.email);
            Ok(AuthResponse { token, user })
        })
        .await
    }

    async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse, ServiceError> {
        self.run(Call::Register(payload.email.clone()), None, |state| {
            if state.accounts.contains_key(&payload.email) {
                let mut fields = BTreeMap::new();
                fields.insert("email".to_string(), "Email already registered".to_string());
                return Err(ServiceError::Validation {
                    message: "User already exists".into(),
                    fields,
                });
            }
            let user = UserProfile {
                id: format!("u-{}", state.accounts.len() + 1),
                name: payload.name.clone(),
                email: payload.email.clone(),
                created_at: Some(ts(0)),
                updated_at: Some(ts(0)),
            };
            state.accounts.insert(
                payload.email.clone(),
                Account {
                    user: user.clone(),
                    password: payload.password.clone(),
                },
            );
            let token = issue_token(state, &payload.email);
            Ok(AuthResponse { token, user })
        })
        .await
    }

    async fn me(&self, token: &str) -> Result<UserProfile, ServiceError> {
        self.run(Call::Me(token.into()), Some(token), |state| user_for(state, token))
            .await
    }

    async fn update_profile(
        &self,
        token: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, ServiceError> {
        self.run(Call::UpdateProfile(update.clone()), Some(token), |state| {
            let email = user_for(state, token)?.email;
            let account = state
                .accounts
                .get_mut(&email)
                .ok_or(ServiceError::NotFound("User not found".into()))?;
            if let Some(name) = update.name {
                account.user.name = name;
            }
            if let Some(email) = update.email {
                account.user.email = email;
            }
            Ok(account.user.clone())
        })
        .await
    }

    async fn change_password(
        &self,
        token: &str,
        payload: ChangePasswordPayload,
    ) -> Result<ChangePasswordResponse, ServiceError> {
        self.run(Call::ChangePassword, Some(token), |state| {
            let email = user_for(state, token)?.email;
            let rotated = state.rotate_token_on_password_change.take();
            let account = state
                .accounts
                .get_mut(&email)
                .ok_or(ServiceError::NotFound("User not found".into()))?;
            if account.password != payload.current_password {
                return Err(ServiceError::Validation {
                    message: "Current password is incorrect".into(),
                    fields: BTreeMap::new(),
                });
            }
            account.password = payload.new_password;
            if let Some(rotated) = &rotated {
                state.tokens.insert(rotated.clone(), email);
            }
            Ok(ChangePasswordResponse { token: rotated })
        })
        .await
    }

    async fn list_tasks(&self, token: &str, query: &QueryState) -> Result<Vec<Task>, ServiceError> {
        self.run(Call::ListTasks(query.clone()), Some(token), |state| {
            Ok(state
                .tasks
                .iter()
                .filter(|t| matches(t, query))
                .cloned()
                .collect())
        })
        .await
    }

    async fn task_stats(&self, token: &str) -> Result<StatsSnapshot, ServiceError> {
        self.run(Call::TaskStats, Some(token), |state| Ok(stats_of(&state.tasks)))
            .await
    }

    async fn create_task(&self, token: &str, draft: TaskDraft) -> Result<Task, ServiceError> {
        self.run(Call::CreateTask(draft.title.clone()), Some(token), |state| {
            let task = Task {
                id: format!("t-{}", state.tasks.len() + 100),
                title: draft.title,
                description: draft.description,
                status: draft.status.unwrap_or(TaskStatus::Pending),
                priority: draft.priority.unwrap_or(TaskPriority::Medium),
                created_at: ts(60),
                due_date: draft.due_date,
                updated_at: ts(60),
            };
            state.tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    async fn update_task(
        &self,
        token: &str,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError> {
        self.run(Call::UpdateTask(id.into()), Some(token), |state| {
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ServiceError::NotFound("Task not found".into()))?;
            if let Some(title) = patch.title {
                task.title = title;
            }
            if let Some(description) = patch.description {
                task.description = Some(description);
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(due) = patch.due_date {
                task.due_date = Some(due);
            }
            task.updated_at = ts(120);
            Ok(task.clone())
        })
        .await
    }

    async fn delete_task(&self, token: &str, id: &str) -> Result<(), ServiceError> {
        self.run(Call::DeleteTask(id.into()), Some(token), |state| {
            let index = state
                .tasks
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| ServiceError::NotFound("Task not found".into()))?;
            state.tasks.remove(index);
            Ok(())
        })
        .await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| (n.level, n.message.clone()))
            .collect()
    }

    pub fn last(&self) -> Option<(NoticeLevel, String)> {
        self.notices().pop()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub fn success(message: &str) -> (NoticeLevel, String) {
    (NoticeLevel::Success, message.to_string())
}

pub fn error(message: &str) -> (NoticeLevel, String) {
    (NoticeLevel::Error, message.to_string())
}

pub struct Harness {
    pub fake: Arc<FakeTaskService>,
    pub credentials: Arc<MemoryCredentialStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: AppContext,
}

impl Harness {
    pub fn new(fake: FakeTaskService, credentials: MemoryCredentialStore) -> Self {
        Self::with_confirm(fake, credentials, Arc::new(StaticConfirm(true)))
    }

    pub fn with_confirm(
        fake: FakeTaskService,
        credentials: MemoryCredentialStore,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        let fake = Arc::new(fake);
        let credentials = Arc::new(credentials);
        let notifier = Arc::new(RecordingNotifier::default());
        let ctx = AppContext::new(
            AppConfig::default(),
            Services {
                service: fake.clone(),
                credentials: credentials.clone(),
                confirm,
                notifier: notifier.clone(),
            },
        );
        Self {
            fake,
            credentials,
            notifier,
            ctx,
        }
    }

    /// Resolved as ada, with `tasks` on the server and the default query loaded.
    pub async fn signed_in(tasks: Vec<Task>) -> Self {
        Self::signed_in_with_confirm(tasks, Arc::new(StaticConfirm(true))).await
    }

    pub async fn signed_in_with_confirm(tasks: Vec<Task>, confirm: Arc<dyn ConfirmPrompt>) -> Self {
        let fake = FakeTaskService::new().with_tasks(tasks);
        fake.accept_token(ADA_TOKEN);
        let h = Self::with_confirm(fake, MemoryCredentialStore::with_token(ADA_TOKEN), confirm);
        h.ctx.start().await;
        h.ctx.tasks().reload().await.unwrap();
        h.notifier.clear();
        h
    }

    pub async fn cached_ids(&self) -> Vec<String> {
        self.ctx
            .tasks()
            .tasks()
            .await
            .into_iter()
            .map(|t| t.id)
            .collect()
    }
}
