use chrono::{DateTime, NaiveDate, Utc};
use taskdeck_core::api::{
    validate_task_draft, validate_task_patch, AppContext, CliError, DeleteOutcome, QueryState,
    RefreshOutcome, TaskDraft, TaskPatch,
};

use super::cli::{CreateArgs, ListArgs, OutputFormat, StatusArgs, TasksCommand, UpdateArgs};
use super::{check, require_login};
use crate::render;

pub async fn run(
    ctx: &AppContext,
    cmd: TasksCommand,
    format: OutputFormat,
) -> Result<i32, CliError> {
    require_login(ctx).await?;
    match cmd {
        TasksCommand::List(args) => list(ctx, args, format).await,
        TasksCommand::Create(args) => create(ctx, args, format).await,
        TasksCommand::Update(args) => update(ctx, args, format).await,
        TasksCommand::Status(StatusArgs { id, status }) => {
            let task = ctx.tasks().change_status(&id, status).await?;
            println!("{}", render::task(&task, format, Utc::now()));
            Ok(0)
        }
        TasksCommand::Delete(args) => match ctx.tasks().delete(&args.id).await? {
            DeleteOutcome::Deleted => Ok(0),
            DeleteOutcome::Declined => {
                eprintln!("Cancelled.");
                Ok(0)
            }
        },
    }
}

pub fn query_from(args: ListArgs) -> QueryState {
    QueryState {
        search_term: args.search,
        status_filter: args.status,
        priority_filter: args.priority,
        sort_by: args.sort,
        sort_order: args.order,
    }
}

async fn list(ctx: &AppContext, args: ListArgs, format: OutputFormat) -> Result<i32, CliError> {
    ctx.tasks().set_query(query_from(args)).await?;
    let tasks = ctx.tasks().tasks().await;
    println!("{}", render::tasks(&tasks, format, Utc::now()));
    Ok(0)
}

async fn create(ctx: &AppContext, args: CreateArgs, format: OutputFormat) -> Result<i32, CliError> {
    let draft = TaskDraft {
        title: args.title.trim().to_string(),
        description: args.description,
        status: args.status,
        priority: args.priority,
        due_date: args.due.as_deref().map(parse_due).transpose()?,
    };
    check(validate_task_draft(&draft))?;
    let task = ctx.tasks().create(draft).await?;
    println!("{}", render::task(&task, format, Utc::now()));
    Ok(0)
}

async fn update(ctx: &AppContext, args: UpdateArgs, format: OutputFormat) -> Result<i32, CliError> {
    let patch = TaskPatch {
        title: args.title.map(|t| t.trim().to_string()),
        description: args.description,
        status: args.status,
        priority: args.priority,
        due_date: args.due.as_deref().map(parse_due).transpose()?,
    };
    if patch.is_empty() {
        return Err(CliError::Command("nothing to update".into()));
    }
    check(validate_task_patch(&patch))?;
    let task = ctx.tasks().update(&args.id, patch).await?;
    println!("{}", render::task(&task, format, Utc::now()));
    Ok(0)
}

pub async fn stats(ctx: &AppContext, format: OutputFormat) -> Result<i32, CliError> {
    require_login(ctx).await?;
    match ctx.stats().refresh().await {
        RefreshOutcome::Applied { .. } | RefreshOutcome::Stale { .. } => {
            let snapshot = ctx.stats().snapshot().await;
            println!("{}", render::stats(&snapshot, format));
            Ok(0)
        }
        RefreshOutcome::Failed | RefreshOutcome::Skipped => {
            Err(CliError::Command("could not load task statistics".into()))
        }
    }
}

/// Accepts RFC 3339 or a bare date (midnight UTC).
pub fn parse_due(s: &str) -> Result<DateTime<Utc>, CliError> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CliError::Command(format!("invalid due date '{s}', expected YYYY-MM-DD")))
}
