//! Interactive browsing: plain lines search (debounced), `:` lines change
//! filters and sort immediately.

use chrono::Utc;
use taskdeck_core::api::{
    AppContext, CacheEvent, CliError, ServiceError, SortField, SortOrder, TaskPriority, TaskStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::cli::OutputFormat;
use super::require_login;
use crate::render;

const HELP: &str = "\
type text to search, or:
  :status <pending|in-progress|completed|all>
  :priority <low|medium|high|all>
  :sort <createdAt|updatedAt|priority|status>
  :order <asc|desc>
  :reload
  :quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseInput {
    Search(String),
    Status(Option<TaskStatus>),
    Priority(Option<TaskPriority>),
    Sort(SortField),
    Order(SortOrder),
    Reload,
    Help,
    Quit,
}

/// Parses one input line. Errors are messages for the user.
pub fn parse_line(line: &str) -> Result<BrowseInput, String> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(BrowseInput::Search(line.to_string()));
    };
    let mut parts = rest.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next().unwrap_or_default();
    let all = arg.is_empty() || arg.eq_ignore_ascii_case("all");

    match cmd {
        "q" | "quit" | "exit" => Ok(BrowseInput::Quit),
        "help" | "h" => Ok(BrowseInput::Help),
        "reload" | "r" => Ok(BrowseInput::Reload),
        "status" if all => Ok(BrowseInput::Status(None)),
        "status" => arg
            .parse()
            .map(|s| BrowseInput::Status(Some(s)))
            .map_err(|e| format!("{e}")),
        "priority" if all => Ok(BrowseInput::Priority(None)),
        "priority" => arg
            .parse()
            .map(|p| BrowseInput::Priority(Some(p)))
            .map_err(|e| format!("{e}")),
        "sort" => arg.parse().map(BrowseInput::Sort).map_err(|e| format!("{e}")),
        "order" => arg.parse().map(BrowseInput::Order).map_err(|e| format!("{e}")),
        other => Err(format!("unknown command ':{other}', try :help")),
    }
}

pub async fn run(ctx: &AppContext) -> Result<i32, CliError> {
    require_login(ctx).await?;
    let tasks = ctx.tasks().clone();

    // Redraw whenever a reload lands; stale responses are never shown.
    let mut events = tasks.subscribe();
    let printer = tokio::spawn({
        let tasks = tasks.clone();
        async move {
            loop {
                match events.recv().await {
                    Ok(CacheEvent::Reloaded { .. }) => {
                        let list = tasks.tasks().await;
                        println!("{}", render::tasks(&list, OutputFormat::Text, Utc::now()));
                        println!("--");
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });

    eprintln!("{HELP}");
    // Failures were already reported as notices.
    let _ = tasks.reload().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_line(line.trim_end()) {
            Ok(input) => input,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        let result: Result<(), ServiceError> = match input {
            BrowseInput::Quit => break,
            BrowseInput::Help => {
                eprintln!("{HELP}");
                Ok(())
            }
            BrowseInput::Search(term) => {
                tasks.set_search_term(term).await;
                Ok(())
            }
            BrowseInput::Reload => tasks.reload().await.map(|_| ()),
            BrowseInput::Status(s) => tasks.set_status_filter(s).await.map(|_| ()),
            BrowseInput::Priority(p) => tasks.set_priority_filter(p).await.map(|_| ()),
            BrowseInput::Sort(f) => tasks.set_sort_by(f).await.map(|_| ()),
            BrowseInput::Order(o) => tasks.set_sort_order(o).await.map(|_| ()),
        };
        if let Err(err) = result {
            tracing::debug!(target: "taskdeck.browse", error = %err);
            if err.is_auth() {
                return Err(err.into());
            }
        }
    }

    tasks.cancel_pending_search();
    printer.abort();
    Ok(0)
}
