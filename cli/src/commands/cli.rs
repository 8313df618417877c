use clap::{Args as ClapArgs, Parser, Subcommand};
use taskdeck_core::api::{SortField, SortOrder, TaskPriority, TaskStatus};

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "taskdeck", version, about = "Personal task tracker client")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the API base URL for this invocation.
    #[arg(long, global = true, env = "TASKDECK_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

impl Args {
    /// True when the command asked to skip the delete confirmation.
    pub fn assume_yes(&self) -> bool {
        matches!(
            &self.command,
            Commands::Tasks(TasksArgs {
                command: TasksCommand::Delete(DeleteArgs { yes: true, .. })
            })
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the token.
    Login(LoginArgs),
    /// Create an account; success signs in.
    Register(RegisterArgs),
    /// Forget the stored token.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Update name and/or email.
    Profile(ProfileArgs),
    /// Change the account password.
    Password(PasswordArgs),
    Tasks(TasksArgs),
    /// Task counts by status and priority.
    Stats,
    /// Interactive list: type to search, `:help` for commands.
    Browse,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Repeat the password. Defaults to `--password`.
    #[arg(long)]
    pub confirm: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PasswordArgs {
    #[arg(long)]
    pub current: String,

    #[arg(long)]
    pub new: String,

    #[arg(long)]
    pub confirm: String,
}

#[derive(ClapArgs, Debug)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksCommand,
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    List(ListArgs),
    Create(CreateArgs),
    Update(UpdateArgs),
    /// Shortcut for `update --status`.
    Status(StatusArgs),
    Delete(DeleteArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    #[arg(long, default_value_t = SortField::CreatedAt)]
    pub sort: SortField,

    #[arg(long, default_value_t = SortOrder::Desc)]
    pub order: SortOrder,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    /// RFC 3339 timestamp or YYYY-MM-DD.
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    #[arg(long)]
    pub due: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct StatusArgs {
    pub id: String,
    pub status: TaskStatus,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DeleteArgs {
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}
