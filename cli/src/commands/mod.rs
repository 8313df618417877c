pub mod auth;
pub mod browse;
pub mod cli;
pub mod tasks;

use taskdeck_core::api::{AppContext, CliError, FieldErrors, ServiceError};

use cli::{Commands, OutputFormat};

pub async fn dispatch(
    cmd: Commands,
    ctx: &AppContext,
    format: OutputFormat,
) -> Result<i32, CliError> {
    match cmd {
        Commands::Login(args) => auth::login(ctx, args, format).await,
        Commands::Register(args) => auth::register(ctx, args, format).await,
        Commands::Logout => auth::logout(ctx).await,
        Commands::Whoami => auth::whoami(ctx, format).await,
        Commands::Profile(args) => auth::profile(ctx, args, format).await,
        Commands::Password(args) => auth::password(ctx, args).await,
        Commands::Tasks(args) => tasks::run(ctx, args.command, format).await,
        Commands::Stats => tasks::stats(ctx, format).await,
        Commands::Browse => browse::run(ctx).await,
    }
}

/// Local form check; failures never reach the network.
pub(crate) fn check(fields: FieldErrors) -> Result<(), CliError> {
    taskdeck_core::api::ensure_valid(fields).map_err(CliError::from)
}

/// Fails with `Unauthenticated` when nobody is signed in.
pub(crate) async fn require_login(ctx: &AppContext) -> Result<(), CliError> {
    if ctx.session().require_token().await.is_err() {
        eprintln!("Not logged in. Run `taskdeck login` first.");
        return Err(ServiceError::Unauthenticated.into());
    }
    Ok(())
}
