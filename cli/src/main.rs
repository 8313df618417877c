use clap::Parser;
mod commands;
mod render;
use commands::cli;
use taskdeck_core::api::{AppContext, CliError, LoggingConfig, ServiceError};
use taskdeck_plugins::factory::StandardServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let mut cfg =
        taskdeck_core::config::load_default().map_err(|e| CliError::Config(e.to_string()))?;
    if let Some(url) = args.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
        cfg.api.base_url = url.to_string();
    }
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let factory = StandardServicesFactory {
        assume_yes: args.assume_yes(),
        color: atty::is(atty::Stream::Stderr),
    };
    let ctx = AppContext::with_factory(cfg, &factory)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;

    let status = ctx.session().resolve().await;
    tracing::debug!(target: "taskdeck.cli", stage = "cli.start", status = ?status);

    commands::dispatch(args.command, &ctx, args.format).await
}

/// Service failures were already shown as notices; only field detail is
/// added here.
fn report(e: &CliError) {
    match e {
        CliError::Service(ServiceError::Validation { fields, .. }) if !fields.is_empty() => {
            eprintln!("{}", render::field_errors(fields));
        }
        CliError::Service(_) => {}
        other => eprintln!("{other}"),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("taskdeck"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let appender = tracing_appender::rolling::daily(dir, "taskdeck.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
