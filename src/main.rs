#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::time::Duration;

use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::BackendName;
use domain::models::Event;
use domain::models::Notification;
use infrastructure::backends::BackendManager;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio::task;

use crate::application::cli;
use crate::application::repl;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::archive::ArchiveService;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        format!(
            "Oh no! Hivetutor has failed with the following app version and error.\n\nVersion: {}\nBuild date: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_BUILD_DATE"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn debug_log_dir() -> String {
    if let Ok(dir) = env::var("HIVETUTOR_LOG_DIR") {
        return dir;
    }

    return dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("hivetutor")
        .to_string_lossy()
        .to_string();
}

async fn run() -> Result<()> {
    let backend = BackendManager::get(BackendName::parse(Config::get(ConfigKey::Backend))?)?;
    if let Err(err) = backend.health_check().await {
        tracing::warn!(error = ?err, backend = %backend.name(), "Backend health check failed");
        eprintln!("{}", format!("Warning: {err}").yellow());
    }

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let (notification_tx, mut notification_rx) = mpsc::unbounded_channel::<Notification>();

    let stream_timeout = Duration::from_millis(Config::get_u64(ConfigKey::StreamTimeout));
    let sessions = cli::sessions();
    let ledger = cli::ledger();
    let archive_tx = event_tx.clone();

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return ActionsService::start(backend, stream_timeout, event_tx, &mut action_rx).await;
    });
    background_futures.spawn(async move {
        return ArchiveService::start(sessions, ledger, archive_tx, &mut notification_rx).await;
    });

    let repl_future = repl::start(action_tx, notification_tx, event_rx);

    tokio::select!(
        res = background_futures.join_next() => {
            if let Some(res) = res {
                res??;
            }
        },
        res = repl_future => res?,
    );

    return Ok(());
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(debug_log_dir(), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("hivetutor")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => handle_error(err),
    }

    if let Err(err) = run().await {
        handle_error(err);
    }

    process::exit(0);
}
