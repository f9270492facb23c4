#[macro_use]
extern crate tracing;

use std::env;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyhow::Context;
use calloop::EventLoop;
use directories::{ProjectDirs, UserDirs};
use miette::WrapErr;
use strata::strata::State;
use strata::utils::spawning::{spawn, REMOVE_ENV_RUST_BACKTRACE};
use strata::utils::{signals, version};
use strata_config::Config;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "strata=debug,info";

fn main() -> ExitCode {
    // Set backtrace defaults if not set.
    if env::var_os("RUST_BACKTRACE").is_none() {
        env::set_var("RUST_BACKTRACE", "1");
        REMOVE_ENV_RUST_BACKTRACE.store(true, Ordering::Relaxed);
    }

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter);
    match open_log_file() {
        Some(file) => subscriber.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => subscriber.with_writer(std::io::stderr).init(),
    }

    // Block the signals before any thread starts so that they all inherit the mask.
    if let Err(err) = signals::block_early() {
        warn!("error blocking signals: {err:?}");
    }

    info!("starting strata {}", version());

    let _client = tracy_client::Client::start();

    let config = load_config();

    match run(config) {
        Ok(()) => {
            info!("exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> anyhow::Result<()> {
    let spawn_at_startup = config.spawn_at_startup.clone();

    let mut event_loop = EventLoop::<State>::try_new().context("error creating event loop")?;
    let mut state = State::new(config, event_loop.handle(), event_loop.get_signal())
        .context("error initializing the backend")?;

    signals::listen(&event_loop.handle())?;

    for elem in spawn_at_startup {
        spawn(elem.command);
    }

    event_loop
        .run(None, &mut state, |state| {
            let _span = tracy_client::span!("loop callback");
            state.refresh_and_render();
        })
        .context("error running event loop")?;

    Ok(())
}

/// Opens `$HOME/.strata.log` for appending.
fn open_log_file() -> Option<File> {
    let path = UserDirs::new()?.home_dir().join(".strata.log");
    OpenOptions::new().create(true).append(true).open(path).ok()
}

fn config_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "strata")?;
    Some(dirs.config_dir().join("config.kdl"))
}

fn load_config() -> Config {
    let Some(path) = config_path() else {
        warn!("error retrieving home directory, using the default config");
        return Config::default();
    };

    if !path.exists() {
        info!("{path:?} does not exist, using the default config");
        return Config::default();
    }

    match Config::load(&path).wrap_err_with(|| format!("error loading config from {path:?}")) {
        Ok(config) => config,
        Err(err) => {
            warn!("{err:?}");
            warn!("using the default config");
            Config::default()
        }
    }
}
