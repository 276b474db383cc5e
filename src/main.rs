mod backend;
mod config;
mod curve;
mod daemon;
mod status;
mod transitions;
mod tween;
mod types;

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::default_settings_path;
use crate::daemon::{ShellEvent, run_daemon, send_event};

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            return iter.next().map(String::as_str);
        }
    }
    None
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|arg| arg == "--daemon") {
        let settings_path = flag_value(&args, "--config")
            .map(PathBuf::from)
            .unwrap_or_else(default_settings_path);
        run_daemon(settings_path)?;
        return Ok(());
    }
    if args.iter().any(|arg| arg == "--status") {
        println!("{}", send_event(ShellEvent::Status)?);
        return Ok(());
    }
    if args.iter().any(|arg| arg == "--send") {
        let name = flag_value(&args, "--send")
            .ok_or_else(|| anyhow::anyhow!("missing event name after --send"))?;
        println!("{}", send_event(ShellEvent::from_name(name)?)?);
        return Ok(());
    }

    eprintln!(
        "Usage: panelfade --daemon [--config <path>]\n       panelfade --send <event>\n       panelfade --status\nEvents: overview-showing, overview-hidden, window-maximized, window-unmaximized,\n        screen-locked, screen-unlocked, reload-settings"
    );
    Ok(())
}
