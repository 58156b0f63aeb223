use crate::notify::AlertSurface;
use crate::relay::codec::DEFAULT_MAX_FRAME_BYTES;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Native messaging host name of the download worker.
pub const DEFAULT_WORKER: &str = "youtubedladapter";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub worker_program: PathBuf,
    pub worker_args: Vec<String>,
    pub max_frame_bytes: usize,
    pub alert: AlertSurface,
    pub log_filter: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            worker_program: PathBuf::from(DEFAULT_WORKER),
            worker_args: vec![],
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            alert: AlertSurface::default(),
            log_filter: None,
        }
    }
}

pub fn build_cli() -> Command {
    Command::new("dlrelay")
        .about("Relays panel commands to a download worker and caches its status")
        .arg(
            Arg::new("worker")
                .long("worker")
                .env("DLRELAY_WORKER")
                .help("Worker program to spawn")
                .default_value(DEFAULT_WORKER)
                .num_args(1),
        )
        .arg(
            Arg::new("worker_arg")
                .long("worker-arg")
                .help("Argument passed to the worker (repeatable)")
                .action(ArgAction::Append)
                .allow_hyphen_values(true)
                .num_args(1),
        )
        .arg(
            Arg::new("max_frame_bytes")
                .long("max-frame-bytes")
                .env("DLRELAY_MAX_FRAME_BYTES")
                .help("Largest message accepted from the worker, in bytes")
                .default_value("1048576")
                .num_args(1),
        )
        .arg(
            Arg::new("alert")
                .long("alert")
                .env("DLRELAY_ALERT")
                .help("Where fatal connection errors are shown: panel or stderr")
                .default_value("panel")
                .num_args(1),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .help("Log filter, e.g. 'debug' or 'dlrelay=trace' (defaults to RUST_LOG)")
                .num_args(1),
        )
}

impl RelayConfig {
    pub fn from_matches(m: &ArgMatches) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        if let Some(w) = m.get_one::<String>("worker") {
            cfg.worker_program = PathBuf::from(w);
        }
        if let Some(args) = m.get_many::<String>("worker_arg") {
            cfg.worker_args = args.cloned().collect();
        }
        if let Some(s) = m.get_one::<String>("max_frame_bytes") {
            cfg.max_frame_bytes = s.parse()?;
        }
        if let Some(s) = m.get_one::<String>("alert") {
            cfg.alert = AlertSurface::parse(s)?;
        }
        cfg.log_filter = m.get_one::<String>("log").cloned();
        Ok(cfg)
    }
}
