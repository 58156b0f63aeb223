//! Where fatal connection failures are shown to the user.

use crate::panel::PanelOutput;
use crate::relay::error::RelayError;
use crate::relay::observer::ChannelObserver;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertSurface {
    #[default]
    Panel,
    Stderr,
}

impl AlertSurface {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "panel" => Ok(Self::Panel),
            "stderr" => Ok(Self::Stderr),
            other => anyhow::bail!("unknown alert surface: {} (expected panel or stderr)", other),
        }
    }
}

/// Pushes a `fatal` line to the panel's output stream.
pub struct PanelAlert {
    outputs: mpsc::UnboundedSender<PanelOutput>,
}

impl PanelAlert {
    pub fn new(outputs: mpsc::UnboundedSender<PanelOutput>) -> Self {
        Self { outputs }
    }
}

impl ChannelObserver for PanelAlert {
    fn on_fatal(&self, error: &RelayError) {
        if self.outputs.send(PanelOutput::Alert(error.to_string())).is_err() {
            warn!("panel output closed; alert not delivered: {}", error);
        }
    }
}

/// Writes the alert straight to stderr, blocking until it is written.
pub struct StderrAlert;

impl ChannelObserver for StderrAlert {
    fn on_fatal(&self, error: &RelayError) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "dlrelay: {}", error);
        let _ = stderr.flush();
    }
}
