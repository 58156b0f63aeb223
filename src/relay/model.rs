use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// One download as reported by the worker.
///
/// The entry is kept as exactly what the worker pushed, object or not; the
/// accessors only look at it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadStatusEntry(Value);

impl DownloadStatusEntry {
    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }

    pub fn url(&self) -> Option<&str> {
        self.field("url")
    }

    pub fn state(&self) -> Option<&str> {
        self.field("state")
    }

    pub fn status_text(&self) -> Option<&str> {
        self.field("status_text")
    }

    fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

impl From<Value> for DownloadStatusEntry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusSnapshot(Vec<DownloadStatusEntry>);

impl StatusSnapshot {
    pub fn new(entries: Vec<DownloadStatusEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[DownloadStatusEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A panel request, classified by its `action` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Download { title: Option<String>, url: Option<String> },
    ClearFinished,
    StopAll,
    GetStatus,
    /// Absent or unrecognized action. Still forwarded; the worker decides.
    Other(Option<String>),
}

impl Command {
    pub fn classify(message: &Value) -> Self {
        let text = |key: &str| message.get(key).and_then(Value::as_str).map(str::to_string);

        match message.get("action").and_then(Value::as_str) {
            Some("download") => Command::Download { title: text("title"), url: text("url") },
            Some("clear_finished") => Command::ClearFinished,
            Some("stop_all") => Command::StopAll,
            Some("get_status") => Command::GetStatus,
            other => Command::Other(other.map(str::to_string)),
        }
    }

    pub fn is_status_query(&self) -> bool {
        matches!(self, Command::GetStatus)
    }
}

/// A push from the worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkerMessage {
    Status {
        #[serde(default)]
        data: StatusSnapshot,
    },
    #[serde(other)]
    Unknown,
}

impl WorkerMessage {
    /// Anything that does not decode as a known push is `Unknown`.
    pub fn decode(message: Value) -> Self {
        serde_json::from_value(message).unwrap_or(WorkerMessage::Unknown)
    }
}
