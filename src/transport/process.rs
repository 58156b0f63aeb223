use crate::relay::codec::{encode_frame, read_frame};
use crate::relay::error::FrameError;
use crate::relay::model::ConnectionId;
use crate::transport::{Connection, Inbound, InboundSender, Transport};
use anyhow::Context;
use bytes::Bytes;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Runs the worker as a child process speaking native messaging on its stdio.
pub struct ProcessTransport {
    program: PathBuf,
    args: Vec<String>,
    max_frame_bytes: usize,
}

impl ProcessTransport {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, max_frame_bytes: usize) -> Self {
        Self { program: program.into(), args, max_frame_bytes }
    }
}

impl Transport for ProcessTransport {
    fn name(&self) -> &'static str {
        "process"
    }

    fn connect(&mut self, id: ConnectionId, inbound: InboundSender) -> anyhow::Result<Box<dyn Connection>> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", self.program.display()))?;
        let stdin = child.stdin.take().context("worker stdin not captured")?;
        let stdout = child.stdout.take().context("worker stdout not captured")?;

        info!(connection = %id, program = %self.program.display(), pid = ?child.id(), "worker started");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (write_failed_tx, write_failed_rx) = oneshot::channel();
        tokio::spawn(write_loop(id, stdin, outbound_rx, write_failed_tx));
        tokio::spawn(supervise(id, stdout, child, inbound, write_failed_rx, self.max_frame_bytes));

        Ok(Box::new(ProcessConnection { id, outbound: outbound_tx }))
    }
}

struct ProcessConnection {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Bytes>,
}

impl Connection for ProcessConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn post(&mut self, message: &Value) {
        let frame = match encode_frame(message) {
            Ok(f) => f,
            Err(e) => {
                warn!(connection = %self.id, "dropping unencodable message: {}", e);
                return;
            }
        };
        if self.outbound.send(frame).is_err() {
            debug!(connection = %self.id, "writer already stopped; message dropped");
        }
    }
}

async fn write_loop(
    id: ConnectionId,
    mut stdin: ChildStdin,
    mut frames: mpsc::UnboundedReceiver<Bytes>,
    failed: oneshot::Sender<String>,
) {
    while let Some(frame) = frames.recv().await {
        let written = async {
            stdin.write_all(&frame).await?;
            stdin.flush().await
        };
        if let Err(e) = written.await {
            warn!(connection = %id, "write to worker failed: {}", e);
            let _ = failed.send(format!("write to worker failed: {}", e));
            return;
        }
    }
    debug!(connection = %id, "connection dropped; closing worker stdin");
}

async fn read_frames(
    mut stdout: ChildStdout,
    max_frame_bytes: usize,
    frames: mpsc::Sender<Result<Value, FrameError>>,
) {
    loop {
        let item = match read_frame(&mut stdout, max_frame_bytes).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => return,
            Err(e) => Err(e),
        };
        let last = item.is_err();
        if frames.send(item).await.is_err() || last {
            return;
        }
    }
}

/// Forwards frames as inbound events and reports the connection's close.
/// A failed read or write kills the worker and makes the close abnormal.
async fn supervise(
    id: ConnectionId,
    stdout: ChildStdout,
    mut child: Child,
    inbound: InboundSender,
    mut write_failed: oneshot::Receiver<String>,
    max_frame_bytes: usize,
) {
    let (frames_tx, mut frames) = mpsc::channel(16);
    let reader = tokio::spawn(read_frames(stdout, max_frame_bytes, frames_tx));
    let mut writer_running = true;

    let mut error = loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(Ok(message)) => {
                    if inbound.send(Inbound::message(id, message)).is_err() {
                        // Nobody is listening any more; kill_on_drop reaps the child.
                        reader.abort();
                        return;
                    }
                }
                Some(Err(e)) => {
                    let _ = child.start_kill();
                    break Some(e.to_string());
                }
                None => break None,
            },
            failed = &mut write_failed, if writer_running => match failed {
                Ok(detail) => {
                    let _ = child.start_kill();
                    break Some(detail);
                }
                // Writer stopped because the connection was dropped.
                Err(_) => writer_running = false,
            },
        }
    };
    reader.abort();

    match child.wait().await {
        Ok(status) => {
            info!(connection = %id, %status, "worker exited");
            if error.is_none() && !status.success() {
                error = Some(format!("worker exited with {}", status));
            }
        }
        Err(e) => {
            error.get_or_insert_with(|| format!("waiting for worker failed: {}", e));
        }
    }

    let _ = inbound.send(Inbound::closed(id, error));
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::transport::{InboundEvent, InboundReceiver};
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    async fn next(rx: &mut InboundReceiver) -> Inbound {
        tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for worker event")
            .expect("inbound channel closed")
    }

    fn sh(script: &str) -> ProcessTransport {
        ProcessTransport::new("sh", vec!["-c".into(), script.into()], 1024)
    }

    #[tokio::test]
    async fn missing_program_fails_to_connect() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut transport = ProcessTransport::new("/nonexistent/dlrelay-worker", vec![], 1024);
        let err = transport.connect(Uuid::new_v4(), tx).err().expect("spawn should fail");
        assert!(format!("{:#}", err).contains("/nonexistent/dlrelay-worker"));
    }

    #[tokio::test]
    async fn echoing_worker_round_trips_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = ProcessTransport::new("cat", vec![], 1024);
        let id = Uuid::new_v4();
        let mut conn = transport.connect(id, tx).unwrap();
        assert_eq!(conn.id(), id);

        conn.post(&json!({"action": "status", "data": [{"title": "T"}]}));
        conn.post(&json!({"action": "stop_all"}));

        assert_eq!(next(&mut rx).await, Inbound::message(id, json!({"action": "status", "data": [{"title": "T"}]})));
        assert_eq!(next(&mut rx).await, Inbound::message(id, json!({"action": "stop_all"})));

        drop(conn);
        assert_eq!(next(&mut rx).await, Inbound::closed(id, None));
    }

    #[tokio::test]
    async fn clean_exit_is_a_normal_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let _conn = sh("exit 0").connect(id, tx).unwrap();
        assert_eq!(next(&mut rx).await.event, InboundEvent::Closed { error: None });
    }

    #[tokio::test]
    async fn failing_exit_carries_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let _conn = sh("exit 3").connect(id, tx).unwrap();
        match next(&mut rx).await.event {
            InboundEvent::Closed { error: Some(detail) } => assert!(detail.contains('3'), "{}", detail),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn worker_closing_stdin_is_an_abnormal_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let mut conn = sh("exec 0<&-; sleep 30").connect(id, tx).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                conn.post(&json!({"action": "stop_all"}));
                tokio::select! {
                    event = rx.recv() => break event,
                    _ = tokio::time::sleep(Duration::from_millis(100)) => {}
                }
            }
        })
        .await
        .expect("no close after failed write")
        .expect("inbound channel closed");

        match event.event {
            InboundEvent::Closed { error: Some(detail) } => {
                assert!(detail.starts_with("write to worker failed"), "{}", detail)
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(event.connection, id);
    }

    #[tokio::test]
    async fn garbage_output_is_an_abnormal_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        // Header announces ~1.6 GB, far over the 1 KiB limit.
        let _conn = sh("printf 'abcd'; sleep 5").connect(id, tx).unwrap();
        match next(&mut rx).await.event {
            InboundEvent::Closed { error: Some(detail) } => assert!(detail.contains("exceeds limit"), "{}", detail),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
