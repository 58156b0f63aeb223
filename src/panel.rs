//! JSON Lines front end for the panel: one request per input line, one line
//! per status reply or alert.

use crate::relay::model::StatusSnapshot;
use crate::relay::router::PanelRequest;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub enum PanelOutput {
    /// Resolves if the request turned out to be a status query.
    Reply(oneshot::Receiver<StatusSnapshot>),
    Alert(String),
}

pub fn spawn_reader<R>(
    input: R,
    requests: mpsc::Sender<PanelRequest>,
    outputs: mpsc::UnboundedSender<PanelOutput>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("reading panel input failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    warn!("skipping malformed panel line: {}", e);
                    continue;
                }
            };

            let (request, reply) = PanelRequest::with_reply(message);
            if outputs.send(PanelOutput::Reply(reply)).is_err() || requests.send(request).await.is_err() {
                debug!("relay stopped; no longer reading panel input");
                break;
            }
        }
    })
}

/// Writes outputs in the order they were queued until every sender is gone.
pub async fn write_outputs<W>(mut out: W, mut outputs: mpsc::UnboundedReceiver<PanelOutput>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(output) = outputs.recv().await {
        let line = match output {
            PanelOutput::Reply(rx) => match rx.await {
                Ok(snapshot) => serde_json::to_string(&snapshot)?,
                Err(_) => continue,
            },
            PanelOutput::Alert(message) => json!({"action": "fatal", "message": message}).to_string(),
        };
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::service::Relay;
    use crate::relay::testing::MockTransport;
    use crate::transport::Inbound;

    #[tokio::test]
    async fn only_status_queries_and_alerts_produce_lines() {
        let transport = MockTransport::default();
        let relay = Relay::new(Box::new(transport.clone()));
        let cache = relay.status().clone();

        let (req_tx, req_rx) = mpsc::channel(8);
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let input: &'static [u8] = b"{\"action\":\"get_status\"}\n\nnot json\n{\"action\":\"download\",\"title\":\"T\",\"url\":\"U\"}\n{\"action\":\"get_status\"}\n";
        let reader = spawn_reader(input, req_tx, out_tx.clone());
        reader.await.unwrap();
        out_tx.send(PanelOutput::Alert("Could not start worker: boom".into())).unwrap();
        drop(out_tx);

        relay.run(req_rx).await;

        let mut written = Vec::new();
        write_outputs(&mut written, out_rx).await.unwrap();
        let text = String::from_utf8(written).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[]");
        assert_eq!(lines[1], "[]");
        let alert: Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(alert, json!({"action": "fatal", "message": "Could not start worker: boom"}));

        assert_eq!(transport.connects(), 1);
        assert_eq!(transport.posted().len(), 1);
        assert!(cache.read().is_empty());
    }

    #[tokio::test]
    async fn reply_reflects_latest_push() {
        let transport = MockTransport::default();
        let relay = Relay::new(Box::new(transport.clone()));

        let (req_tx, req_rx) = mpsc::channel(8);
        let task = tokio::spawn(relay.run(req_rx));

        req_tx.send(PanelRequest::new(json!({"action": "clear_finished"}))).await.unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let (id, inbound) = transport.last_inbound().unwrap();
        inbound
            .send(Inbound::message(id, json!({"action": "status", "data": [{"title": "A", "state": "finished"}]})))
            .unwrap();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let reader = spawn_reader(&b"{\"action\":\"get_status\"}\n"[..], req_tx, out_tx);
        reader.await.unwrap();
        task.await.unwrap();

        let mut written = Vec::new();
        write_outputs(&mut written, out_rx).await.unwrap();
        let reply: Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(reply, json!([{"title": "A", "state": "finished"}]));
    }
}
