use dlrelay::config::{build_cli, RelayConfig};
use dlrelay::notify::{AlertSurface, PanelAlert, StderrAlert};
use dlrelay::panel;
use dlrelay::relay::service::Relay;
use dlrelay::transport::process::ProcessTransport;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    // stdout belongs to the panel protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    let cfg = RelayConfig::from_matches(&matches)?;
    init_logging(cfg.log_filter.as_deref());

    info!(worker = %cfg.worker_program.display(), alert = ?cfg.alert, "starting relay");

    let transport = ProcessTransport::new(cfg.worker_program.clone(), cfg.worker_args.clone(), cfg.max_frame_bytes);
    let mut relay = Relay::new(Box::new(transport));

    let (req_tx, req_rx) = mpsc::channel(64);
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    match cfg.alert {
        AlertSurface::Panel => relay.subscribe(Box::new(PanelAlert::new(out_tx.clone()))),
        AlertSurface::Stderr => relay.subscribe(Box::new(StderrAlert)),
    }

    let reader = panel::spawn_reader(tokio::io::stdin(), req_tx, out_tx);
    let writer = tokio::spawn(panel::write_outputs(tokio::io::stdout(), out_rx));

    relay.run(req_rx).await;

    reader.await?;
    writer.await??;
    Ok(())
}
