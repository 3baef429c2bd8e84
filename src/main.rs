//! Guardian Bridge - widget-to-app SOS bridge
//!
//! This is the demo binary. It wires a state store, the widget surface, and
//! the primary application together, then drives the bridge headlessly,
//! emitting NDJSON events to stdout (one JSON object per line) so scripts
//! can observe the flow.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use serde_json::json;

use gbridge_app::{bootstrap, shell_transport, MethodResult};
use gbridge_core::{ActionCode, SurfaceId};
use gbridge_store::{FileStore, MemoryStore, SnapshotWriter, StateStore};
use gbridge_surface::RenderedSurface;

/// Guardian Bridge - widget-to-app SOS bridge demo
#[derive(Parser, Debug)]
#[command(name = "gbridge")]
#[command(about = "Drive the widget-to-app SOS bridge headlessly", long_about = None)]
struct Args {
    /// Back the state store with this TOML file (in-memory if omitted)
    #[arg(long, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Number of widget instances to provision
    #[arg(long, default_value_t = 1)]
    surfaces: u32,

    /// Seed the snapshot with this user name before rendering
    #[arg(long, value_name = "NAME")]
    user_name: Option<String>,

    /// Seed the snapshot with this guardian count before rendering
    #[arg(long, value_name = "COUNT")]
    guardians: Option<u32>,

    /// Simulate a tap on the first surface's SOS region
    #[arg(long)]
    tap: bool,

    /// Invoke this bridge method from the (simulated) native shell
    #[arg(long, value_name = "METHOD")]
    invoke: Option<String>,
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    gbridge_core::logging::init()?;

    let store: Arc<dyn StateStore> = match &args.store {
        Some(path) => Arc::new(FileStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };

    // Seeding stands in for the app's own state-writing business logic
    let writer = SnapshotWriter::new(Arc::clone(&store));
    if let Some(name) = &args.user_name {
        writer.set_user_name(name)?;
    }
    if let Some(count) = args.guardians {
        writer.set_guardian_count(count)?;
    }

    let stack = bootstrap(store);

    for i in 1..=args.surfaces {
        let rendered = stack.surface.on_provisioned(SurfaceId(i));
        emit_rendered(&rendered);
    }

    if args.tap {
        let surface_id = SurfaceId(1);
        let rendered = stack.surface.refresh(surface_id);
        let handle = rendered
            .region(ActionCode::TriggerSos)
            .ok_or_else(|| eyre!("SOS region not armed"))?
            .handle;

        stack.dispatcher.deliver(handle)?;
        emit(json!({
            "event": "sos_delivered",
            "surfaceId": surface_id,
            "appRunning": stack.host.is_running(),
            "sosRuns": stack.app.sos_runs(),
        }));

        // The safety action re-rendered every provisioned instance; show
        // what the shell would now display
        for rendered in stack.surface.refresh_all() {
            emit_rendered(&rendered);
        }
    }

    if let Some(method) = &args.invoke {
        let (client, server) = shell_transport(stack.app.channel());
        let server = tokio::spawn(server.serve());

        let result = client.call(method.clone(), json!({})).await?;
        emit(json!({
            "event": "command_result",
            "method": method,
            "result": match &result {
                MethodResult::Success(value) => json!({ "success": value }),
                MethodResult::NotImplemented => json!("not_implemented"),
            },
        }));

        drop(client);
        server.await?;
    }

    tracing::info!(
        "demo finished (sos runs: {}, app running: {})",
        stack.app.sos_runs(),
        stack.host.is_running()
    );
    Ok(())
}

fn emit_rendered(rendered: &RenderedSurface) {
    emit(json!({
        "event": "surface_rendered",
        "surfaceId": rendered.surface_id,
        "userName": rendered.user_name,
        "guardianLabel": rendered.guardian_label,
        "statusLabel": rendered.status_label,
    }));
}

fn emit(event: serde_json::Value) {
    println!("{event}");
}
