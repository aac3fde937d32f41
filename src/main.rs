use anyhow::{Context, Result};
use std::{
    io::{self, BufRead, Write},
    path::Path,
};
use stormlit::{
    config::{Config, CONFIG_FILE},
    dashboard::{DashboardEvent, DashboardView, Session},
    warehouse::{fact_query, BigQueryWarehouse, SnapshotWarehouse, Warehouse},
    TableCache,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    // ─── 1) init logging ─────────────────────────────────────────────
    // stdout carries the views, so logs go to stderr.
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    if let Err(e) = run() {
        error!("fatal: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // ─── 2) load config ──────────────────────────────────────────────
    let config = Config::load_or_default(Path::new(CONFIG_FILE))?;
    let table = config.table_ref()?;
    let query = fact_query(&table);

    // ─── 3) pick the warehouse ───────────────────────────────────────
    let warehouse: Box<dyn Warehouse> = match &config.snapshot_path {
        Some(path) => {
            info!("serving from snapshot {}", path.display());
            Box::new(SnapshotWarehouse::new(path))
        }
        None => {
            info!("serving from BigQuery table {}", table);
            Box::new(BigQueryWarehouse::new(&config.credentials_path, table.project.clone()))
        }
    };
    let mut session = Session::new(TableCache::new(warehouse, query));

    // ─── 4) initial page; no data means nothing to show ──────────────
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let view = session.start()?;
    write_view(&mut out, &view)?;

    // ─── 5) one view per event until stdin closes ────────────────────
    for line in io::stdin().lock().lines() {
        let line = line.context("reading events from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: DashboardEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("skipping malformed event {:?}: {}", line, e);
                continue;
            }
        };
        let view = session.handle(event)?;
        write_view(&mut out, &view)?;
    }

    info!("input closed; exit");
    Ok(())
}

fn write_view(out: &mut impl Write, view: &DashboardView) -> Result<()> {
    serde_json::to_writer(&mut *out, view).context("serializing view")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
