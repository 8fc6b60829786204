//! # Device Commands
//!
//! One function per one-shot command. Each writes its report to `out` so
//! the same code serves the terminal and the tests.
//!
//! ```text
//! Command ──► execute(device, command, out)
//!                 │
//!                 ├── link / unlink / status / sync ──► ReplicationService
//!                 ├── repair / reset ─────────────────► frigo-db repositories
//!                 ├── dashboard / route ──────────────► frigo-core reports
//!                 └── insights / route --narrate ─────► InsightService
//! ```

use chrono::{Local, NaiveDate};
use frigo_core::reports;
use frigo_db::Database;
use frigo_insights::InsightService;
use frigo_sync::{
    generate_linking_code, CloudSlot, LogEmitter, ReplicationService, SyncAgent, SyncConfig,
};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::cli::Command;
use crate::error::{AppError, AppResult};

/// Everything a command needs, opened once per invocation.
#[derive(Clone)]
pub struct Device {
    pub db: Database,
    pub config: SyncConfig,
    pub replication: ReplicationService,
    pub insights: InsightService,
}

impl Device {
    /// Wires the parts together. The store must already be open.
    pub fn new(
        db: Database,
        config: SyncConfig,
        cloud: Arc<dyn CloudSlot>,
        insights: InsightService,
    ) -> Self {
        let replication = ReplicationService::new(db.clone(), cloud)
            .with_mode(config.mode())
            .with_device_id(config.device.id.clone());

        Device {
            db,
            config,
            replication,
            insights,
        }
    }

    /// A sync agent for this device that logs its events.
    pub fn agent(&self) -> SyncAgent {
        SyncAgent::with_emitter(
            self.config.clone(),
            self.replication.clone(),
            Arc::new(LogEmitter),
        )
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Runs a one-shot command. `Run` is not one-shot and is rejected here.
pub async fn execute(device: &Device, command: Command, out: &mut dyn Write) -> AppResult<()> {
    match command {
        Command::Run => return Err(AppError::usage("run is handled by the daemon loop")),
        Command::Sync => sync(device, out).await?,
        Command::Link { code } => link(device, code, out).await?,
        Command::Unlink => {
            device.replication.unlink().await?;
            writeln!(out, "✓ Unlinked. This device now works standalone.")?;
        }
        Command::Status => status(device, out).await?,
        Command::Repair => repair(device, out).await?,
        Command::Dashboard => dashboard(device, today(), out).await?,
        Command::Route { day, narrate } => route(device, day, narrate, out).await?,
        Command::Insights => {
            let data = device.db.collections().load_dataset().await?;
            let text = device.insights.inventory_insight(&data, today()).await;
            writeln!(out, "{}", text)?;
        }
        Command::Reset { full } => {
            let count = device.db.collections().reset(full).await?;
            if full {
                writeln!(out, "✓ Store wiped and re-seeded ({} records)", count)?;
            } else {
                writeln!(out, "✓ Restored {} seed records", count)?;
            }
        }
    }
    Ok(())
}

async fn sync(device: &Device, out: &mut dyn Write) -> AppResult<()> {
    let agent = device.agent();
    let outcome = agent.run_cycle().await;

    if let Some(reason) = outcome.unavailable {
        writeln!(out, "Sync skipped: {}", reason)?;
        return Ok(());
    }

    writeln!(
        out,
        "Pull: {}",
        if outcome.applied { "applied newer snapshot" } else { "up to date" }
    )?;
    match outcome.pushed {
        Some(ts) => writeln!(out, "Push: published snapshot {}", ts)?,
        None => writeln!(out, "Push: not published")?,
    }
    for error in &outcome.errors {
        writeln!(out, "error: {}", error)?;
    }
    Ok(())
}

async fn link(device: &Device, code: Option<String>, out: &mut dyn Write) -> AppResult<()> {
    let code = code.unwrap_or_else(generate_linking_code);
    let code = device.replication.link(&code).await?;
    info!(code = %code, "Linked from command line");

    writeln!(out, "✓ Linked to {}", code)?;
    writeln!(out, "  Use the same code on every device that should share this data.")?;
    Ok(())
}

async fn status(device: &Device, out: &mut dyn Write) -> AppResult<()> {
    let settings = device.db.settings();
    let linked = device.replication.linked_code().await?;
    let device_id = device.replication.device_id().await?;
    let watermark = settings.last_sync_ts().await?;
    let records = device.db.collections().load_dataset().await?.record_count();

    writeln!(out, "Device:     {} ({})", device.config.device.name, device_id)?;
    writeln!(out, "Mode:       {}", device.config.mode())?;
    writeln!(out, "Cloud:      {}", device.config.sync.cloud_url)?;
    writeln!(out, "Linked to:  {}", linked.as_deref().unwrap_or("- (standalone)"))?;
    writeln!(out, "Watermark:  {}", watermark)?;
    writeln!(out, "Records:    {}", records)?;
    Ok(())
}

async fn repair(device: &Device, out: &mut dyn Write) -> AppResult<()> {
    let corrections = device.db.customers().recompute_balances().await?;

    if corrections.is_empty() {
        writeln!(out, "✓ All customer balances match sale history")?;
        return Ok(());
    }
    for c in &corrections {
        writeln!(out, "  {}: {} -> {}", c.customer_id, c.previous, c.recomputed)?;
    }
    writeln!(out, "✓ Corrected {} balances", corrections.len())?;
    Ok(())
}

async fn dashboard(device: &Device, today: NaiveDate, out: &mut dyn Write) -> AppResult<()> {
    let data = device.db.collections().load_dataset().await?;
    let stats = reports::dashboard(&data, today);

    writeln!(out, "Sales:               {} ({} sales)", stats.total_sales, stats.sale_count)?;
    writeln!(out, "Pending collections: {}", stats.pending_collections)?;

    writeln!(out, "Stock:")?;
    for level in reports::stock_levels(&data) {
        let marker = if level.is_low() { "  LOW" } else { "" };
        writeln!(
            out,
            "  {:<28} {:>6} {} (min {}){}",
            level.name, level.stock, level.unit, level.min_stock, marker
        )?;
    }

    let expiring = reports::expiring_batches(&data, today, frigo_core::EXPIRY_WARNING_DAYS);
    writeln!(out, "Expiring within {} days: {}", frigo_core::EXPIRY_WARNING_DAYS, expiring.len())?;
    for batch in expiring {
        writeln!(
            out,
            "  {} {} x{} expires {}",
            batch.batch_code, batch.product_id, batch.current_qty, batch.expiry_date
        )?;
    }
    Ok(())
}

async fn route(device: &Device, day: u8, narrate: bool, out: &mut dyn Write) -> AppResult<()> {
    let data = device.db.collections().load_dataset().await?;
    let stops = reports::route_stops(&data, day);

    if stops.is_empty() {
        writeln!(out, "No customers to visit on day {}", day)?;
        return Ok(());
    }

    for (i, stop) in stops.iter().enumerate() {
        writeln!(
            out,
            "{:>2}. {} - {} (collect {})",
            i + 1,
            stop.business_name,
            stop.address,
            stop.balance
        )?;
    }

    if narrate {
        writeln!(out)?;
        writeln!(out, "{}", device.insights.route_narrative_from_here(&stops).await)?;
    }
    Ok(())
}
