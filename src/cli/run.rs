//! `certload run`

use super::RunArgs;
use crate::report;
use crate::settings::{self, ScenarioOverrides};
use anyhow::{Context, Result};
use certload_core::{HttpTransport, ScenarioDriver, Transport};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = settings::load_config(config_path)?;
    let overrides = ScenarioOverrides {
        rate: args.rate,
        duration_secs: args.duration,
        vus: args.vus,
    };
    let scenarios = config.select(&args.scenarios, &overrides)?;

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&config.http).context("Failed to build HTTP client")?);

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, draining in-flight iterations");
                cancel.cancel();
            }
        })
    };

    let drivers = scenarios
        .into_iter()
        .map(|scenario| {
            ScenarioDriver::new(scenario, transport.clone(), &config.endpoints)
                .map(|driver| driver.with_cancellation(cancel.clone()))
        })
        .collect::<certload_core::Result<Vec<_>>>()?;

    info!(
        scenarios = drivers.len(),
        cert_service = %config.endpoints.cert_service,
        gateway = %config.endpoints.gateway,
        "Starting load run"
    );

    let reports = futures::future::join_all(drivers.iter().map(|driver| driver.run())).await;
    watcher.abort();

    let mut failing = Vec::new();
    for (driver, report) in drivers.iter().zip(&reports) {
        let thresholds = &driver.config().thresholds;
        if args.json {
            println!("{}", report::to_json(report, thresholds)?);
        } else {
            print!("{}", report::render(report, thresholds));
        }
        if !report.meets(thresholds) {
            failing.push(report.name.clone());
        }
    }

    if !failing.is_empty() {
        anyhow::bail!("Thresholds not met: {}", failing.join(", "));
    }
    Ok(())
}
