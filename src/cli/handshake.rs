//! `certload handshake`

use crate::settings;
use anyhow::{Context, Result};
use certload_core::{format_error_for_cli, Handshake, HandshakeClient, HttpTransport};
use std::path::Path;
use std::sync::Arc;
use tokio::time::Instant;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = settings::load_config(config_path)?;
    let transport =
        Arc::new(HttpTransport::new(&config.http).context("Failed to build HTTP client")?);
    let client = HandshakeClient::new(transport, &config.endpoints);

    let started = Instant::now();
    let mut handshake = Handshake::new();
    match client.login(&mut handshake).await {
        Ok(outcome) => {
            println!("status:  {}", outcome.status);
            if let Some(wallet) = outcome.wallet() {
                println!("wallet:  {}", wallet);
            }
            match &outcome.session {
                Some(session) => println!("session: {}", session.cookie_header()),
                None => println!("session: none"),
            }
            println!("elapsed: {:.1}ms", started.elapsed().as_secs_f64() * 1000.0);
            Ok(())
        }
        Err(failure) => {
            eprintln!("handshake failed at {}", failure.at);
            eprintln!("{}", format_error_for_cli(&failure.error));
            anyhow::bail!("Handshake failed")
        }
    }
}
