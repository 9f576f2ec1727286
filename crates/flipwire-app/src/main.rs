mod settings;

use anyhow::{Context, Result};
use flipwire_core::{list_ports, Link, LinkError, Panel, Pattern, WireTap};
use std::io::Write;
use tracing_subscriber::EnvFilter;

use settings::Settings;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    log::debug!("settings: {settings:?}");

    if settings.dry_run {
        let mut panel = Panel::new(Link::from_port("dry-run", WireTap::default()));
        run(&mut panel, &settings)?;
        if let Some(tap) = panel.link().port() {
            for entry in tap.entries() {
                println!("{} {}", entry.timestamp, hex::encode_upper(&entry.data));
            }
        }
        return Ok(());
    }

    let link = match Link::open(&settings.link_config()) {
        Ok(link) => link,
        Err(e @ LinkError::LinkUnavailable { .. }) => {
            for port in list_ports() {
                log::info!("available: {} ({})", port.port_name, port.port_type);
            }
            return Err(e).context("opening panel link");
        }
        Err(e) => return Err(e).context("opening panel link"),
    };

    run_and_close(&mut Panel::new(link), &settings)
}

/// Runs the sequence and closes the link whether or not it succeeded.
fn run_and_close<P: Write>(panel: &mut Panel<P>, settings: &Settings) -> Result<()> {
    let result = run(panel, settings);
    panel.close();
    result
}

/// Black then white on every configured address.
fn run<P: Write>(panel: &mut Panel<P>, settings: &Settings) -> Result<()> {
    for &address in &settings.addresses {
        for pattern in [Pattern::Black, Pattern::White] {
            panel
                .fill(address, pattern, settings.payload_len)
                .with_context(|| format!("writing {pattern:?} to address {address}"))?;
        }
    }
    log::info!("wrote {} regions", settings.addresses.len());
    Ok(())
}
