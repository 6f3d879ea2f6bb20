//! silverstonex-util entry point: CLI dispatch over the platform accessors.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::info;

use silverstonex_platform::app::cli::{Args, Command};
use silverstonex_platform::app::logging::init_tracing;
use silverstonex_platform::platform::{FanPosition, FirmwareDevice, LedColor, Platform};
use silverstonex_platform::profile::load_or_default;
use silverstonex_platform::ComponentKind;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let profile = load_or_default(args.profile.as_deref())?;
    let platform = Platform::new(profile, args.airflow);

    match args.command {
        Command::List { json } => list_components(&platform, json).await?,
        Command::Version { component } => show_version(&platform, component).await,
        Command::Install { component, image } => install(&platform, component, &image).await?,
        Command::Fans { json } => list_fans(&platform, json).await?,
        Command::Thermals { json } => list_thermals(&platform, json).await?,
        Command::Register { register } => {
            let value = platform
                .component(ComponentKind::SysCpld)
                .read_register(&register)
                .await?;
            println!("{value}");
        }
        Command::Led { tray, color } => set_led(&platform, tray, color).await?,
        Command::Profile => println!("{}", serde_json::to_string_pretty(platform.profile())?),
        Command::Snapshot => {
            println!("{}", serde_json::to_string_pretty(&platform.snapshot().await)?)
        }
    }

    Ok(())
}

async fn list_components(platform: &Platform, json: bool) -> Result<()> {
    let reports = platform.component_reports().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    println!(
        "\x1b[32msilverstonex-util v{} ({})\x1b[0m",
        env!("CARGO_PKG_VERSION"),
        platform.profile().metadata.platform
    );
    println!();
    println!("{:<12} {:<56} VERSION", "NAME", "DESCRIPTION");
    for report in &reports {
        println!(
            "{:<12} {:<56} {}",
            report.name,
            report.description,
            report.firmware_version.as_deref().unwrap_or("N/A"),
        );
    }
    Ok(())
}

async fn show_version(platform: &Platform, component: ComponentKind) {
    let device = platform.component(component);
    match device.firmware_version().await {
        Some(version) => println!("{version}"),
        None => {
            println!("N/A");
            std::process::exit(1);
        }
    }
}

async fn install(platform: &Platform, component: ComponentKind, image: &Path) -> Result<()> {
    let device = platform.component(component);
    info!("Installing {} firmware from {}", device.name(), image.display());
    if device.install_firmware(image).await {
        println!("{} firmware install complete", device.name());
        Ok(())
    } else {
        Err(anyhow!("{} firmware install failed", device.name()))
    }
}

async fn list_fans(platform: &Platform, json: bool) -> Result<()> {
    let sensors = platform.sensor_table().await?;
    let reports = platform.fan_reports(&sensors).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    println!(
        "{:<13} {:<8} {:>6} {:>6} {:>7}  {:<9} {:<6} STATUS",
        "NAME", "PRESENT", "RPM", "SPEED", "TARGET", "DIRECTION", "LED"
    );
    for report in &reports {
        println!(
            "{:<13} {:<8} {:>6} {:>6} {:>7}  {:<9} {:<6} {}",
            report.name,
            if report.present { "yes" } else { "no" },
            display_or_dash(report.rpm),
            percent_or_dash(report.speed_percent),
            percent_or_dash(report.target_percent),
            display_or_dash(report.direction),
            display_or_dash(report.led),
            report.status.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn list_thermals(platform: &Platform, json: bool) -> Result<()> {
    let sensors = platform.sensor_table().await?;
    let reports = platform.thermal_reports(&sensors);
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    println!(
        "{:<16} {:>9} {:>9} {:>9} {:>10} {:>9}",
        "NAME", "TEMP", "HIGH", "LOW", "CRIT-HIGH", "CRIT-LOW"
    );
    for report in &reports {
        println!(
            "{:<16} {:>9} {:>9} {:>9} {:>10} {:>9}",
            report.name,
            temp_or_dash(report.temperature_c),
            temp_or_dash(report.high_threshold),
            temp_or_dash(report.low_threshold),
            temp_or_dash(report.high_critical_threshold),
            temp_or_dash(report.low_critical_threshold),
        );
    }
    Ok(())
}

async fn set_led(platform: &Platform, tray: usize, color: LedColor) -> Result<()> {
    if tray == 0 {
        return Err(anyhow!("fan trays are numbered from 1"));
    }
    let fan = platform.fan(tray - 1, FanPosition::Front)?;
    fan.set_status_led(color).await?;
    println!("FAN-{tray} status LED set to {color}");
    Ok(())
}

fn display_or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn percent_or_dash(value: Option<u8>) -> String {
    value
        .map(|v| format!("{v}%"))
        .unwrap_or_else(|| "-".to_string())
}

fn temp_or_dash(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "-".to_string())
}
