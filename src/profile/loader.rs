//! JSON profile loader with validation.
//! Reads a platform profile from disk, checks the hardware tables for
//! consistency, and logs a one-line summary of what was loaded.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::types::PlatformProfile;

/// Load a platform profile from a JSON file and validate it.
pub fn load_profile(path: &Path) -> Result<PlatformProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {path:?}"))?;

    let profile: PlatformProfile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse profile JSON: {path:?}"))?;

    validate(&profile)?;

    info!(
        "Loaded profile: {} {} ({} fan trays, {} PSU fans, {} thermal sensors)",
        profile.metadata.vendor,
        profile.metadata.platform,
        profile.fans.tray_count,
        profile.fans.psu_i2c_addrs.len(),
        profile.thermals.len(),
    );

    Ok(profile)
}

/// Load the profile at `path` when given, otherwise fall back to the
/// built-in platform tables.
pub fn load_or_default(path: Option<&Path>) -> Result<PlatformProfile> {
    match path {
        Some(path) => load_profile(path),
        None => {
            let profile = PlatformProfile::default();
            info!(
                "Using built-in profile: {} {}",
                profile.metadata.vendor, profile.metadata.platform
            );
            Ok(profile)
        }
    }
}

fn validate(profile: &PlatformProfile) -> Result<()> {
    let fans = &profile.fans;
    if fans.target_speed_registers.len() != fans.tray_count {
        return Err(anyhow!(
            "Profile fan table is inconsistent: {} target speed registers for {} trays",
            fans.target_speed_registers.len(),
            fans.tray_count,
        ));
    }
    if fans.psu_i2c_addrs.is_empty() {
        return Err(anyhow!("Profile fan table has no PSU fan addresses"));
    }
    if profile.tools.ipmitool.is_empty() || profile.tools.cpld_flash.is_empty() {
        return Err(anyhow!("Profile tool names must not be empty"));
    }
    Ok(())
}
