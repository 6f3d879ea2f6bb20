//! External tool executor.
//! Spawns ipmitool and the CPLD flashing utility as one-shot subprocesses.

use std::path::Path;

use tracing::debug;

use crate::error::{PlatformError, PlatformResult};

/// Build an ipmitool invocation against the local BMC via /dev/ipmi0.
/// The program name comes from the profile so tests can point it at a stub.
fn build_ipmi_command(ipmitool: &str) -> std::process::Command {
    let mut cmd = std::process::Command::new(ipmitool);
    cmd.args(["-I", "open"]);
    cmd
}

/// Execute `ipmitool raw <bytes>` and return the trimmed response bytes.
pub async fn run_ipmi_raw(ipmitool: &str, bytes: &str) -> PlatformResult<String> {
    let mut cmd = build_ipmi_command(ipmitool);
    cmd.arg("raw");
    for byte in bytes.split_whitespace() {
        cmd.arg(byte);
    }

    debug!("Executing: {} raw {}", ipmitool, bytes);
    run(cmd, ipmitool).await
}

/// Execute `ipmitool sensor` and return the full pipe-separated listing.
pub async fn run_ipmi_sensor(ipmitool: &str) -> PlatformResult<String> {
    let mut cmd = build_ipmi_command(ipmitool);
    cmd.arg("sensor");

    debug!("Executing: {} sensor", ipmitool);
    run(cmd, ipmitool).await
}

/// Execute the CPLD flashing tool against a staged image.
pub async fn run_flash_tool(tool: &str, image: &Path) -> PlatformResult<String> {
    let mut cmd = std::process::Command::new(tool);
    cmd.arg(image);

    debug!("Executing: {} {}", tool, image.display());
    run(cmd, tool).await
}

async fn run(cmd: std::process::Command, tool: &str) -> PlatformResult<String> {
    let output = tokio::process::Command::from(cmd)
        .output()
        .await
        .map_err(|err| PlatformError::ToolExecutionFailed {
            tool: tool.to_string(),
            detail: format!("failed to spawn: {err}"),
        })?;

    if !output.status.success() {
        return Err(PlatformError::ToolExecutionFailed {
            tool: tool.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
