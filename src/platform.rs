//! Platform device surface: component, fan, and thermal accessors over one
//! shared profile.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

pub mod component;
pub mod fan;
pub mod thermal;
pub mod types;

pub use component::{Component, ComponentKind};
pub use fan::Fan;
pub use thermal::Thermal;
pub use types::{Airflow, FanDirection, FanPosition, LedColor};

use crate::error::{PlatformError, PlatformResult};
use crate::profile::types::PlatformProfile;
use crate::system::executor;
use crate::system::parser::SensorTable;
use types::{ComponentReport, FanReport, PlatformSnapshot, SnapshotMetadata, ThermalReport};

/// Host-facing firmware contract implemented by every component accessor.
#[async_trait]
pub trait FirmwareDevice: Send + Sync {
    /// Component name as reported to the host.
    fn name(&self) -> &str;

    /// One-line hardware description.
    fn description(&self) -> &str;

    /// Firmware version, or None when the component cannot be read.
    async fn firmware_version(&self) -> Option<String>;

    /// Flash a firmware image. True only when the install completed.
    async fn install_firmware(&self, image: &Path) -> bool;
}

/// Entry point tying the accessors to one profile and airflow scheme.
pub struct Platform {
    profile: Arc<PlatformProfile>,
    airflow: Airflow,
}

impl Platform {
    pub fn new(profile: PlatformProfile, airflow: Airflow) -> Self {
        Self {
            profile: Arc::new(profile),
            airflow,
        }
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn airflow(&self) -> Airflow {
        self.airflow
    }

    pub fn component(&self, kind: ComponentKind) -> Component {
        Component::of_kind(kind, self.profile.clone())
    }

    /// All components in host index order.
    pub fn components(&self) -> Vec<Component> {
        ComponentKind::ALL
            .iter()
            .map(|kind| Component::of_kind(*kind, self.profile.clone()))
            .collect()
    }

    /// One chassis fan rotor. Trays are 0-based.
    pub fn fan(&self, tray: usize, position: FanPosition) -> PlatformResult<Fan> {
        Fan::chassis(tray, position, self.profile.clone())
    }

    /// One PSU fan. PSUs are 0-based.
    pub fn psu_fan(&self, index: usize) -> PlatformResult<Fan> {
        Fan::psu(index, self.profile.clone())
    }

    /// All fans: front and rear rotor per tray, then the PSU fans.
    pub fn fans(&self) -> Vec<Fan> {
        let mut fans = Vec::new();
        for tray in 0..self.profile.fans.tray_count {
            for position in [FanPosition::Front, FanPosition::Rear] {
                fans.extend(Fan::chassis(tray, position, self.profile.clone()));
            }
        }
        for psu in 0..self.profile.fans.psu_i2c_addrs.len() {
            fans.extend(Fan::psu(psu, self.profile.clone()));
        }
        fans
    }

    /// All thermal sensors in listing order.
    pub fn thermals(&self) -> Vec<Thermal> {
        (0..self.profile.thermals.len())
            .flat_map(|index| Thermal::new(index, self.airflow, self.profile.clone()))
            .collect()
    }

    /// One `ipmitool sensor` run shared by fan and thermal queries.
    pub async fn sensor_table(&self) -> PlatformResult<SensorTable> {
        let listing = executor::run_ipmi_sensor(&self.profile.tools.ipmitool).await?;
        Ok(SensorTable::parse(&listing))
    }

    pub async fn component_reports(&self) -> Vec<ComponentReport> {
        let mut reports = Vec::new();
        for component in self.components() {
            reports.push(ComponentReport {
                name: component.name().to_string(),
                description: component.description().to_string(),
                firmware_version: component.firmware_version().await,
            });
        }
        reports
    }

    pub async fn fan_reports(&self, sensors: &SensorTable) -> Vec<FanReport> {
        let mut reports = Vec::new();
        for fan in self.fans() {
            let name = fan.name();
            reports.push(FanReport {
                present: fan.present_in(sensors).await,
                rpm: fan.rpm(sensors),
                speed_percent: fan.speed_percent(sensors).ok(),
                target_percent: ok_or_log(fan.target_speed_percent().await, &name, "target speed"),
                direction: ok_or_log(fan.direction().await, &name, "direction"),
                led: ok_or_log(fan.status_led().await, &name, "status LED"),
                status: sensors.row(&fan.sensor_name()).map(|row| row.status.clone()),
                name,
            });
        }
        reports
    }

    pub fn thermal_reports(&self, sensors: &SensorTable) -> Vec<ThermalReport> {
        self.thermals()
            .iter()
            .map(|thermal| ThermalReport {
                name: thermal.name().to_string(),
                temperature_c: thermal.read_temperature(sensors).ok(),
                high_threshold: thermal.high_threshold(),
                low_threshold: thermal.low_threshold(),
                high_critical_threshold: thermal.high_critical_threshold(),
                low_critical_threshold: thermal.low_critical_threshold(),
            })
            .collect()
    }

    /// Full platform dump. A failed sensor listing degrades to empty fan
    /// and thermal readings instead of failing the snapshot.
    pub async fn snapshot(&self) -> PlatformSnapshot {
        let sensors = match self.sensor_table().await {
            Ok(table) => table,
            Err(err) => {
                warn!("sensor listing unavailable: {}", err);
                SensorTable::default()
            }
        };
        PlatformSnapshot {
            metadata: SnapshotMetadata {
                platform: self.profile.metadata.platform.clone(),
                vendor: self.profile.metadata.vendor.clone(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                airflow: self.airflow,
                timestamp: chrono::Local::now().to_rfc3339(),
            },
            components: self.component_reports().await,
            fans: self.fan_reports(&sensors).await,
            thermals: self.thermal_reports(&sensors),
        }
    }
}

/// Report-boundary helper: unsupported operations stay quiet, real
/// failures get logged once.
fn ok_or_log<T>(result: PlatformResult<T>, device: &str, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(PlatformError::UnsupportedComponent { .. }) => None,
        Err(err) => {
            warn!("{} {} unavailable: {}", device, what, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_stub(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn platform() -> Platform {
        Platform::new(PlatformProfile::default(), Airflow::B2F)
    }

    #[test]
    fn device_inventory_matches_the_platform() {
        let platform = platform();
        assert_eq!(platform.components().len(), 8);
        assert_eq!(platform.fans().len(), 16); // 7 trays x 2 rotors + 2 PSU fans
        assert_eq!(platform.thermals().len(), 19);

        let names: Vec<String> = platform.fans().iter().map(Fan::name).collect();
        assert_eq!(names[0], "FAN-1F");
        assert_eq!(names[1], "FAN-1R");
        assert_eq!(names[14], "PSU-1 FAN-1");
        assert_eq!(names[15], "PSU-2 FAN-1");
    }

    #[test]
    fn component_lookup_by_kind() {
        let platform = platform();
        assert_eq!(platform.component(ComponentKind::FanCpld).name(), "FANCPLD");
    }

    #[tokio::test]
    async fn sensor_table_comes_from_one_listing() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = PlatformProfile::default();
        profile.tools.ipmitool = write_stub(
            dir.path(),
            "ipmitool",
            "printf 'Fan1_Front       | 15300.000  | RPM        | ok\\nTEMP_CPU         | 38.000     | degrees C  | ok\\n'",
        );
        let platform = Platform::new(profile, Airflow::B2F);

        let table = platform.sensor_table().await.unwrap();
        assert_eq!(table.value_of("Fan1_Front"), Some(15300.0));
        assert_eq!(table.value_of("TEMP_CPU"), Some(38.0));
    }

    #[tokio::test]
    async fn fan_reports_survive_an_unreachable_bmc() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = PlatformProfile::default();
        profile.tools.ipmitool =
            write_stub(dir.path(), "ipmitool", "echo 'could not open device' >&2; exit 1");
        let platform = Platform::new(profile, Airflow::B2F);

        let reports = platform.fan_reports(&SensorTable::default()).await;
        assert_eq!(reports.len(), 16);
        for report in &reports {
            assert!(!report.present);
            assert_eq!(report.speed_percent, None);
            assert_eq!(report.target_percent, None);
        }
    }

    #[test]
    fn thermal_reports_carry_thresholds_without_readings() {
        let platform = platform();
        let reports = platform.thermal_reports(&SensorTable::default());
        assert_eq!(reports.len(), 19);

        let cpu = reports.iter().find(|r| r.name == "TEMP_CPU").unwrap();
        assert_eq!(cpu.temperature_c, None);
        assert_eq!(cpu.high_threshold, Some(103.0));
    }
}
