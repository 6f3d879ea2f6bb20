//! Fan accessors: chassis fan trays (front and rear rotors) and PSU fans.
//!
//! Everything is read over IPMI. RPM readings come from the shared sensor
//! listing snapshot; direction, presence, target speed, and the tray status
//! LED use OEM raw commands from the profile. Fan speed is BMC-owned on
//! this platform, so `set_speed` always refuses.

use std::sync::Arc;

use tracing::warn;

use crate::error::{PlatformError, PlatformResult};
use crate::platform::types::{FanDirection, FanPosition, LedColor};
use crate::profile::types::{interpolate, PlatformProfile};
use crate::system::executor;
use crate::system::parser::{self, SensorTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FanLocation {
    Chassis { tray: usize, position: FanPosition },
    Psu { index: usize },
}

/// Accessor for one fan rotor.
#[derive(Debug, Clone)]
pub struct Fan {
    location: FanLocation,
    profile: Arc<PlatformProfile>,
}

impl Fan {
    /// Fan rotor in a chassis tray. Trays are 0-based.
    pub fn chassis(
        tray: usize,
        position: FanPosition,
        profile: Arc<PlatformProfile>,
    ) -> PlatformResult<Self> {
        if tray >= profile.fans.tray_count {
            return Err(PlatformError::IndexOutOfRange {
                index: tray,
                count: profile.fans.tray_count,
            });
        }
        Ok(Self {
            location: FanLocation::Chassis { tray, position },
            profile,
        })
    }

    /// Internal fan of a power supply. PSUs are 0-based.
    pub fn psu(index: usize, profile: Arc<PlatformProfile>) -> PlatformResult<Self> {
        if index >= profile.fans.psu_i2c_addrs.len() {
            return Err(PlatformError::IndexOutOfRange {
                index,
                count: profile.fans.psu_i2c_addrs.len(),
            });
        }
        Ok(Self {
            location: FanLocation::Psu { index },
            profile,
        })
    }

    pub fn name(&self) -> String {
        match self.location {
            FanLocation::Chassis { tray, position } => {
                let rotor = match position {
                    FanPosition::Front => "F",
                    FanPosition::Rear => "R",
                };
                format!("FAN-{}{}", tray + 1, rotor)
            }
            FanLocation::Psu { index } => format!("PSU-{} FAN-1", index + 1),
        }
    }

    pub fn is_psu_fan(&self) -> bool {
        matches!(self.location, FanLocation::Psu { .. })
    }

    /// Row name in the `ipmitool sensor` listing.
    pub fn sensor_name(&self) -> String {
        match self.location {
            FanLocation::Chassis { tray, position } => match position {
                FanPosition::Front => format!("Fan{}_Front", tray + 1),
                FanPosition::Rear => format!("Fan{}_Rear", tray + 1),
            },
            FanLocation::Psu { index } => format!("PSU{}_Fan", index + 1),
        }
    }

    fn max_rpm(&self) -> u32 {
        match self.location {
            FanLocation::Chassis { position, .. } => match position {
                FanPosition::Front => self.profile.fans.front_max_rpm,
                FanPosition::Rear => self.profile.fans.rear_max_rpm,
            },
            FanLocation::Psu { .. } => self.profile.fans.psu_max_rpm,
        }
    }

    fn chassis_tray(&self, operation: &'static str) -> PlatformResult<usize> {
        match self.location {
            FanLocation::Chassis { tray, .. } => Ok(tray),
            FanLocation::Psu { .. } => Err(PlatformError::UnsupportedComponent {
                component: self.name(),
                operation,
            }),
        }
    }

    /// Airflow direction of a chassis tray. A response byte of `01` means
    /// intake, anything else exhaust.
    pub async fn direction(&self) -> PlatformResult<FanDirection> {
        let tray = self.chassis_tray("direction")?;
        let command = interpolate(
            &self.profile.ipmi.fan_direction,
            &[("TRAY", &format!("0x{tray:02x}"))],
        );
        let raw = executor::run_ipmi_raw(&self.profile.tools.ipmitool, &command).await?;
        Ok(if raw == "01" {
            FanDirection::Intake
        } else {
            FanDirection::Exhaust
        })
    }

    /// Tray presence. The fan board answers `00` for an inserted tray.
    pub async fn presence(&self) -> PlatformResult<bool> {
        let tray = self.chassis_tray("presence")?;
        let command = interpolate(
            &self.profile.ipmi.fan_presence,
            &[("TRAY", &format!("0x{tray:02x}"))],
        );
        let raw = executor::run_ipmi_raw(&self.profile.tools.ipmitool, &command).await?;
        Ok(raw == "00")
    }

    /// Current RPM from the sensor listing, if the rotor is reporting.
    pub fn rpm(&self, sensors: &SensorTable) -> Option<u32> {
        sensors
            .value_of(&self.sensor_name())
            .map(|rpm| rpm.max(0.0) as u32)
    }

    /// Current speed as a percentage of this rotor's maximum RPM.
    pub fn speed_percent(&self, sensors: &SensorTable) -> PlatformResult<u8> {
        let name = self.sensor_name();
        let rpm = sensors
            .value_of(&name)
            .ok_or_else(|| PlatformError::MalformedResponse {
                origin: "sensor listing".to_string(),
                detail: format!("no reading for {name}"),
            })?;
        let percent = (rpm.max(0.0) / self.max_rpm() as f64) * 100.0;
        Ok((percent as u32).min(100) as u8)
    }

    /// Commanded speed as a percentage. Chassis trays report a 0-255 PWM
    /// byte from the fan CPLD; PSU fans report a percent directly.
    pub async fn target_speed_percent(&self) -> PlatformResult<u8> {
        match self.location {
            FanLocation::Chassis { tray, .. } => {
                let register = &self.profile.fans.target_speed_registers[tray];
                let command =
                    interpolate(&self.profile.ipmi.fan_target_speed, &[("REG", register)]);
                let raw = executor::run_ipmi_raw(&self.profile.tools.ipmitool, &command).await?;
                let pwm = parser::parse_hex_token(&raw, "fan target speed response")?;
                Ok(((pwm as f64 * 100.0 / 255.0).round() as u32).min(100) as u8)
            }
            FanLocation::Psu { index } => {
                let command = interpolate(
                    &self.profile.ipmi.psu_fan_target_speed,
                    &[
                        ("BUS", self.profile.fans.psu_i2c_bus.as_str()),
                        ("ADDR", self.profile.fans.psu_i2c_addrs[index].as_str()),
                    ],
                );
                let raw = executor::run_ipmi_raw(&self.profile.tools.ipmitool, &command).await?;
                let percent = parser::parse_hex_token(&raw, "psu fan target speed response")?;
                Ok(percent.min(100) as u8)
            }
        }
    }

    /// Percent of variance from the target speed considered tolerable.
    pub fn speed_tolerance_percent(&self) -> u8 {
        self.profile.fans.speed_tolerance_percent
    }

    /// The BMC owns fan control on this platform.
    pub async fn set_speed(&self, _percent: u8) -> PlatformResult<()> {
        Err(PlatformError::UnsupportedComponent {
            component: self.name(),
            operation: "set_speed",
        })
    }

    /// Tray status LED color.
    pub async fn status_led(&self) -> PlatformResult<LedColor> {
        let tray = self.chassis_tray("status LED")?;
        let command = interpolate(
            &self.profile.ipmi.fan_led_get,
            &[("LED_ID", &self.led_id(tray))],
        );
        let raw = executor::run_ipmi_raw(&self.profile.tools.ipmitool, &command).await?;
        LedColor::from_status_code(&raw).ok_or_else(|| PlatformError::MalformedResponse {
            origin: "fan led response".to_string(),
            detail: format!("unknown color code {raw:?}"),
        })
    }

    /// Drive the tray status LED. The BMC must have LED control in manual
    /// mode for the write to stick.
    pub async fn set_status_led(&self, color: LedColor) -> PlatformResult<()> {
        let tray = self.chassis_tray("status LED")?;
        let command = interpolate(
            &self.profile.ipmi.fan_led_set,
            &[("LED_ID", &self.led_id(tray)), ("COLOR", color.command_byte())],
        );
        executor::run_ipmi_raw(&self.profile.tools.ipmitool, &command).await?;
        Ok(())
    }

    fn led_id(&self, tray: usize) -> String {
        format!("0x{:02x}", self.profile.fans.led_id_base as usize + tray)
    }

    pub fn model(&self) -> &'static str {
        // No fan FRU on this platform.
        "Unknown"
    }

    pub fn serial(&self) -> &'static str {
        "Unknown"
    }

    /// Presence at the report boundary. Chassis trays answer over IPMI and
    /// an IPMI failure counts as absent; PSU fans count as present while
    /// their sensor row exists.
    pub async fn present_in(&self, sensors: &SensorTable) -> bool {
        match self.location {
            FanLocation::Chassis { .. } => match self.presence().await {
                Ok(present) => present,
                Err(err) => {
                    warn!("{} presence check failed: {}", self.name(), err);
                    false
                }
            },
            FanLocation::Psu { .. } => sensors.contains(&self.sensor_name()),
        }
    }

    /// Operational check: the rotor is there and spinning.
    pub async fn is_operational(&self, sensors: &SensorTable) -> bool {
        self.present_in(sensors).await && self.rpm(sensors).unwrap_or(0) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_stub(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn profile_with_ipmitool(dir: &Path, body: &str) -> Arc<PlatformProfile> {
        let mut profile = PlatformProfile::default();
        profile.tools.ipmitool = write_stub(dir, "ipmitool", body);
        Arc::new(profile)
    }

    fn sample_table() -> SensorTable {
        SensorTable::parse(
            "\
Fan1_Front       | 15300.000  | RPM        | ok
Fan1_Rear        | 16000.000  | RPM        | ok
Fan3_Front       | na         | RPM        | na
PSU1_Fan         | 13250.000  | RPM        | ok
",
        )
    }

    #[test]
    fn fan_names_cover_trays_and_psus() {
        let profile = Arc::new(PlatformProfile::default());
        let first = Fan::chassis(0, FanPosition::Front, profile.clone()).unwrap();
        let last = Fan::chassis(6, FanPosition::Rear, profile.clone()).unwrap();
        let psu = Fan::psu(1, profile.clone()).unwrap();
        assert_eq!(first.name(), "FAN-1F");
        assert_eq!(last.name(), "FAN-7R");
        assert_eq!(psu.name(), "PSU-2 FAN-1");
        assert!(Fan::chassis(7, FanPosition::Front, profile.clone()).is_err());
        assert!(Fan::psu(2, profile).is_err());
    }

    #[test]
    fn speed_is_a_percentage_of_the_rotor_maximum() {
        let profile = Arc::new(PlatformProfile::default());
        let table = sample_table();

        let front = Fan::chassis(0, FanPosition::Front, profile.clone()).unwrap();
        assert_eq!(front.speed_percent(&table).unwrap(), 50); // 15300 / 30200
        assert_eq!(front.rpm(&table), Some(15300));

        let rear = Fan::chassis(0, FanPosition::Rear, profile.clone()).unwrap();
        assert_eq!(rear.speed_percent(&table).unwrap(), 50); // 16000 / 32000

        let psu = Fan::psu(0, profile).unwrap();
        assert_eq!(psu.speed_percent(&table).unwrap(), 50); // 13250 / 26500
    }

    #[test]
    fn unreported_rotor_has_no_speed() {
        let profile = Arc::new(PlatformProfile::default());
        let table = sample_table();
        let stale = Fan::chassis(2, FanPosition::Front, profile).unwrap();
        assert_eq!(stale.rpm(&table), None);
        assert!(stale.speed_percent(&table).is_err());
    }

    #[tokio::test]
    async fn direction_decodes_the_intake_byte() {
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with_ipmitool(dir.path(), "echo '01'");
        let fan = Fan::chassis(0, FanPosition::Front, profile).unwrap();
        assert_eq!(fan.direction().await.unwrap(), FanDirection::Intake);

        let profile = profile_with_ipmitool(dir.path(), "echo '00'");
        let fan = Fan::chassis(0, FanPosition::Front, profile).unwrap();
        assert_eq!(fan.direction().await.unwrap(), FanDirection::Exhaust);
    }

    #[tokio::test]
    async fn presence_means_a_zero_response() {
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with_ipmitool(dir.path(), "echo '00'");
        let fan = Fan::chassis(3, FanPosition::Rear, profile).unwrap();
        assert!(fan.presence().await.unwrap());

        let profile = profile_with_ipmitool(dir.path(), "echo '01'");
        let fan = Fan::chassis(3, FanPosition::Rear, profile).unwrap();
        assert!(!fan.presence().await.unwrap());
    }

    #[tokio::test]
    async fn chassis_target_speed_scales_the_pwm_byte() {
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with_ipmitool(dir.path(), "echo '7f'");
        let fan = Fan::chassis(1, FanPosition::Front, profile).unwrap();
        assert_eq!(fan.target_speed_percent().await.unwrap(), 50); // round(127 * 100 / 255)
    }

    #[tokio::test]
    async fn psu_target_speed_is_already_a_percent() {
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with_ipmitool(dir.path(), "echo '46'");
        let fan = Fan::psu(0, profile).unwrap();
        assert_eq!(fan.target_speed_percent().await.unwrap(), 70); // 0x46
    }

    #[tokio::test]
    async fn led_state_decodes_the_color_byte() {
        let dir = tempfile::tempdir().unwrap();
        let profile = profile_with_ipmitool(dir.path(), "echo '01'");
        let fan = Fan::chassis(0, FanPosition::Front, profile).unwrap();
        assert_eq!(fan.status_led().await.unwrap(), LedColor::Green);

        let profile = profile_with_ipmitool(dir.path(), "echo '7f'");
        let fan = Fan::chassis(0, FanPosition::Front, profile).unwrap();
        assert!(matches!(
            fan.status_led().await.unwrap_err(),
            PlatformError::MalformedResponse { .. }
        ));
    }

    #[tokio::test]
    async fn led_set_addresses_the_tray_selector() {
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args");
        let profile = profile_with_ipmitool(
            dir.path(),
            &format!("echo \"$@\" > {}", args_file.display()),
        );
        let fan = Fan::chassis(1, FanPosition::Front, profile).unwrap();
        fan.set_status_led(LedColor::Red).await.unwrap();

        let args = std::fs::read_to_string(&args_file).unwrap();
        assert!(args.contains("0x39 0x02 0x05 0x02"), "{args}");
    }

    #[tokio::test]
    async fn psu_fans_have_no_tray_operations() {
        let profile = Arc::new(PlatformProfile::default());
        let fan = Fan::psu(0, profile).unwrap();
        assert!(matches!(
            fan.direction().await.unwrap_err(),
            PlatformError::UnsupportedComponent { .. }
        ));
        assert!(matches!(
            fan.status_led().await.unwrap_err(),
            PlatformError::UnsupportedComponent { .. }
        ));
    }

    #[tokio::test]
    async fn speed_control_is_refused() {
        let profile = Arc::new(PlatformProfile::default());
        let fan = Fan::chassis(0, FanPosition::Front, profile).unwrap();
        assert!(matches!(
            fan.set_speed(50).await.unwrap_err(),
            PlatformError::UnsupportedComponent { .. }
        ));
    }

    #[tokio::test]
    async fn operational_means_present_and_spinning() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();

        let profile = profile_with_ipmitool(dir.path(), "echo '00'");
        let fan = Fan::chassis(0, FanPosition::Front, profile.clone()).unwrap();
        assert!(fan.is_operational(&table).await);

        // Present but the rotor is not reporting.
        let stale = Fan::chassis(2, FanPosition::Front, profile).unwrap();
        assert!(!stale.is_operational(&table).await);

        let psu_profile = Arc::new(PlatformProfile::default());
        let psu = Fan::psu(0, psu_profile.clone()).unwrap();
        assert!(psu.is_operational(&table).await);
        let psu2 = Fan::psu(1, psu_profile).unwrap();
        assert!(!psu2.is_operational(&table).await);
    }

    #[test]
    fn fru_identity_is_not_available() {
        let profile = Arc::new(PlatformProfile::default());
        let fan = Fan::chassis(0, FanPosition::Front, profile).unwrap();
        assert_eq!(fan.model(), "Unknown");
        assert_eq!(fan.serial(), "Unknown");
        assert_eq!(fan.speed_tolerance_percent(), 10);
    }
}
