//! Serde structs for the platform profile.
//! The profile carries every sysfs path, IPMI byte string, tool name, and
//! hardware table the accessors touch, so tests and board respins swap them
//! without code changes. `PlatformProfile::default()` is the Silverstone-X.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::platform::types::Airflow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub metadata: Metadata,
    pub sysfs: SysfsAttributes,
    pub ipmi: IpmiCommands,
    pub tools: Tools,
    pub fans: FanTable,
    pub thermals: Vec<ThermalSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub vendor: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Version attributes exposed by the platform kernel modules, plus the
/// optional CPLD register-access node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysfsAttributes {
    pub fpga_version: PathBuf,
    pub syscpld_version: PathBuf,
    pub swcpld1_version: PathBuf,
    pub swcpld2_version: PathBuf,
    pub bios_version: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syscpld_getreg: Option<PathBuf>,
}

/// Raw IPMI byte strings. Templates use `{{NAME}}` placeholders filled at
/// call time with hex byte values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpmiCommands {
    pub main_bmc_version: String,     // "0x32 0x8f 0x08 0x01"
    pub backup_bmc_version: String,   // "0x32 0x8f 0x08 0x02"
    pub fancpld_version: String,      // fan board id + read flag + register 0
    pub fan_direction: String,        // OEM netfn + 0x62 + tray
    pub fan_presence: String,         // OEM netfn + 0x26 0x03 + tray
    pub fan_target_speed: String,     // OEM netfn + 0x64 + board id + r/w flag + register
    pub psu_fan_target_speed: String, // OEM netfn + 0x3e + bus + address + count + speed register
    pub fan_led_get: String,          // OEM netfn + 0x39 0x01 + led id
    pub fan_led_set: String,          // OEM netfn + 0x39 0x02 + led id + color
}

/// External programs and the staging directory for firmware images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tools {
    pub ipmitool: String,
    pub cpld_flash: String,
    pub staging_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanTable {
    pub tray_count: usize,
    pub front_max_rpm: u32, // outlet rotor
    pub rear_max_rpm: u32,  // inlet rotor
    pub psu_max_rpm: u32,
    pub speed_tolerance_percent: u8,
    /// Fan CPLD target-speed register per tray, `{{REG}}` in the template.
    pub target_speed_registers: Vec<String>,
    /// LED selector of tray 1; tray N uses `led_id_base + N`.
    pub led_id_base: u8,
    pub psu_i2c_bus: String,
    pub psu_i2c_addrs: Vec<String>, // PSU1 and PSU2
}

/// Threshold table entry for one named temperature sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_threshold: Option<Threshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_threshold: Option<Threshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_critical_threshold: Option<Threshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_critical_threshold: Option<Threshold>,
}

/// A threshold in degrees C, either one value for both airflow schemes or a
/// per-airflow pair where one side may be undefined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Fixed(f64),
    ByAirflow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        b2f: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        f2b: Option<f64>,
    },
}

impl Threshold {
    pub fn fixed(value: f64) -> Self {
        Threshold::Fixed(value)
    }

    pub fn by_airflow(b2f: Option<f64>, f2b: Option<f64>) -> Self {
        Threshold::ByAirflow { b2f, f2b }
    }

    /// Value for the given airflow scheme, if defined for it.
    pub fn resolve(&self, airflow: Airflow) -> Option<f64> {
        match self {
            Threshold::Fixed(value) => Some(*value),
            Threshold::ByAirflow { b2f, f2b } => match airflow {
                Airflow::B2F => *b2f,
                Airflow::F2B => *f2b,
            },
        }
    }
}

/// Substitute `{{NAME}}` placeholders in a command byte template.
pub fn interpolate(template: &str, values: &[(&str, &str)]) -> String {
    let mut command = template.to_string();
    for (name, value) in values {
        command = command.replace(&format!("{{{{{name}}}}}"), value);
    }
    command
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self {
            metadata: Metadata {
                vendor: "Celestica".to_string(),
                platform: "x86_64-cel_silverstone-x-r0".to_string(),
                description: Some("Silverstone-X platform services".to_string()),
            },
            sysfs: SysfsAttributes {
                fpga_version: PathBuf::from("/sys/devices/platform/fpga-sys/version"),
                syscpld_version: PathBuf::from("/sys/devices/platform/sys_cpld/version"),
                swcpld1_version: PathBuf::from("/sys/bus/i2c/devices/i2c-10/10-0030/version"),
                swcpld2_version: PathBuf::from("/sys/bus/i2c/devices/i2c-10/10-0031/version"),
                bios_version: PathBuf::from("/sys/class/dmi/id/bios_version"),
                syscpld_getreg: Some(PathBuf::from("/sys/devices/platform/sys_cpld/getreg")),
            },
            ipmi: IpmiCommands {
                main_bmc_version: "0x32 0x8f 0x08 0x01".to_string(),
                backup_bmc_version: "0x32 0x8f 0x08 0x02".to_string(),
                fancpld_version: "0x3a 0x64 0x02 0x01 0x00".to_string(),
                fan_direction: "0x3a 0x62 {{TRAY}}".to_string(),
                fan_presence: "0x3a 0x26 0x03 {{TRAY}}".to_string(),
                fan_target_speed: "0x3a 0x64 0x02 0x01 {{REG}}".to_string(),
                psu_fan_target_speed: "0x3a 0x3e {{BUS}} {{ADDR}} 1 0x3b".to_string(),
                fan_led_get: "0x3a 0x39 0x01 {{LED_ID}}".to_string(),
                fan_led_set: "0x3a 0x39 0x02 {{LED_ID}} {{COLOR}}".to_string(),
            },
            tools: Tools {
                ipmitool: "ipmitool".to_string(),
                cpld_flash: "ispvm".to_string(),
                staging_dir: PathBuf::from("/tmp"),
            },
            fans: FanTable {
                tray_count: 7,
                front_max_rpm: 30200,
                rear_max_rpm: 32000,
                psu_max_rpm: 26500,
                speed_tolerance_percent: 10,
                target_speed_registers: vec![
                    "0x22".to_string(),
                    "0x32".to_string(),
                    "0x42".to_string(),
                    "0x52".to_string(),
                    "0x62".to_string(),
                    "0x72".to_string(),
                    "0x82".to_string(),
                ],
                led_id_base: 0x04,
                psu_i2c_bus: "0x06".to_string(),
                psu_i2c_addrs: vec!["0xB0".to_string(), "0xB2".to_string()],
            },
            thermals: default_thermals(),
        }
    }
}

fn thermal(name: &str) -> ThermalSpec {
    ThermalSpec {
        name: name.to_string(),
        high_threshold: None,
        low_threshold: None,
        high_critical_threshold: None,
        low_critical_threshold: None,
    }
}

/// Silverstone-X temperature sensors in listing order, with the vendor
/// threshold table. Sensors without entries report no thresholds.
fn default_thermals() -> Vec<ThermalSpec> {
    vec![
        thermal("TEMP_FB_U52"),
        ThermalSpec {
            high_threshold: Some(Threshold::by_airflow(Some(52.0), None)),
            high_critical_threshold: Some(Threshold::by_airflow(Some(57.0), None)),
            ..thermal("TEMP_FB_U17")
        },
        thermal("TEMP_SW_U2"),
        ThermalSpec {
            high_threshold: Some(Threshold::fixed(103.0)),
            ..thermal("TEMP_CPU")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(85.0)),
            ..thermal("TEMP_DIMM0")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(85.0)),
            ..thermal("TEMP_DIMM1")
        },
        ThermalSpec {
            high_threshold: Some(Threshold::fixed(105.0)),
            high_critical_threshold: Some(Threshold::fixed(111.0)),
            ..thermal("TEMP_SW_Internal")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(60.0)),
            ..thermal("PSU1_Temp1")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(113.0)),
            ..thermal("PSU1_Temp2")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::by_airflow(Some(75.0), Some(88.0))),
            ..thermal("PSU1_Temp3")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(60.0)),
            ..thermal("PSU2_Temp1")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(113.0)),
            ..thermal("PSU2_Temp2")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::by_airflow(Some(75.0), Some(88.0))),
            ..thermal("PSU2_Temp3")
        },
        ThermalSpec {
            high_threshold: Some(Threshold::by_airflow(None, Some(58.0))),
            high_critical_threshold: Some(Threshold::by_airflow(None, Some(62.0))),
            ..thermal("TEMP_SW_U52")
        },
        thermal("TEMP_SW_U16"),
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(125.0)),
            ..thermal("I89_CORE_Temp")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(125.0)),
            ..thermal("I89_AVDD_Temp")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(125.0)),
            ..thermal("QSFP_DD_Temp1")
        },
        ThermalSpec {
            high_critical_threshold: Some(Threshold::fixed(125.0)),
            ..thermal("QSFP_DD_Temp2")
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_internally_consistent() {
        let profile = PlatformProfile::default();
        assert_eq!(
            profile.fans.target_speed_registers.len(),
            profile.fans.tray_count
        );
        assert_eq!(profile.fans.psu_i2c_addrs.len(), 2);
        assert_eq!(profile.thermals.len(), 19);
    }

    #[test]
    fn default_profile_round_trips_through_json() {
        let profile = PlatformProfile::default();
        let json = serde_json::to_string_pretty(&profile).unwrap();
        let back: PlatformProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metadata.platform, profile.metadata.platform);
        assert_eq!(back.thermals.len(), profile.thermals.len());
        assert_eq!(back.ipmi.fan_led_set, profile.ipmi.fan_led_set);
    }

    #[test]
    fn airflow_thresholds_resolve_per_scheme() {
        let threshold = Threshold::by_airflow(Some(52.0), None);
        assert_eq!(threshold.resolve(Airflow::B2F), Some(52.0));
        assert_eq!(threshold.resolve(Airflow::F2B), None);
        assert_eq!(Threshold::fixed(103.0).resolve(Airflow::F2B), Some(103.0));
    }

    #[test]
    fn interpolate_fills_every_placeholder() {
        let command = interpolate(
            "0x3a 0x39 0x02 {{LED_ID}} {{COLOR}}",
            &[("LED_ID", "0x05"), ("COLOR", "0x01")],
        );
        assert_eq!(command, "0x3a 0x39 0x02 0x05 0x01");
    }
}
