//! Platform data types: airflow, fan attributes, LED colors, and report
//! structures emitted by the utility.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chassis airflow scheme. Decides which column of the airflow-dependent
/// thermal thresholds applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Airflow {
    /// Back-to-front (reverse) airflow.
    B2F,
    /// Front-to-back (normal) airflow.
    F2B,
}

impl fmt::Display for Airflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Airflow::B2F => write!(f, "B2F"),
            Airflow::F2B => write!(f, "F2B"),
        }
    }
}

impl FromStr for Airflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "B2F" => Ok(Airflow::B2F),
            "F2B" => Ok(Airflow::F2B),
            other => Err(format!("unknown airflow {other:?} (expected B2F or F2B)")),
        }
    }
}

/// Direction a fan moves air through the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanDirection {
    Intake,
    Exhaust,
}

impl fmt::Display for FanDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanDirection::Intake => write!(f, "intake"),
            FanDirection::Exhaust => write!(f, "exhaust"),
        }
    }
}

/// Rotor position inside a fan tray. Front and rear rotors have different
/// maximum speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanPosition {
    Front,
    Rear,
}

/// Fan tray status LED color. The wire encoding is shared by the get and
/// set commands: off 0x00, green 0x01, red 0x02.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedColor {
    Off,
    Green,
    Red,
}

impl LedColor {
    /// Byte argument for the LED set command.
    pub fn command_byte(self) -> &'static str {
        match self {
            LedColor::Off => "0x00",
            LedColor::Green => "0x01",
            LedColor::Red => "0x02",
        }
    }

    /// Decode the LED get response byte.
    pub fn from_status_code(code: &str) -> Option<Self> {
        match code {
            "00" => Some(LedColor::Off),
            "01" => Some(LedColor::Green),
            "02" => Some(LedColor::Red),
            _ => None,
        }
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedColor::Off => write!(f, "off"),
            LedColor::Green => write!(f, "green"),
            LedColor::Red => write!(f, "red"),
        }
    }
}

impl FromStr for LedColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(LedColor::Off),
            "green" => Ok(LedColor::Green),
            "red" => Ok(LedColor::Red),
            other => Err(format!("unknown LED color {other:?} (expected off, green or red)")),
        }
    }
}

/// One component row in `list` output and snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentReport {
    pub name: String,
    pub description: String,
    pub firmware_version: Option<String>,
}

/// One fan row in `fans` output and snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanReport {
    pub name: String,
    pub present: bool,
    pub rpm: Option<u32>,
    pub speed_percent: Option<u8>,
    pub target_percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<FanDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led: Option<LedColor>,
    pub status: Option<String>, // "ok", "na" as reported by the sensor listing
}

/// One thermal row in `thermals` output and snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalReport {
    pub name: String,
    pub temperature_c: Option<f64>,
    pub high_threshold: Option<f64>,
    pub low_threshold: Option<f64>,
    pub high_critical_threshold: Option<f64>,
    pub low_critical_threshold: Option<f64>,
}

/// Root structure for the `snapshot` JSON dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSnapshot {
    pub metadata: SnapshotMetadata,
    pub components: Vec<ComponentReport>,
    pub fans: Vec<FanReport>,
    pub thermals: Vec<ThermalReport>,
}

/// Snapshot context: which platform, which tool build, when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub platform: String,
    pub vendor: String,
    pub tool_version: String,
    pub airflow: Airflow,
    pub timestamp: String,
}
