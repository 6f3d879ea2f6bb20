//! Thermal sensor accessors.
//!
//! Temperatures come from the shared `ipmitool sensor` snapshot; thresholds
//! come from the profile's per-sensor table, where some entries depend on
//! the chassis airflow scheme. Thresholds are fixed by the vendor, so the
//! setters always refuse.

use std::sync::Arc;

use tracing::warn;

use crate::error::{PlatformError, PlatformResult};
use crate::platform::types::Airflow;
use crate::profile::types::{PlatformProfile, ThermalSpec};
use crate::system::parser::SensorTable;

/// Accessor for one named temperature sensor.
#[derive(Debug, Clone)]
pub struct Thermal {
    index: usize,
    airflow: Airflow,
    profile: Arc<PlatformProfile>,
}

impl Thermal {
    pub fn new(
        index: usize,
        airflow: Airflow,
        profile: Arc<PlatformProfile>,
    ) -> PlatformResult<Self> {
        if index >= profile.thermals.len() {
            return Err(PlatformError::IndexOutOfRange {
                index,
                count: profile.thermals.len(),
            });
        }
        Ok(Self {
            index,
            airflow,
            profile,
        })
    }

    fn spec(&self) -> &ThermalSpec {
        &self.profile.thermals[self.index]
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    /// Current reading in degrees C, to the nearest thousandth.
    pub fn read_temperature(&self, sensors: &SensorTable) -> PlatformResult<f64> {
        let name = self.name();
        sensors
            .value_of(name)
            .map(round_millidegree)
            .ok_or_else(|| PlatformError::MalformedResponse {
                origin: "sensor listing".to_string(),
                detail: format!("no reading for {name}"),
            })
    }

    /// Device-boundary reading: a sensor absent from the listing reports
    /// 0.0 rather than failing the caller.
    pub fn temperature(&self, sensors: &SensorTable) -> f64 {
        match self.read_temperature(sensors) {
            Ok(temperature) => temperature,
            Err(err) => {
                warn!("{} temperature unavailable: {}", self.name(), err);
                0.0
            }
        }
    }

    pub fn high_threshold(&self) -> Option<f64> {
        self.spec()
            .high_threshold
            .and_then(|t| t.resolve(self.airflow))
            .map(round_millidegree)
    }

    pub fn low_threshold(&self) -> Option<f64> {
        self.spec()
            .low_threshold
            .and_then(|t| t.resolve(self.airflow))
            .map(round_millidegree)
    }

    pub fn high_critical_threshold(&self) -> Option<f64> {
        self.spec()
            .high_critical_threshold
            .and_then(|t| t.resolve(self.airflow))
            .map(round_millidegree)
    }

    pub fn low_critical_threshold(&self) -> Option<f64> {
        self.spec()
            .low_critical_threshold
            .and_then(|t| t.resolve(self.airflow))
            .map(round_millidegree)
    }

    /// Vendor-fixed thresholds cannot be changed at runtime.
    pub async fn set_high_threshold(&self, _temperature: f64) -> PlatformResult<()> {
        Err(PlatformError::UnsupportedComponent {
            component: self.name().to_string(),
            operation: "set_high_threshold",
        })
    }

    pub async fn set_low_threshold(&self, _temperature: f64) -> PlatformResult<()> {
        Err(PlatformError::UnsupportedComponent {
            component: self.name().to_string(),
            operation: "set_low_threshold",
        })
    }

    /// A sensor is operational while it has a row with a reading.
    pub fn is_reporting(&self, sensors: &SensorTable) -> bool {
        sensors.value_of(self.name()).is_some()
    }
}

fn round_millidegree(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Arc<PlatformProfile> {
        Arc::new(PlatformProfile::default())
    }

    fn thermal_named(name: &str, airflow: Airflow) -> Thermal {
        let profile = profile();
        let index = profile
            .thermals
            .iter()
            .position(|spec| spec.name == name)
            .unwrap();
        Thermal::new(index, airflow, profile).unwrap()
    }

    fn sample_table() -> SensorTable {
        SensorTable::parse(
            "\
TEMP_CPU         | 38.125     | degrees C  | ok
TEMP_FB_U17      | 41.500     | degrees C  | ok
TEMP_SW_U2       | na         | degrees C  | na
",
        )
    }

    #[test]
    fn sensor_table_spans_the_vendor_list() {
        let profile = profile();
        assert_eq!(profile.thermals[0].name, "TEMP_FB_U52");
        assert_eq!(profile.thermals[18].name, "QSFP_DD_Temp2");
        assert!(Thermal::new(19, Airflow::B2F, profile).is_err());
    }

    #[test]
    fn temperature_reads_from_the_listing() {
        let sensor = thermal_named("TEMP_CPU", Airflow::B2F);
        assert_eq!(sensor.read_temperature(&sample_table()).unwrap(), 38.125);
    }

    #[test]
    fn missing_reading_is_zero_at_the_boundary() {
        let sensor = thermal_named("TEMP_SW_U2", Airflow::B2F);
        assert!(sensor.read_temperature(&sample_table()).is_err());
        assert_eq!(sensor.temperature(&sample_table()), 0.0);
        assert!(!sensor.is_reporting(&sample_table()));
    }

    #[test]
    fn readings_round_to_the_nearest_thousandth() {
        let table = SensorTable::parse("TEMP_CPU | 38.12567 | degrees C | ok\n");
        let sensor = thermal_named("TEMP_CPU", Airflow::B2F);
        assert_eq!(sensor.read_temperature(&table).unwrap(), 38.126);
    }

    #[test]
    fn airflow_selects_the_threshold_column() {
        let b2f = thermal_named("TEMP_FB_U17", Airflow::B2F);
        assert_eq!(b2f.high_threshold(), Some(52.0));
        assert_eq!(b2f.high_critical_threshold(), Some(57.0));

        let f2b = thermal_named("TEMP_FB_U17", Airflow::F2B);
        assert_eq!(f2b.high_threshold(), None);
        assert_eq!(f2b.high_critical_threshold(), None);

        let sw = thermal_named("TEMP_SW_U52", Airflow::F2B);
        assert_eq!(sw.high_threshold(), Some(58.0));
        assert_eq!(sw.high_critical_threshold(), Some(62.0));
    }

    #[test]
    fn fixed_thresholds_ignore_airflow() {
        for airflow in [Airflow::B2F, Airflow::F2B] {
            let cpu = thermal_named("TEMP_CPU", airflow);
            assert_eq!(cpu.high_threshold(), Some(103.0));
            assert_eq!(cpu.low_threshold(), None);
        }
        let psu = thermal_named("PSU1_Temp3", Airflow::F2B);
        assert_eq!(psu.high_critical_threshold(), Some(88.0));
    }

    #[tokio::test]
    async fn threshold_setters_are_refused() {
        let sensor = thermal_named("TEMP_CPU", Airflow::B2F);
        assert!(matches!(
            sensor.set_high_threshold(90.0).await.unwrap_err(),
            PlatformError::UnsupportedComponent { .. }
        ));
        assert!(matches!(
            sensor.set_low_threshold(5.0).await.unwrap_err(),
            PlatformError::UnsupportedComponent { .. }
        ));
    }
}
