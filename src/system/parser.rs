//! Parsers for sysfs attribute content and ipmitool output.
//!
//! Everything here is pure string-to-value translation so it can be
//! exercised without hardware. Failures carry the origin of the bad data.

use crate::error::{PlatformError, PlatformResult};

/// One row of `ipmitool sensor` output.
///
/// The listing is pipe-separated: name, reading, unit, status, then the
/// threshold columns. A reading of `na` means the sensor is not reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRow {
    pub name: String,
    pub value: Option<f64>,
    pub unit: String,
    pub status: String,
}

/// Snapshot of the full sensor listing, indexed by sensor name.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    rows: Vec<SensorRow>,
}

impl SensorTable {
    /// Parse the raw `ipmitool sensor` listing. Rows with fewer than four
    /// columns are skipped rather than failing the whole table.
    pub fn parse(output: &str) -> Self {
        let rows = output.lines().filter_map(parse_sensor_row).collect();
        Self { rows }
    }

    pub fn row(&self, name: &str) -> Option<&SensorRow> {
        self.rows.iter().find(|row| row.name == name)
    }

    /// Numeric reading for a sensor, if the row exists and is reporting.
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.row(name).and_then(|row| row.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.row(name).is_some()
    }

    pub fn rows(&self) -> &[SensorRow] {
        &self.rows
    }
}

fn parse_sensor_row(line: &str) -> Option<SensorRow> {
    let cols: Vec<&str> = line.split('|').map(str::trim).collect();
    if cols.len() < 4 || cols[0].is_empty() {
        return None;
    }
    Some(SensorRow {
        name: cols[0].to_string(),
        value: cols[1].parse::<f64>().ok(),
        unit: cols[2].to_string(),
        status: cols[3].to_string(),
    })
}

/// Parse a single hex token such as `10` or `0x22` into its numeric value.
///
/// ipmitool prints raw-response bytes as bare hex without a prefix.
pub fn parse_hex_token(raw: &str, origin: &str) -> PlatformResult<u32> {
    let token = raw.trim();
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).map_err(|_| PlatformError::MalformedResponse {
        origin: origin.to_string(),
        detail: format!("expected a hex byte, got {token:?}"),
    })
}

/// Parse the BMC version response, two bytes printed as `<major> <minor>`.
///
/// The major byte is decimal on the wire; the minor byte is hex. A response
/// of `5 1a` is firmware 5.26.
pub fn parse_bmc_version(raw: &str) -> PlatformResult<String> {
    let mut tokens = raw.split_whitespace();
    let (major, minor) = match (tokens.next(), tokens.next()) {
        (Some(major), Some(minor)) => (major, minor),
        _ => {
            return Err(PlatformError::MalformedResponse {
                origin: "bmc version response".to_string(),
                detail: format!("expected two bytes, got {:?}", raw.trim()),
            })
        }
    };
    let major: u32 = major.parse().map_err(|_| PlatformError::MalformedResponse {
        origin: "bmc version response".to_string(),
        detail: format!("bad major byte {major:?}"),
    })?;
    let minor = parse_hex_token(minor, "bmc version response")?;
    Ok(format!("{major}.{minor}"))
}

/// Extract the FPGA version from its sysfs attribute.
///
/// The attribute reads like `0x0A`; the version is everything after the
/// first `x` marker. Content without the marker, or with nothing after it,
/// is malformed.
pub fn parse_fpga_version(content: &str) -> PlatformResult<String> {
    let version = content
        .split('x')
        .nth(1)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PlatformError::MalformedResponse {
            origin: "fpga version attribute".to_string(),
            detail: format!("no version marker in {:?}", content.trim()),
        })?;
    Ok(version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmc_version_mixed_radix() {
        assert_eq!(parse_bmc_version("5 1a").unwrap(), "5.26");
        assert_eq!(parse_bmc_version(" 05 00 \n").unwrap(), "5.0");
    }

    #[test]
    fn bmc_version_rejects_short_or_garbage_output() {
        assert!(parse_bmc_version("5").is_err());
        assert!(parse_bmc_version("").is_err());
        assert!(parse_bmc_version("not bytes").is_err());
    }

    #[test]
    fn hex_token_with_and_without_prefix() {
        assert_eq!(parse_hex_token("10", "test").unwrap(), 16);
        assert_eq!(parse_hex_token("0x22", "test").unwrap(), 0x22);
        assert_eq!(parse_hex_token(" ff \n", "test").unwrap(), 255);
        assert!(parse_hex_token("zz", "test").is_err());
    }

    #[test]
    fn fpga_version_follows_the_marker() {
        assert_eq!(parse_fpga_version("0x0A").unwrap(), "0A");
        assert_eq!(parse_fpga_version("version: 0x17\n").unwrap(), "17");
    }

    #[test]
    fn fpga_version_without_marker_is_malformed() {
        assert!(parse_fpga_version("1.0.3").is_err());
        assert!(parse_fpga_version("0x").is_err());
    }

    #[test]
    fn sensor_table_parses_readings_and_na() {
        let listing = "\
Fan1_Front       | 15300.000  | RPM        | ok    | na | na | na | na | na | na
Fan1_Rear        | na         | RPM        | na    | na | na | na | na | na | na
TEMP_CPU         | 38.000     | degrees C  | ok    | na | na | na | 93.000 | 103.000 | na
";
        let table = SensorTable::parse(listing);
        assert_eq!(table.value_of("Fan1_Front"), Some(15300.0));
        assert_eq!(table.value_of("Fan1_Rear"), None);
        assert!(table.contains("Fan1_Rear"));
        assert!(!table.contains("Fan9_Front"));
        let cpu = table.row("TEMP_CPU").unwrap();
        assert_eq!(cpu.unit, "degrees C");
        assert_eq!(cpu.status, "ok");
    }

    #[test]
    fn sensor_table_skips_incomplete_lines() {
        let table = SensorTable::parse("garbage line\nFan1_Front | 100.000 | RPM | ok\n");
        assert_eq!(table.rows().len(), 1);
    }
}
