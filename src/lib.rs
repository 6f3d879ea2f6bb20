//! Platform services for the Celestica Silverstone-X switch.
//!
//! Accessors for the fixed set of firmware-bearing components (FPGA, CPLDs,
//! BMCs, BIOS), the chassis and PSU fans, and the thermal sensors. Data
//! comes from sysfs attributes and raw IPMI commands; CPLD images flash
//! through the vendor tool. All hardware addressing lives in a swappable
//! [`profile::PlatformProfile`], so tests and board respins replace paths,
//! byte strings, and tool names without code changes.

pub mod app;
pub mod error;
pub mod platform;
pub mod profile;
pub mod system;

pub use error::{PlatformError, PlatformResult};
pub use platform::{Component, ComponentKind, Fan, FirmwareDevice, Platform, Thermal};
pub use profile::PlatformProfile;
