//! Component firmware accessors: FPGA, CPLDs, BMCs, and BIOS.
//!
//! Each component is addressed by its fixed table index. Version reads go
//! through sysfs or raw IPMI depending on the component; installs stage the
//! image into the profile's staging directory and hand it to the flashing
//! tool. All failures surface as structured errors; the `FirmwareDevice`
//! boundary turns them into the host contract's `None`/`false`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{PlatformError, PlatformResult};
use crate::platform::FirmwareDevice;
use crate::profile::types::PlatformProfile;
use crate::system::{executor, parser};

/// Closed set of firmware-bearing components on this platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Fpga,
    SysCpld,
    SwCpld1,
    SwCpld2,
    FanCpld,
    MainBmc,
    BackupBmc,
    Bios,
}

impl ComponentKind {
    /// Component table in host index order.
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Fpga,
        ComponentKind::SysCpld,
        ComponentKind::SwCpld1,
        ComponentKind::SwCpld2,
        ComponentKind::FanCpld,
        ComponentKind::MainBmc,
        ComponentKind::BackupBmc,
        ComponentKind::Bios,
    ];

    pub fn from_index(index: usize) -> PlatformResult<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(PlatformError::IndexOutOfRange {
                index,
                count: Self::ALL.len(),
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Fpga => "FPGA",
            ComponentKind::SysCpld => "SYSCPLD",
            ComponentKind::SwCpld1 => "SWCPLD1",
            ComponentKind::SwCpld2 => "SWCPLD2",
            ComponentKind::FanCpld => "FANCPLD",
            ComponentKind::MainBmc => "Main_BMC",
            ComponentKind::BackupBmc => "Backup_BMC",
            ComponentKind::Bios => "BIOS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ComponentKind::Fpga => "Used for managering the CPU and expanding I2C channels",
            ComponentKind::SysCpld => "Used for managing the CPU",
            ComponentKind::SwCpld1 => "Used for managing QSFP+ ports (1-16)",
            ComponentKind::SwCpld2 => "Used for managing QSFP+ ports (17-32)",
            ComponentKind::FanCpld => "Used for managing fans",
            ComponentKind::MainBmc => "Main Baseboard Management Controller",
            ComponentKind::BackupBmc => "Backup Baseboard Management Controller",
            ComponentKind::Bios => "Basic Input/Output System",
        }
    }

    /// CPLDs are the only components the flashing tool can program.
    fn is_flashable(self) -> bool {
        matches!(
            self,
            ComponentKind::SysCpld
                | ComponentKind::SwCpld1
                | ComponentKind::SwCpld2
                | ComponentKind::FanCpld
        )
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|kind| kind.name()).collect();
                format!("unknown component {s:?} (expected one of {})", known.join(", "))
            })
    }
}

/// Accessor for a single component. Holds only its kind and a handle to the
/// platform profile; every read goes to the hardware.
#[derive(Debug, Clone)]
pub struct Component {
    kind: ComponentKind,
    profile: Arc<PlatformProfile>,
}

impl Component {
    pub fn new(index: usize, profile: Arc<PlatformProfile>) -> PlatformResult<Self> {
        Ok(Self {
            kind: ComponentKind::from_index(index)?,
            profile,
        })
    }

    pub fn of_kind(kind: ComponentKind, profile: Arc<PlatformProfile>) -> Self {
        Self { kind, profile }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Read the firmware version from the component's source of truth.
    pub async fn read_firmware_version(&self) -> PlatformResult<String> {
        let sysfs = &self.profile.sysfs;
        match self.kind {
            ComponentKind::Bios => read_attribute(&sysfs.bios_version).await,
            ComponentKind::SysCpld => read_attribute(&sysfs.syscpld_version).await,
            ComponentKind::SwCpld1 => read_attribute(&sysfs.swcpld1_version).await,
            ComponentKind::SwCpld2 => read_attribute(&sysfs.swcpld2_version).await,
            ComponentKind::Fpga => {
                let content = read_attribute(&sysfs.fpga_version).await?;
                parser::parse_fpga_version(&content)
            }
            ComponentKind::FanCpld => {
                let raw = executor::run_ipmi_raw(
                    &self.profile.tools.ipmitool,
                    &self.profile.ipmi.fancpld_version,
                )
                .await?;
                let version = parser::parse_hex_token(&raw, "fan cpld version response")?;
                Ok(version.to_string())
            }
            ComponentKind::MainBmc | ComponentKind::BackupBmc => {
                let bytes = if self.kind == ComponentKind::MainBmc {
                    &self.profile.ipmi.main_bmc_version
                } else {
                    &self.profile.ipmi.backup_bmc_version
                };
                let raw = executor::run_ipmi_raw(&self.profile.tools.ipmitool, bytes).await?;
                parser::parse_bmc_version(&raw)
            }
        }
    }

    /// Stage an image and run the flashing tool on it. CPLDs only; the
    /// image must exist before anything else happens.
    pub async fn run_install(&self, image: &Path) -> PlatformResult<()> {
        if !image.is_file() {
            return Err(PlatformError::ImageNotFound(image.to_path_buf()));
        }
        if !self.kind.is_flashable() {
            return Err(PlatformError::UnsupportedComponent {
                component: self.kind.name().to_string(),
                operation: "install_firmware",
            });
        }

        let staged = self.stage_image(image).await?;
        executor::run_flash_tool(&self.profile.tools.cpld_flash, &staged).await?;
        Ok(())
    }

    /// Copy the image into the staging directory under its normalized name:
    /// stem lower-cased, extension kept as-is, `.vme` appended when the
    /// image has no extension.
    async fn stage_image(&self, image: &Path) -> PlatformResult<PathBuf> {
        let stem = image.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
            PlatformError::Staging(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "image file name is not valid UTF-8",
            ))
        })?;
        let staged_name = match image.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", stem.to_lowercase(), ext),
            None => format!("{}.vme", stem.to_lowercase()),
        };
        let staged = self.profile.tools.staging_dir.join(staged_name);
        fs::copy(image, &staged).await.map_err(PlatformError::Staging)?;
        Ok(staged)
    }

    /// Read a CPLD register: write the register address to the getreg node,
    /// then read the node back.
    pub async fn read_register(&self, register: &str) -> PlatformResult<String> {
        let node = self.profile.sysfs.syscpld_getreg.as_deref().ok_or_else(|| {
            PlatformError::UnsupportedComponent {
                component: self.kind.name().to_string(),
                operation: "register access",
            }
        })?;
        fs::write(node, register)
            .await
            .map_err(|source| PlatformError::NotFound {
                path: node.to_path_buf(),
                source,
            })?;
        read_attribute(node).await
    }
}

#[async_trait]
impl FirmwareDevice for Component {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    async fn firmware_version(&self) -> Option<String> {
        match self.read_firmware_version().await {
            Ok(version) => Some(version),
            Err(err) => {
                warn!("{} firmware version unavailable: {}", self.kind, err);
                None
            }
        }
    }

    async fn install_firmware(&self, image: &Path) -> bool {
        match self.run_install(image).await {
            Ok(()) => {
                info!("{} firmware install finished: {}", self.kind, image.display());
                true
            }
            Err(err) => {
                warn!("{} firmware install failed: {}", self.kind, err);
                false
            }
        }
    }
}

/// Read and trim a sysfs attribute.
async fn read_attribute(path: &Path) -> PlatformResult<String> {
    fs::read_to_string(path)
        .await
        .map(|content| content.trim().to_string())
        .map_err(|source| PlatformError::NotFound {
            path: path.to_path_buf(),
            source,
        })
}
