use serde::Deserialize;

use coronet_fs::BundleFs;

use crate::error::{DeviceError, DeviceResult};

/// Bundle path of the boot configuration.
pub const BOOT_CONFIG_PATH: &str = "coronet.config";

#[derive(Debug, Clone, Deserialize)]
pub struct BootConfig {
    /// Package loaded and flushed before the game initializes. Empty
    /// means none; `boot` is the conventional name.
    #[serde(default)]
    pub boot_package: String,

    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,

    #[serde(default = "default_console_port")]
    pub port: u16,

    /// Block at boot until one console client has connected.
    #[serde(default)]
    pub wait: bool,
}

fn default_console_enabled() -> bool {
    true
}

fn default_console_port() -> u16 {
    10001
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
            port: default_console_port(),
            wait: false,
        }
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            boot_package: String::new(),
            console: ConsoleConfig::default(),
        }
    }
}

impl BootConfig {
    /// Reads [`BOOT_CONFIG_PATH`] from the bundle. A bundle without the
    /// file boots on defaults; a file that is present but does not parse
    /// is a hard error.
    pub fn load_or_default(fs: &dyn BundleFs) -> DeviceResult<Self> {
        match fs.read(BOOT_CONFIG_PATH) {
            Ok(bytes) => {
                let text = std::str::from_utf8(&bytes).map_err(|e| {
                    DeviceError::Boot(format!("{}: not utf-8: {}", BOOT_CONFIG_PATH, e))
                })?;
                let cfg: BootConfig = toml::from_str(text)
                    .map_err(|e| DeviceError::Boot(format!("parse {}: {}", BOOT_CONFIG_PATH, e)))?;
                Ok(cfg)
            }
            Err(_) => Ok(Self::default()),
        }
    }
}
