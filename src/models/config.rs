use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network interface the offload is attached to
    pub interface: String,

    /// Address the REST API binds to
    pub bind_address: String,

    /// Port for the REST API server
    pub port: u16,

    /// Slots per filter list, including the terminator slot
    pub list_capacity: usize,

    /// JSON descriptor with the factory default filters
    pub factory_defaults: Option<PathBuf>,

    /// Credentials used to re-associate after a commit
    pub credentials: Credentials,
}

/// Security mode of the access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    Open,
    Wpa2Psk,
    Wpa3Sae,
}

/// Credentials of the access point the link associates with
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub ssid: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub security: SecurityMode,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("security", &self.security)
            .finish()
    }
}
