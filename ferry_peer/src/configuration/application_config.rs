use std::{io, net::IpAddr, path::Path, path::PathBuf, time::Duration};

use ferry_core_lib::{data::Settings, FerryError, Result};
use serde::{Deserialize, Serialize};

/// YAML view of [`Settings`]. Every field is optional; what a file leaves out
/// falls back to the defaults.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub server_name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub local_ip: Option<String>,
    pub public_ip: Option<String>,
    pub buffer_size: Option<usize>,
    pub socket_timeout_ms: Option<u64>,
    pub transfer_retry_limit: Option<u32>,
    pub retry_lockout_secs: Option<u64>,
    pub stall_timeout_ms: Option<u64>,
    pub progress_interval: Option<f32>,
    pub transfer_folder: Option<String>,
    pub lan_cidr: Option<String>,
    pub auto_accept_inbound: Option<bool>,
}

impl ApplicationConfig {
    /// Reads `path` and merges it over the defaults. A missing file means
    /// defaults only.
    pub fn build(path: &Path) -> Result<ApplicationConfig> {
        let yaml = match std::fs::read_to_string(path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(ApplicationConfig::get_defaults());
            }
            Err(e) => return Err(e.into()),
        };

        ApplicationConfig::from_yaml(&yaml)
    }

    pub fn from_yaml(yaml: &str) -> Result<ApplicationConfig> {
        let user_config: ApplicationConfig = serde_yaml::from_str(yaml)
            .map_err(|e| FerryError::InvalidSetting(format!("config: {}", e)))?;

        Ok(ApplicationConfig::get_defaults().merge(user_config))
    }

    pub fn merge(self, other: ApplicationConfig) -> Self {
        Self {
            server_name: other.server_name.or(self.server_name),
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            local_ip: other.local_ip.or(self.local_ip),
            public_ip: other.public_ip.or(self.public_ip),
            buffer_size: other.buffer_size.or(self.buffer_size),
            socket_timeout_ms: other.socket_timeout_ms.or(self.socket_timeout_ms),
            transfer_retry_limit: other.transfer_retry_limit.or(self.transfer_retry_limit),
            retry_lockout_secs: other.retry_lockout_secs.or(self.retry_lockout_secs),
            stall_timeout_ms: other.stall_timeout_ms.or(self.stall_timeout_ms),
            progress_interval: other.progress_interval.or(self.progress_interval),
            transfer_folder: other.transfer_folder.or(self.transfer_folder),
            lan_cidr: other.lan_cidr.or(self.lan_cidr),
            auto_accept_inbound: other.auto_accept_inbound.or(self.auto_accept_inbound),
        }
    }

    pub fn get_defaults() -> ApplicationConfig {
        let defaults = Settings::default();

        ApplicationConfig {
            server_name: Some(defaults.server_name),
            host: Some(defaults.listen_host.to_string()),
            port: Some(defaults.listen_port),
            local_ip: Some(defaults.local_ip.to_string()),
            public_ip: Some(defaults.public_ip.to_string()),
            buffer_size: Some(defaults.buffer_size),
            socket_timeout_ms: Some(defaults.socket_timeout.as_millis() as u64),
            transfer_retry_limit: Some(defaults.transfer_retry_limit),
            retry_lockout_secs: Some(defaults.retry_lockout.as_secs()),
            stall_timeout_ms: Some(defaults.stall_timeout.as_millis() as u64),
            progress_interval: Some(defaults.progress_interval),
            transfer_folder: Some(defaults.transfer_folder.display().to_string()),
            lan_cidr: Some(defaults.lan_cidr),
            auto_accept_inbound: Some(defaults.auto_accept_inbound),
        }
    }

    /// Converts into validated settings. Fields still unset take the
    /// [`Settings`] defaults.
    pub fn into_settings(self) -> Result<Settings> {
        let defaults = Settings::default();

        let settings = Settings {
            server_name: self.server_name.unwrap_or(defaults.server_name),
            listen_host: parse_ip("host", self.host)?.unwrap_or(defaults.listen_host),
            listen_port: self.port.unwrap_or(defaults.listen_port),
            local_ip: parse_ip("local_ip", self.local_ip)?.unwrap_or(defaults.local_ip),
            public_ip: parse_ip("public_ip", self.public_ip)?.unwrap_or(defaults.public_ip),
            buffer_size: self.buffer_size.unwrap_or(defaults.buffer_size),
            socket_timeout: self
                .socket_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.socket_timeout),
            transfer_retry_limit: self
                .transfer_retry_limit
                .unwrap_or(defaults.transfer_retry_limit),
            retry_lockout: self
                .retry_lockout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_lockout),
            stall_timeout: self
                .stall_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.stall_timeout),
            progress_interval: self.progress_interval.unwrap_or(defaults.progress_interval),
            transfer_folder: self
                .transfer_folder
                .map(PathBuf::from)
                .unwrap_or(defaults.transfer_folder),
            lan_cidr: self.lan_cidr.unwrap_or(defaults.lan_cidr),
            auto_accept_inbound: self.auto_accept_inbound.unwrap_or(defaults.auto_accept_inbound),
        };

        settings.validate()?;
        Ok(settings)
    }
}

fn parse_ip(field: &str, value: Option<String>) -> Result<Option<IpAddr>> {
    value
        .map(|value| {
            value.parse().map_err(|_| {
                FerryError::InvalidSetting(format!("{}: '{}' is not an IP address", field, value))
            })
        })
        .transpose()
}
