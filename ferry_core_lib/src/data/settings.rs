use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
    time::Duration,
};

use crate::errors::{FerryError, Result};

use super::Cidr;

/// Immutable runtime settings handed to every component at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub server_name: String,
    pub listen_host: IpAddr,
    /// 0 binds an ephemeral port.
    pub listen_port: u16,
    pub local_ip: IpAddr,
    pub public_ip: IpAddr,
    pub buffer_size: usize,
    pub socket_timeout: Duration,
    pub transfer_retry_limit: u32,
    pub retry_lockout: Duration,
    pub stall_timeout: Duration,
    /// Fraction of the file size between two progress events.
    pub progress_interval: f32,
    pub transfer_folder: PathBuf,
    pub lan_cidr: String,
    pub auto_accept_inbound: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server_name: "ferry".to_string(),
            listen_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 7777,
            local_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            public_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            buffer_size: 8192,
            socket_timeout: Duration::from_secs(5),
            transfer_retry_limit: 3,
            retry_lockout: Duration::from_secs(10 * 60),
            stall_timeout: Duration::from_secs(5),
            progress_interval: 0.1,
            transfer_folder: PathBuf::from("./files"),
            lan_cidr: "192.168.0.0/16".to_string(),
            auto_accept_inbound: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(FerryError::InvalidSetting("buffer size must be positive".to_string()));
        }

        if !(self.progress_interval > 0.0 && self.progress_interval <= 1.0) {
            return Err(FerryError::InvalidSetting(format!(
                "progress interval {} must be within (0, 1]",
                self.progress_interval
            )));
        }

        if self.stall_timeout.is_zero() {
            return Err(FerryError::InvalidSetting("stall timeout must be positive".to_string()));
        }

        self.lan()?;
        Ok(())
    }

    /// The configured LAN block. An empty string disables LAN detection.
    pub fn lan(&self) -> Result<Option<Cidr>> {
        if self.lan_cidr.trim().is_empty() {
            return Ok(None);
        }
        self.lan_cidr.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let settings = Settings {
            buffer_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            progress_interval: 1.5,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            lan_cidr: "not a cidr".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_lan_disables_detection() {
        let settings = Settings {
            lan_cidr: String::new(),
            ..Settings::default()
        };
        assert!(settings.lan().unwrap().is_none());
    }
}
