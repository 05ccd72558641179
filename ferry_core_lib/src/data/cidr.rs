use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use crate::errors::FerryError;

/// An address block such as `192.168.1.0/24`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cidr {
    network: IpAddr,
    prefix_length: u8,
}

impl Cidr {
    pub fn contains(&self, address: &IpAddr) -> bool {
        match (self.network, address) {
            (IpAddr::V4(network), IpAddr::V4(address)) => {
                let mask = mask_u32(self.prefix_length);
                u32::from(network) & mask == u32::from(*address) & mask
            }
            (IpAddr::V6(network), IpAddr::V6(address)) => {
                let mask = mask_u128(self.prefix_length);
                u128::from(network) & mask == u128::from(*address) & mask
            }
            _ => false,
        }
    }
}

fn mask_u32(prefix_length: u8) -> u32 {
    match prefix_length {
        0 => 0,
        n => u32::MAX << (32 - n as u32),
    }
}

fn mask_u128(prefix_length: u8) -> u128 {
    match prefix_length {
        0 => 0,
        n => u128::MAX << (128 - n as u32),
    }
}

impl FromStr for Cidr {
    type Err = FerryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || FerryError::InvalidSetting(format!("invalid CIDR '{}'", value));

        let (address, prefix) = value.trim().split_once('/').ok_or_else(invalid)?;
        let prefix_length: u8 = prefix.parse().map_err(|_| invalid())?;

        let network = if let Ok(v4) = address.parse::<Ipv4Addr>() {
            if prefix_length > 32 {
                return Err(invalid());
            }
            IpAddr::V4(v4)
        } else if let Ok(v6) = address.parse::<Ipv6Addr>() {
            if prefix_length > 128 {
                return Err(invalid());
            }
            IpAddr::V6(v6)
        } else {
            return Err(invalid());
        };

        Ok(Cidr {
            network,
            prefix_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let cidr: Cidr = "192.168.1.0/24".parse().unwrap();

        assert!(cidr.contains(&"192.168.1.1".parse().unwrap()));
        assert!(cidr.contains(&"192.168.1.254".parse().unwrap()));
        assert!(!cidr.contains(&"192.168.2.1".parse().unwrap()));
        assert!(!cidr.contains(&"::1".parse().unwrap()));
    }

    #[test]
    fn test_zero_prefix_matches_everything() {
        let cidr: Cidr = "0.0.0.0/0".parse().unwrap();
        assert!(cidr.contains(&"8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_invalid() {
        assert!("192.168.1.0".parse::<Cidr>().is_err());
        assert!("192.168.1.0/33".parse::<Cidr>().is_err());
        assert!("lan/24".parse::<Cidr>().is_err());
    }
}
