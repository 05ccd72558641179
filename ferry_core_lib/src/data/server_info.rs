use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
};

use super::{requests::SenderEndpoint, Cidr};

/// A peer's identity as far as the transfer protocol is concerned.
#[derive(Clone, Debug)]
pub struct ServerInfo {
    pub name: String,
    pub local_ip: IpAddr,
    pub public_ip: IpAddr,
    /// The address used to reach this peer for the current session.
    pub session_ip: IpAddr,
    pub port: u16,
    pub platform: String,
    pub transfer_folder: String,
}

impl ServerInfo {
    pub fn new(ip: IpAddr, port: u16) -> ServerInfo {
        ServerInfo {
            name: String::new(),
            local_ip: ip,
            public_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            session_ip: ip,
            port,
            platform: String::new(),
            transfer_folder: String::new(),
        }
    }

    /// Builds the identity of whoever sent a request. The session address is
    /// the sender's LAN address when it sits inside `lan`, its public address
    /// otherwise.
    pub fn from_sender(sender: &SenderEndpoint, lan: Option<&Cidr>) -> ServerInfo {
        let mut server_info = ServerInfo::new(sender.local_ip, sender.port);
        server_info.public_ip = sender.public_ip;
        server_info.session_ip = server_info.choose_session_ip(lan);
        server_info
    }

    pub fn choose_session_ip(&self, lan: Option<&Cidr>) -> IpAddr {
        let on_lan = lan.map_or(false, |cidr| cidr.contains(&self.local_ip));

        if on_lan || self.public_ip.is_unspecified() {
            self.local_ip
        } else {
            self.public_ip
        }
    }

    pub fn session_address(&self) -> SocketAddr {
        SocketAddr::new(self.session_ip, self.port)
    }

    /// Same port, and any known address on one side equals any on the other.
    pub fn is_same_peer(&self, other: &ServerInfo) -> bool {
        if self.port != other.port {
            return false;
        }

        let ours = self.known_addresses();
        let theirs = other.known_addresses();
        ours.iter().any(|ip| theirs.contains(ip))
    }

    fn known_addresses(&self) -> Vec<IpAddr> {
        [self.session_ip, self.local_ip, self.public_ip]
            .into_iter()
            .filter(|ip| !ip.is_unspecified())
            .collect()
    }
}

impl fmt::Display for ServerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}:{}", self.session_ip, self.port)
        } else {
            write!(f, "{} ({}:{})", self.name, self.session_ip, self.port)
        }
    }
}
