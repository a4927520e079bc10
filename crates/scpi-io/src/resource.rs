//! VISA-style resource strings.
//!
//! Only the network forms are understood. All of them resolve to a raw
//! SCPI socket.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Port of the raw SCPI socket service on LXI instruments.
pub const RAW_SCPI_PORT: u16 = 5025;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Empty resource address")]
    Empty,

    #[error("Unsupported resource address '{0}' (expected TCPIP0::<host>::INSTR, TCPIP0::<host>::<port>::SOCKET, IP:<host> or <host>[:port])")]
    Unsupported(String),

    #[error("Invalid port in '{address}': {port}")]
    InvalidPort { address: String, port: String },
}

/// Where an instrument listens, together with the string it was given as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceAddress {
    original: String,
    host: String,
    port: u16,
}

impl ResourceAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let original = raw.trim();
        if original.is_empty() {
            return Err(AddressError::Empty);
        }
        let unsupported = || AddressError::Unsupported(original.to_string());

        let (host, port) = if original.to_ascii_uppercase().starts_with("TCPIP") {
            let parts: Vec<&str> = original.split("::").collect();
            match parts.as_slice() {
                [_, host, kind] if kind.eq_ignore_ascii_case("INSTR") => {
                    (host.to_string(), RAW_SCPI_PORT)
                }
                [_, host, port, kind] if kind.eq_ignore_ascii_case("SOCKET") => {
                    (host.to_string(), parse_port(original, port)?)
                }
                _ => return Err(unsupported()),
            }
        } else if let Some(host) = original
            .strip_prefix("IP:")
            .or_else(|| original.strip_prefix("ip:"))
        {
            (host.trim().to_string(), RAW_SCPI_PORT)
        } else if original.contains("::") {
            return Err(unsupported());
        } else {
            match original.rsplit_once(':') {
                Some((host, port)) => (host.to_string(), parse_port(original, port)?),
                None => (original.to_string(), RAW_SCPI_PORT),
            }
        };

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(unsupported());
        }
        Ok(Self {
            original: original.to_string(),
            host,
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }
}

fn parse_port(address: &str, port: &str) -> Result<u16, AddressError> {
    port.trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| AddressError::InvalidPort {
            address: address.to_string(),
            port: port.to_string(),
        })
}

impl FromStr for ResourceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceAddress> for String {
    fn from(address: ResourceAddress) -> Self {
        address.original
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instr_maps_to_raw_socket() {
        let addr = ResourceAddress::parse("TCPIP0::192.168.0.35::INSTR").unwrap();
        assert_eq!(addr.host(), "192.168.0.35");
        assert_eq!(addr.port(), 5025);
        assert_eq!(addr.to_string(), "TCPIP0::192.168.0.35::INSTR");
    }

    #[test]
    fn socket_form_keeps_port() {
        let addr = ResourceAddress::parse("TCPIP0::10.0.0.2::5024::SOCKET").unwrap();
        assert_eq!(addr.socket_addr(), "10.0.0.2:5024");
    }

    #[test]
    fn scope_ip_form() {
        let addr = ResourceAddress::parse("IP:192.168.0.40").unwrap();
        assert_eq!(addr.socket_addr(), "192.168.0.40:5025");
    }

    #[test]
    fn bare_host_and_port() {
        assert_eq!(
            ResourceAddress::parse("127.0.0.1:6000").unwrap().port(),
            6000
        );
        assert_eq!(
            ResourceAddress::parse("bench-psu").unwrap().socket_addr(),
            "bench-psu:5025"
        );
    }

    #[test]
    fn rejects_other_interfaces() {
        assert!(matches!(
            ResourceAddress::parse("GPIB0::12::INSTR"),
            Err(AddressError::Unsupported(_))
        ));
        assert!(matches!(
            ResourceAddress::parse("TCPIP0::host::inst0::INSTR"),
            Err(AddressError::Unsupported(_))
        ));
        assert!(matches!(
            ResourceAddress::parse("host:0"),
            Err(AddressError::InvalidPort { .. })
        ));
        assert_eq!(ResourceAddress::parse("  "), Err(AddressError::Empty));
    }
}
