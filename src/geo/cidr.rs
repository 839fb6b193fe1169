//! CIDR range parsing and containment.
//!
//! # Responsibilities
//! - Parse `address/prefix` notation (or a bare address as a single host)
//! - Test IPv4 containment with a 32-bit mask
//! - Test IPv6 containment byte-wise with a partial trailing byte
//!
//! # Design Decisions
//! - No allocation on the hot path; ranges are parsed once at startup
//! - IPv4-mapped IPv6 clients (`::ffff:a.b.c.d`) are matched against IPv4 ranges

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Error returned for malformed range strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidrError {
    #[error("invalid address in range '{0}'")]
    InvalidAddress(String),
    #[error("invalid prefix length in range '{0}'")]
    InvalidPrefix(String),
}

/// A contiguous address range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cidr {
    V4 { network: Ipv4Addr, prefix_len: u8 },
    V6 { network: Ipv6Addr, prefix_len: u8 },
}

impl Cidr {
    /// Parse `a.b.c.d/n`, `x::y/n`, or a bare address (exact host match).
    pub fn parse(s: &str) -> Result<Self, CidrError> {
        let trimmed = s.trim();
        let (addr_part, prefix_part) = match trimmed.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (trimmed, None),
        };

        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| CidrError::InvalidAddress(s.to_string()))?;

        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        let prefix_len = match prefix_part {
            Some(p) => p
                .parse::<u8>()
                .ok()
                .filter(|len| *len <= max)
                .ok_or_else(|| CidrError::InvalidPrefix(s.to_string()))?,
            None => max,
        };

        Ok(match addr {
            IpAddr::V4(network) => Cidr::V4 { network, prefix_len },
            IpAddr::V6(network) => Cidr::V6 { network, prefix_len },
        })
    }

    pub fn prefix_len(&self) -> u8 {
        match self {
            Cidr::V4 { prefix_len, .. } | Cidr::V6 { prefix_len, .. } => *prefix_len,
        }
    }

    /// Returns true if `ip` falls inside this range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self, ip) {
            (Cidr::V4 { network, prefix_len }, IpAddr::V4(addr)) => {
                v4_contains(*network, *prefix_len, addr)
            }
            (Cidr::V4 { network, prefix_len }, IpAddr::V6(addr)) => addr
                .to_ipv4_mapped()
                .is_some_and(|mapped| v4_contains(*network, *prefix_len, mapped)),
            (Cidr::V6 { network, prefix_len }, IpAddr::V6(addr)) => {
                v6_contains(*network, *prefix_len, addr)
            }
            (Cidr::V6 { .. }, IpAddr::V4(_)) => false,
        }
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cidr::parse(s)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cidr::V4 { network, prefix_len } => write!(f, "{}/{}", network, prefix_len),
            Cidr::V6 { network, prefix_len } => write!(f, "{}/{}", network, prefix_len),
        }
    }
}

fn v4_mask(prefix_len: u8) -> u32 {
    // `u32 << 32` overflows, so /0 is special-cased.
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix_len))
    }
}

fn v4_contains(network: Ipv4Addr, prefix_len: u8, addr: Ipv4Addr) -> bool {
    let mask = v4_mask(prefix_len);
    u32::from(addr) & mask == u32::from(network) & mask
}

fn v6_contains(network: Ipv6Addr, prefix_len: u8, addr: Ipv6Addr) -> bool {
    let net = network.octets();
    let ip = addr.octets();
    let full_bytes = usize::from(prefix_len / 8);
    let rem_bits = prefix_len % 8;

    if net[..full_bytes] != ip[..full_bytes] {
        return false;
    }
    if rem_bits == 0 {
        return true;
    }

    let mask = 0xFFu8 << (8 - rem_bits);
    net[full_bytes] & mask == ip[full_bytes] & mask
}

/// Parse a list of range strings, failing on the first malformed entry.
pub fn parse_all<S: AsRef<str>>(ranges: &[S]) -> Result<Vec<Cidr>, CidrError> {
    ranges.iter().map(|r| Cidr::parse(r.as_ref())).collect()
}
