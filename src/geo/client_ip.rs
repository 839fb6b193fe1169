//! Client IP extraction from proxy headers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::HeaderMap;

use crate::config::ClientIpConfig;

/// Address used when neither headers nor the socket yield a valid IP.
pub const FALLBACK_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Determine the client address for a request.
///
/// Configured headers are scanned in order; a comma-separated value
/// contributes only its first entry. The first candidate that parses as an
/// IP wins. Otherwise the socket address is used, and failing that
/// [`FALLBACK_IP`].
pub fn extract_client_ip(
    headers: &HeaderMap,
    remote: Option<SocketAddr>,
    config: &ClientIpConfig,
) -> IpAddr {
    if config.trust_proxy_headers {
        for name in &config.headers {
            let candidate = headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(parse_candidate);

            if let Some(ip) = candidate {
                return ip;
            }
        }
    }

    remote.map(|addr| addr.ip()).unwrap_or(FALLBACK_IP)
}

fn parse_candidate(raw: &str) -> Option<IpAddr> {
    let mut value = raw.trim();
    // RFC 7239 style: for="[2001:db8::1]:4711"
    if let Some(pos) = value.to_ascii_lowercase().find("for=") {
        value = &value[pos + 4..];
        value = value.split(';').next().unwrap_or(value);
    }
    let value = value.trim().trim_matches('"');
    if value.is_empty() {
        return None;
    }

    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(sock) = value.parse::<SocketAddr>() {
        return Some(sock.ip());
    }
    value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn remote() -> Option<SocketAddr> {
        Some("192.0.2.10:55000".parse().unwrap())
    }

    #[test]
    fn test_header_order_wins() {
        let config = ClientIpConfig::default();
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.5"),
            ("cf-connecting-ip", "198.51.100.7"),
        ]);
        assert_eq!(extract_client_ip(&h, remote(), &config), "198.51.100.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_first_entry_of_list() {
        let config = ClientIpConfig::default();
        let h = headers(&[("x-forwarded-for", "203.0.113.5, 10.0.0.1, 10.0.0.2")]);
        assert_eq!(extract_client_ip(&h, remote(), &config), "203.0.113.5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_malformed_falls_through() {
        let config = ClientIpConfig::default();
        let h = headers(&[
            ("cf-connecting-ip", "not-an-ip"),
            ("x-real-ip", "2001:db8::5"),
        ]);
        assert_eq!(extract_client_ip(&h, remote(), &config), "2001:db8::5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_forwarded_syntax() {
        let config = ClientIpConfig::default();
        let h = headers(&[("forwarded", "for=\"[2001:db8::9]:4711\";proto=https")]);
        assert_eq!(extract_client_ip(&h, remote(), &config), "2001:db8::9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_socket_and_loopback_fallback() {
        let config = ClientIpConfig::default();
        let h = headers(&[("x-forwarded-for", "garbage")]);
        assert_eq!(extract_client_ip(&h, remote(), &config), "192.0.2.10".parse::<IpAddr>().unwrap());
        assert_eq!(extract_client_ip(&h, None, &config), FALLBACK_IP);
    }

    #[test]
    fn test_untrusted_headers_ignored() {
        let config = ClientIpConfig {
            trust_proxy_headers: false,
            ..ClientIpConfig::default()
        };
        let h = headers(&[("cf-connecting-ip", "198.51.100.7")]);
        assert_eq!(extract_client_ip(&h, remote(), &config), "192.0.2.10".parse::<IpAddr>().unwrap());
    }
}
