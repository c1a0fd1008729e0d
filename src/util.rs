// Helpers for turning payload entries into connectable (host, port) pairs.

use std::net::IpAddr;
use anyhow::{anyhow, Result};

pub const DEFAULT_PORT: u16 = 80;

/// Split a payload entry such as `1.2.3.4`, `edge.example:8080` or `[::1]:443`
/// into host and port, the way a URL parser reads the authority of
/// `http://<entry>`. Port 0 or a missing port falls back to `default_port`.
pub fn parse_host_port(s: &str, default_port: u16) -> Result<(String, u16)> {
    let s = s.trim();

    // Bare IPv6 literals carry colons that are not a port separator.
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok((ip.to_string(), default_port));
    }

    // Drop anything past the authority, then any userinfo.
    let authority = s.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = match authority.rfind('@') {
        Some(idx) => &authority[idx + 1..],
        None => authority,
    };

    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| anyhow!("unterminated IPv6 literal"))?;
        let tail = &rest[end + 1..];
        let port = match tail.strip_prefix(':') {
            Some(p) => Some(p),
            None if tail.is_empty() => None,
            None => return Err(anyhow!("unexpected characters after IPv6 literal")),
        };
        (&rest[..end], port)
    } else {
        match authority.rfind(':') {
            Some(idx) => (&authority[..idx], Some(&authority[idx + 1..])),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(anyhow!("empty host"));
    }

    let port = match port {
        None | Some("") => default_port,
        Some(p) => match p.parse::<u16>() {
            Ok(0) => default_port,
            Ok(port) => port,
            Err(_) => return Err(anyhow!("invalid port {:?}", p)),
        },
    };

    Ok((host.to_lowercase(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ip_uses_default_port() {
        assert_eq!(
            parse_host_port("17.253.84.125", DEFAULT_PORT).unwrap(),
            ("17.253.84.125".to_string(), 80)
        );
    }

    #[test]
    fn explicit_port_wins() {
        assert_eq!(
            parse_host_port("host:8080", DEFAULT_PORT).unwrap(),
            ("host".to_string(), 8080)
        );
    }

    #[test]
    fn zero_or_empty_port_falls_back() {
        assert_eq!(parse_host_port("host:0", 80).unwrap().1, 80);
        assert_eq!(parse_host_port("host:", 80).unwrap().1, 80);
    }

    #[test]
    fn ipv6_forms() {
        assert_eq!(
            parse_host_port("::1", 80).unwrap(),
            ("::1".to_string(), 80)
        );
        assert_eq!(
            parse_host_port("[::1]:443", 80).unwrap(),
            ("::1".to_string(), 443)
        );
        assert_eq!(
            parse_host_port("[fe80::1]", 80).unwrap(),
            ("fe80::1".to_string(), 80)
        );
    }

    #[test]
    fn strips_userinfo_path_and_case() {
        assert_eq!(
            parse_host_port("user@CDN.Example.com:81/path?q", 80).unwrap(),
            ("cdn.example.com".to_string(), 81)
        );
    }

    #[test]
    fn rejects_bad_ports_and_hosts() {
        assert!(parse_host_port("host:http", 80).is_err());
        assert!(parse_host_port("host:70000", 80).is_err());
        assert!(parse_host_port(":8080", 80).is_err());
        assert!(parse_host_port("", 80).is_err());
        assert!(parse_host_port("[::1", 80).is_err());
    }
}
