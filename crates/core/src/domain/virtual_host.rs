//! Virtual host addressing
//!
//! The shared reverse proxy fronts every instance of every session. It picks
//! the backend from the host name alone, so the host name has to carry the
//! instance address, the owning session and (optionally) the target port:
//!
//! ```text
//! ip<a>-<b>-<c>-<d>-<session>[-<port>][.<tld>]
//! ip10-0-0-5-s1-4401.direct.example.com
//! ```

use std::net::Ipv4Addr;

use super::error::{DomainError, Result};

/// Options for [`encode_host`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOptions {
    /// Port on the instance the proxy should forward to
    pub encoded_port: Option<u16>,
    /// Domain suffix under which the proxy is reachable
    pub tld: Option<String>,
}

impl HostOptions {
    pub fn with_port(port: u16) -> Self {
        Self {
            encoded_port: Some(port),
            tld: None,
        }
    }
}

/// Components recovered from an encoded host name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHost {
    pub session_id: String,
    pub ip: Ipv4Addr,
    pub port: Option<u16>,
    pub tld: Option<String>,
}

/// Encode `(session, address, port)` into a host name the proxy can route
///
/// Pure function: identical inputs always produce the identical host.
pub fn encode_host(session_id: &str, ip: &str, opts: &HostOptions) -> String {
    let mut host = format!("ip{}-{}", ip.replace('.', "-"), session_id);

    if let Some(port) = opts.encoded_port {
        host.push_str(&format!("-{}", port));
    }

    match opts.tld.as_deref() {
        Some(tld) if !tld.is_empty() => format!("{}.{}", host, tld.trim_start_matches('.')),
        _ => host,
    }
}

/// Inverse of [`encode_host`] for IPv4 addresses
pub fn decode_host(host: &str) -> Result<DecodedHost> {
    let invalid = |reason: &str| DomainError::InvalidHost {
        host: host.to_string(),
        reason: reason.to_string(),
    };

    let (label, tld) = match host.split_once('.') {
        Some((label, tld)) if !tld.is_empty() => (label, Some(tld.to_string())),
        Some((label, _)) => (label, None),
        None => (host, None),
    };

    let rest = label
        .strip_prefix("ip")
        .ok_or_else(|| invalid("missing 'ip' prefix"))?;

    let parts: Vec<&str> = rest.split('-').collect();
    if parts.len() < 5 {
        return Err(invalid("expected four address octets followed by a session id"));
    }

    let ip: Ipv4Addr = parts[..4]
        .join(".")
        .parse()
        .map_err(|_| invalid("address octets do not form an IPv4 address"))?;

    let (session_id, port) = match &parts[4..] {
        [session] => (*session, None),
        [session, port] => {
            let port = port
                .parse::<u16>()
                .map_err(|_| invalid("trailing port is not a valid port number"))?;
            (*session, Some(port))
        }
        _ => return Err(invalid("too many '-' separated segments")),
    };

    if session_id.is_empty()
        || !session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid("session id must be alphanumeric"));
    }

    Ok(DecodedHost {
        session_id: session_id.to_string(),
        ip,
        port,
        tld,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_with_port() {
        let host = encode_host("s1", "10.0.0.5", &HostOptions::with_port(4401));
        assert_eq!(host, "ip10-0-0-5-s1-4401");
    }

    #[test]
    fn test_encode_with_tld_and_no_port() {
        let opts = HostOptions {
            encoded_port: None,
            tld: Some("direct.example.com".to_string()),
        };
        assert_eq!(
            encode_host("abc123", "192.168.0.18", &opts),
            "ip192-168-0-18-abc123.direct.example.com"
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let opts = HostOptions::with_port(4401);
        let first = encode_host("s1", "10.0.0.5", &opts);
        let second = encode_host("s1", "10.0.0.5", &opts);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_recovers_encoded_parts() {
        let opts = HostOptions {
            encoded_port: Some(4401),
            tld: Some("direct.example.com".to_string()),
        };
        let host = encode_host("a1b2_c3", "10.0.0.5", &opts);

        let decoded = decode_host(&host).unwrap();
        assert_eq!(decoded.session_id, "a1b2_c3");
        assert_eq!(decoded.ip, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(decoded.port, Some(4401));
        assert_eq!(decoded.tld.as_deref(), Some("direct.example.com"));
    }

    #[test]
    fn test_decode_without_port() {
        let decoded = decode_host("ip172-17-0-2-sess").unwrap();
        assert_eq!(decoded.port, None);
        assert_eq!(decoded.tld, None);
    }

    #[test]
    fn test_decode_rejects_malformed_hosts() {
        assert!(decode_host("example.com").is_err());
        assert!(decode_host("ip10-0-0-s1").is_err());
        assert!(decode_host("ip10-0-0-300-s1").is_err());
        assert!(decode_host("ip10-0-0-5-s1-99999").is_err());
        assert!(decode_host("ip10-0-0-5-s!-80").is_err());

        let err = decode_host("ip10-0-0-5-s1-80-90").unwrap_err();
        assert!(err.to_string().contains("too many"));
    }
}
