//! Git remote URL parsing.

use std::fmt;
use std::net::IpAddr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Scheme used to reach the web UI of a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// Host, repository path and web protocol extracted from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRemote {
    /// Hostname, possibly with a port (e.g. `github.com`, `10.0.0.5:8080`).
    pub host: String,
    /// Repository path without leading slash or `.git` suffix.
    pub repo_path: String,
    /// Protocol to use when building browser URLs.
    pub protocol: Protocol,
}

struct RemotePattern {
    prefix: &'static str,
    regex: Regex,
    protocol: Protocol,
}

fn patterns() -> &'static [RemotePattern] {
    static PATTERNS: OnceLock<Vec<RemotePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Checked in order; the first matching prefix decides.
        [
            ("git@", r"^git@([^:/]+):(.+?)(?:\.git)?$", Protocol::Https),
            (
                "ssh://git@",
                r"^ssh://git@([^/]+)/(.+?)(?:\.git)?$",
                Protocol::Https,
            ),
            ("https://", r"^https://([^/]+)/(.+?)(?:\.git)?$", Protocol::Https),
            ("http://", r"^http://([^/]+)/(.+?)(?:\.git)?$", Protocol::Http),
        ]
        .into_iter()
        .filter_map(|(prefix, pattern, protocol)| {
            Regex::new(pattern).ok().map(|regex| RemotePattern {
                prefix,
                regex,
                protocol,
            })
        })
        .collect()
    })
}

/// Returns true when `host` is a bare IPv4/IPv6 address.
///
/// A host carrying a port (`10.0.0.5:8443`) or brackets is not a bare
/// address and keeps the scheme it was given.
pub fn is_ip_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// Parses a remote URL in SCP, `ssh://`, `https://` or `http://` form.
///
/// Returns `None` for anything else. Hosts that are bare IP addresses (see
/// [`is_ip_host`]) always get [`Protocol::Http`].
pub fn parse_remote_url(remote: &str) -> Option<ParsedRemote> {
    let remote = remote.trim();
    let pattern = patterns().iter().find(|p| remote.starts_with(p.prefix))?;
    let captures = pattern.regex.captures(remote)?;

    let host = captures.get(1)?.as_str().to_string();
    let repo_path = captures.get(2)?.as_str().to_string();
    let protocol = if is_ip_host(&host) {
        Protocol::Http
    } else {
        pattern.protocol
    };

    Some(ParsedRemote {
        host,
        repo_path,
        protocol,
    })
}
