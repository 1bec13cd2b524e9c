// Virtual host encoding port
use crate::domain::virtual_host::{encode_host, HostOptions};

/// Maps `(session, address, port)` to a host name the shared proxy can route
///
/// Implementations must be pure: the same inputs always yield the same host.
pub trait VirtualHostEncoder: Send + Sync {
    fn encode(&self, session_id: &str, address: &str, opts: &HostOptions) -> String;
}

/// Default encoder using the `ip<a>-<b>-<c>-<d>-<session>-<port>` scheme
#[derive(Debug, Clone, Default)]
pub struct DirectHostEncoder {
    tld: Option<String>,
}

impl DirectHostEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tld` to every host that does not request its own
    pub fn with_tld(tld: impl Into<String>) -> Self {
        Self {
            tld: Some(tld.into()),
        }
    }
}

impl VirtualHostEncoder for DirectHostEncoder {
    fn encode(&self, session_id: &str, address: &str, opts: &HostOptions) -> String {
        if opts.tld.is_none() && self.tld.is_some() {
            let opts = HostOptions {
                encoded_port: opts.encoded_port,
                tld: self.tld.clone(),
            };
            return encode_host(session_id, address, &opts);
        }
        encode_host(session_id, address, opts)
    }
}
