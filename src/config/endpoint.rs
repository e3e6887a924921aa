//! One-time resolution of the fleet service base endpoint.
//!
//! Priority:
//! 1. explicit override
//! 2. emulated CORE network (local address in 10.0.0.0/16)
//! 3. local service

use std::net::{IpAddr, UdpSocket};
use tracing::debug;

/// Fleet service address inside the emulated CORE network
pub const CORE_ENDPOINT: &str = "http://10.0.0.1:8080";

/// Fleet service address when running outside CORE
pub const LOCAL_ENDPOINT: &str = "http://localhost:8080";

/// Where a resolved endpoint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Override,
    CoreNetwork,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub base_url: String,
    pub source: EndpointSource,
}

/// Pick the base endpoint. A blank override counts as no override.
pub fn resolve_base_url(override_url: Option<&str>, local_addr: Option<IpAddr>) -> ResolvedEndpoint {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return ResolvedEndpoint {
            base_url: url.to_string(),
            source: EndpointSource::Override,
        };
    }

    if local_addr.is_some_and(is_core_network) {
        return ResolvedEndpoint {
            base_url: CORE_ENDPOINT.to_string(),
            source: EndpointSource::CoreNetwork,
        };
    }

    ResolvedEndpoint {
        base_url: LOCAL_ENDPOINT.to_string(),
        source: EndpointSource::Local,
    }
}

/// Local address the host would use to reach the CORE gateway.
///
/// Connecting a UDP socket only selects a route; nothing is sent. Returns
/// `None` when the host has no route.
pub fn detect_local_addr() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    if let Err(e) = socket.connect("10.0.0.1:8080") {
        debug!(error = %e, "No route towards CORE gateway");
        return None;
    }
    socket.local_addr().ok().map(|addr| addr.ip())
}

fn is_core_network(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            octets[0] == 10 && octets[1] == 0
        }
        IpAddr::V6(_) => false,
    }
}
