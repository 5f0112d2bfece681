//! Resolution of the store's dual-channel transport parameters.

use searchdeck_core::config::{ConnectionConfig, DEFAULT_GRPC_PORT};

const SECURE_PORTS: [u16; 2] = [443, 8443];

/// One resolved network endpoint of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl EndpointDescriptor {
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Primary request/response endpoint plus the secondary binary channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rest: EndpointDescriptor,
    pub grpc: EndpointDescriptor,
}

fn is_local(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// Resolve both endpoint descriptors for a connection.
///
/// An explicit `secure` flag always wins. Without one, a well-known HTTPS
/// port (443/8443) forces TLS, local hosts stay plaintext, and any other
/// host resolves secure. The binary channel inherits the primary host and
/// security flag; its port is the configured override or 50051.
pub fn resolve_endpoints(config: &ConnectionConfig) -> Endpoints {
    let secure = config
        .secure
        .unwrap_or_else(|| SECURE_PORTS.contains(&config.port) || !is_local(&config.host));
    let rest = EndpointDescriptor {
        host: config.host.clone(),
        port: config.port,
        secure,
    };
    let grpc = EndpointDescriptor {
        host: config.grpc_host.clone().unwrap_or_else(|| config.host.clone()),
        port: config.grpc_port.unwrap_or(DEFAULT_GRPC_PORT),
        secure,
    };
    Endpoints { rest, grpc }
}
