use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::CloudBridge;
use crate::types::BridgeAddress;
use reqwest::Url;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

const SSDP_MULTICAST: &str = "239.255.255.250:1900";
const SSDP_SEARCH: &str = "M-SEARCH * HTTP/1.1\r\n\
HOST: 239.255.255.250:1900\r\n\
MAN: \"ssdp:discover\"\r\n\
MX: 2\r\n\
ST: ssdp:all\r\n\r\n";

/// Bridge discovery: the cloud registry first, SSDP on the local network
/// when the registry fails or knows no bridge
pub struct Discovery {
    connection: Connection,
    cloud_url: String,
    ssdp_timeout: Duration,
}

impl Discovery {
    pub fn new(connection: Connection, cloud_url: impl Into<String>, ssdp_timeout: Duration) -> Self {
        Self {
            connection,
            cloud_url: cloud_url.into(),
            ssdp_timeout,
        }
    }

    /// Find reachable bridges; an empty list means none answered
    pub async fn find_bridges(&self) -> Result<Vec<BridgeAddress>> {
        match self.find_via_cloud().await {
            Ok(bridges) if !bridges.is_empty() => return Ok(bridges),
            Ok(_) => tracing::info!("Cloud registry lists no bridges, trying SSDP"),
            Err(e) => tracing::warn!("Cloud discovery failed ({}), falling back to SSDP", e),
        }
        self.find_via_ssdp().await
    }

    async fn find_via_cloud(&self) -> Result<Vec<BridgeAddress>> {
        tracing::debug!("Querying bridge registry: {}", self.cloud_url);
        let body = self.connection.get(&self.cloud_url).await?;
        let entries: Vec<CloudBridge> = serde_json::from_value(body)?;

        let bridges = entries
            .into_iter()
            .map(|entry| BridgeAddress {
                id: entry.id,
                host: entry.internal_ip_address,
            })
            .collect();
        Ok(dedup_by_host(bridges))
    }

    async fn find_via_ssdp(&self) -> Result<Vec<BridgeAddress>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.send_to(SSDP_SEARCH.as_bytes(), SSDP_MULTICAST).await?;
        tracing::debug!("Sent SSDP search, listening for {:?}", self.ssdp_timeout);

        let deadline = Instant::now() + self.ssdp_timeout;
        let mut bridges = Vec::new();
        let mut buf = [0u8; 2048];

        // Collect answers until the window closes
        while let Ok(received) = timeout_at(deadline, socket.recv_from(&mut buf)).await {
            let (len, from) = received?;
            let text = String::from_utf8_lossy(&buf[..len]);
            if let Some(bridge) = parse_ssdp_response(&text) {
                tracing::debug!("SSDP answer from {} is a bridge: {}", from, bridge);
                bridges.push(bridge);
            }
        }

        Ok(dedup_by_host(bridges))
    }
}

/// Extract a bridge from one SSDP answer, ignoring non-bridge devices
pub(crate) fn parse_ssdp_response(text: &str) -> Option<BridgeAddress> {
    let mut lines = text.lines();
    if !lines.next()?.starts_with("HTTP/1.1 200") {
        return None;
    }

    let mut location = None;
    let mut bridge_id = None;
    let mut is_bridge = false;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "location" => location = Some(value.to_string()),
            "hue-bridgeid" => {
                bridge_id = Some(value.to_string());
                is_bridge = true;
            }
            "server" if value.contains("IpBridge") => is_bridge = true,
            _ => {}
        }
    }

    if !is_bridge {
        return None;
    }

    let url = Url::parse(&location?).ok()?;
    let host = match url.port() {
        Some(port) if port != 80 => format!("{}:{}", url.host_str()?, port),
        _ => url.host_str()?.to_string(),
    };

    Some(BridgeAddress {
        id: bridge_id.unwrap_or_else(|| host.clone()),
        host,
    })
}

/// Drop repeated hosts, keeping first-seen order
fn dedup_by_host(bridges: Vec<BridgeAddress>) -> Vec<BridgeAddress> {
    let mut seen = std::collections::BTreeSet::new();
    bridges
        .into_iter()
        .filter(|bridge| seen.insert(bridge.host.clone()))
        .collect()
}
