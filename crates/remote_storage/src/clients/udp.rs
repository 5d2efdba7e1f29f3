//! UdpClient - fire-and-forget JSON datagrams

use contracts::{ContractError, RemoteClient, Sample};
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, instrument};
use url::Url;

/// Largest UDP payload over IPv4
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Configuration for UdpClient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpClientConfig {
    /// Target `host:port`
    pub target: String,
    /// Max datagram size, at most [`MAX_UDP_PAYLOAD`]
    pub max_packet_size: usize,
}

impl UdpClientConfig {
    /// Create config from a `udp://host:port[?max_packet_size=N]` url
    pub fn from_url(url: &Url) -> Result<Self, String> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| "missing host".to_string())?;
        let port = url.port().ok_or_else(|| "missing port".to_string())?;

        let mut max_packet_size = 65000;
        for (key, value) in url.query_pairs() {
            if key == "max_packet_size" {
                max_packet_size = value
                    .parse()
                    .map_err(|e| format!("invalid max_packet_size '{value}': {e}"))?;
            }
        }
        if max_packet_size == 0 || max_packet_size > MAX_UDP_PAYLOAD {
            return Err(format!(
                "max_packet_size {max_packet_size} out of range 1..={MAX_UDP_PAYLOAD}"
            ));
        }

        Ok(Self {
            target: format!("{host}:{port}"),
            max_packet_size,
        })
    }
}

/// Client that sends each batch as one UDP datagram
pub struct UdpClient {
    name: String,
    config: UdpClientConfig,
    socket: Option<UdpSocket>,
}

impl UdpClient {
    /// Create a new UdpClient; the socket is bound on first send
    pub fn new(name: impl Into<String>, config: UdpClientConfig) -> Self {
        Self {
            name: name.into(),
            config,
            socket: None,
        }
    }

    async fn connect(&self) -> std::io::Result<UdpSocket> {
        let addr = lookup_host(self.config.target.as_str())
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no address for '{}'", self.config.target),
                )
            })?;

        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(addr).await?;

        debug!(client = %self.name, target = %addr, "UdpClient connected");
        Ok(socket)
    }

    fn prepare_payload(&self, samples: &[Sample]) -> Result<Vec<u8>, ContractError> {
        let data = serde_json::to_vec(samples)
            .map_err(|e| ContractError::client_send(&self.name, format!("json error: {e}")))?;

        if data.len() > self.config.max_packet_size {
            return Err(ContractError::client_send(
                &self.name,
                format!(
                    "payload of {} bytes exceeds max_packet_size {}",
                    data.len(),
                    self.config.max_packet_size
                ),
            ));
        }

        Ok(data)
    }
}

impl RemoteClient for UdpClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "udp_client_send",
        skip(self, samples),
        fields(client = %self.name, samples = samples.len())
    )]
    async fn send(&mut self, samples: &[Sample]) -> Result<(), ContractError> {
        let data = self.prepare_payload(samples)?;

        if self.socket.is_none() {
            let socket = self
                .connect()
                .await
                .map_err(|e| ContractError::client_connection(&self.name, e.to_string()))?;
            self.socket = Some(socket);
        }

        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ContractError::client_send(&self.name, "socket not connected"))?;

        let sent = socket
            .send(&data)
            .await
            .map_err(|e| ContractError::client_send(&self.name, e.to_string()))?;
        debug!(client = %self.name, bytes = sent, "Sent");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        // UDP doesn't buffer
        Ok(())
    }

    #[instrument(name = "udp_client_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(client = %self.name, "UdpClient closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LabelSet, Metric};

    #[test]
    fn test_udp_config_parsing() {
        let url = Url::parse("udp://127.0.0.1:9999?max_packet_size=1200").unwrap();
        let config = UdpClientConfig::from_url(&url).unwrap();
        assert_eq!(config.target, "127.0.0.1:9999");
        assert_eq!(config.max_packet_size, 1200);
    }

    #[test]
    fn test_udp_config_requires_port() {
        let url = Url::parse("udp://localhost").unwrap();
        assert!(UdpClientConfig::from_url(&url).is_err());
    }

    #[test]
    fn test_udp_config_rejects_packet_size_out_of_range() {
        let url = Url::parse("udp://127.0.0.1:9999?max_packet_size=65508").unwrap();
        let err = UdpClientConfig::from_url(&url).unwrap_err();
        assert!(err.contains("out of range"));

        let url = Url::parse("udp://127.0.0.1:9999?max_packet_size=0").unwrap();
        assert!(UdpClientConfig::from_url(&url).is_err());

        let url = Url::parse("udp://127.0.0.1:9999?max_packet_size=65507").unwrap();
        assert_eq!(UdpClientConfig::from_url(&url).unwrap().max_packet_size, MAX_UDP_PAYLOAD);
    }

    #[tokio::test]
    async fn test_udp_client_delivers_json_batch() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let config = UdpClientConfig {
            target: addr.to_string(),
            max_packet_size: 65000,
        };
        let mut client = UdpClient::new("test_udp", config);
        let batch = vec![Sample::new(Metric::new("cpu", LabelSet::new()), 2.0, 7)];

        client.send(&batch).await.unwrap();

        let mut buf = vec![0u8; 65536];
        let len = receiver.recv(&mut buf).await.unwrap();
        let received: Vec<Sample> = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(received, batch);

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_udp_client_rejects_oversized_batch() {
        let config = UdpClientConfig {
            target: "127.0.0.1:9".to_string(),
            max_packet_size: 16,
        };
        let mut client = UdpClient::new("tiny", config);
        let batch = vec![Sample::new(Metric::new("a_long_metric_name", LabelSet::new()), 1.0, 0)];

        let err = client.send(&batch).await.unwrap_err();
        assert!(matches!(err, ContractError::ClientSend { .. }));
    }
}
