//! Delivery client implementations
//!
//! Contains LogClient, UdpClient, and FileClient. The endpoint URL scheme
//! selects which one a destination uses.

mod file;
mod log;
mod udp;

pub use self::file::FileClient;
pub use self::log::LogClient;
pub use self::udp::{UdpClient, UdpClientConfig};

use contracts::{ContractError, RemoteClient, Sample};
use url::Url;

/// Client selected from a destination URL
pub enum Client {
    Log(LogClient),
    Udp(UdpClient),
    File(FileClient),
}

impl Client {
    /// Build the client for `url`
    ///
    /// - `log://<label>` logs batch summaries
    /// - `udp://host:port` sends one JSON datagram per batch
    /// - `file:///abs/path` appends JSON lines
    ///
    /// # Errors
    /// Malformed URL, unknown scheme, or scheme-specific parameter errors.
    pub fn from_url(name: &str, url: &str) -> Result<Self, ContractError> {
        let parsed = Url::parse(url).map_err(|e| {
            ContractError::client_connection(name, format!("invalid url '{url}': {e}"))
        })?;

        match parsed.scheme() {
            "log" => Ok(Self::Log(LogClient::new(name))),
            "udp" => {
                let config = UdpClientConfig::from_url(&parsed)
                    .map_err(|e| ContractError::client_connection(name, e))?;
                Ok(Self::Udp(UdpClient::new(name, config)))
            }
            "file" => {
                let path = parsed.to_file_path().map_err(|()| {
                    ContractError::client_connection(name, format!("invalid file path in '{url}'"))
                })?;
                Ok(Self::File(FileClient::new(name, path)))
            }
            other => Err(ContractError::client_connection(
                name,
                format!("unsupported url scheme '{other}'"),
            )),
        }
    }
}

impl RemoteClient for Client {
    fn name(&self) -> &str {
        match self {
            Self::Log(c) => c.name(),
            Self::Udp(c) => c.name(),
            Self::File(c) => c.name(),
        }
    }

    async fn send(&mut self, samples: &[Sample]) -> Result<(), ContractError> {
        match self {
            Self::Log(c) => c.send(samples).await,
            Self::Udp(c) => c.send(samples).await,
            Self::File(c) => c.send(samples).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(c) => c.flush().await,
            Self::Udp(c) => c.flush().await,
            Self::File(c) => c.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(c) => c.close().await,
            Self::Udp(c) => c.close().await,
            Self::File(c) => c.close().await,
        }
    }
}
