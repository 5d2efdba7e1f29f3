//! FileClient - appends samples to a JSON-lines file

use contracts::{ContractError, RemoteClient, Sample};
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

/// Client that writes one JSON object per sample per line
pub struct FileClient {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileClient {
    /// Create a new FileClient; the file is opened on first send
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            writer: None,
        }
    }

    async fn open(&self) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        debug!(client = %self.name, path = %self.path.display(), "FileClient opened");
        Ok(BufWriter::new(file))
    }

    fn encode(&self, samples: &[Sample]) -> Result<Vec<u8>, ContractError> {
        let mut buf = Vec::new();
        for sample in samples {
            serde_json::to_writer(&mut buf, sample)
                .map_err(|e| ContractError::client_send(&self.name, format!("json error: {e}")))?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

impl RemoteClient for FileClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_client_send",
        skip(self, samples),
        fields(client = %self.name, samples = samples.len())
    )]
    async fn send(&mut self, samples: &[Sample]) -> Result<(), ContractError> {
        let data = self.encode(samples)?;
        if self.writer.is_none() {
            self.writer = Some(self.open().await?);
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(&data).await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().await?;
        }
        Ok(())
    }

    #[instrument(name = "file_client_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().await?;
        }
        debug!(client = %self.name, "FileClient closed");
        Ok(())
    }
}
