use anyhow::Context;
use async_trait::async_trait;
use tokio::net::TcpStream;

use indexer_core::health::StoreClient;

/// Treats a store as alive when its listener accepts a TCP connection.
///
/// Works for any store reachable over TCP without pulling in its driver.
/// Size is not reported.
#[derive(Debug, Clone)]
pub struct TcpStoreClient {
    name: String,
    address: String,
}

impl TcpStoreClient {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl StoreClient for TcpStoreClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let stream = TcpStream::connect(&self.address)
            .await
            .with_context(|| format!("connect {}", self.address))?;
        tracing::trace!(
            store = %self.name,
            peer = ?stream.peer_addr().ok(),
            "store accepted connection"
        );
        Ok(())
    }
}
