//! Block requester: asks the mining client to produce blocks on a set of
//! chains.
//!
//! Modeled as a capability trait (an injected dependency, not a base class)
//! so orchestrator tests can substitute a recording fake without standing up
//! an HTTP server.

use crate::chain::ChainId;
use crate::error::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

/// Issues `make-blocks` requests against a mining client.
#[async_trait]
pub trait BlockRequester: Send + Sync {
    /// Request `count` additional blocks on each of `chains`. A no-op if
    /// `chains` is empty. Only a `200 OK` response counts as success; any
    /// other status is logged as a warning and treated as non-fatal
    /// (`Ok(())`) - only transport failures are returned as an [`Error`].
    async fn request_blocks(&self, chains: &[ChainId], count: u32) -> Result<(), Error>;
}

/// HTTP implementation posting to a mining client's `make-blocks` endpoint.
pub struct HttpBlockRequester {
    client: reqwest::Client,
    make_blocks_url: Url,
}

impl HttpBlockRequester {
    /// Build a requester posting to `{mining_client_url}/make-blocks`.
    pub fn new(client: reqwest::Client, mining_client_url: &Url) -> Result<Self, Error> {
        let make_blocks_url = mining_client_url
            .join("make-blocks")
            .map_err(|e| Error::ConfigInvalid(format!("invalid mining client url: {e}")))?;
        Ok(Self {
            client,
            make_blocks_url,
        })
    }
}

#[async_trait]
impl BlockRequester for HttpBlockRequester {
    async fn request_blocks(&self, chains: &[ChainId], count: u32) -> Result<(), Error> {
        if chains.is_empty() || count == 0 {
            return Ok(());
        }

        let mut body: HashMap<String, u32> = HashMap::with_capacity(chains.len());
        for chain in chains {
            body.insert(chain.to_string(), count);
        }

        let response = self
            .client
            .post(self.make_blocks_url.clone())
            .json(&body)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(
                status = %response.status(),
                chains = ?chains,
                "make-blocks request did not return 200 OK"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_blocks_url_is_joined_correctly() {
        let client = reqwest::Client::new();
        let base: Url = "http://localhost:1848/".parse().unwrap();
        let requester = HttpBlockRequester::new(client, &base).unwrap();
        assert_eq!(
            requester.make_blocks_url.as_str(),
            "http://localhost:1848/make-blocks"
        );
    }

    #[tokio::test]
    async fn test_empty_chains_is_noop() {
        let client = reqwest::Client::new();
        let base: Url = "http://localhost:1848".parse().unwrap();
        let requester = HttpBlockRequester::new(client, &base).unwrap();
        assert!(requester.request_blocks(&[], 3).await.is_ok());
    }
}
