//! Deployment artifact retrieval.
//!
//! Artifacts are fetched over HTTP and handed to the wallet as lowercase hex.
//! Successful fetches are cached by URL; failures are never cached.

use std::sync::Arc;

use moka::future::Cache;
use tracing::instrument;
use url::Url;

use icarus_market_core::ArtifactPaths;

use super::WeilError;
use crate::config::ArtifactConfig;

/// Upper bound on cached hex text, in bytes.
pub const CACHE_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Cache weight of one hex string: its length, saturating at `u32::MAX`.
fn cache_weight(hex: &str) -> u32 {
    u32::try_from(hex.len()).unwrap_or(u32::MAX)
}

/// Hex-encode bytes, two lowercase characters per byte in byte order.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Both artifacts of one product, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifacts {
    pub module_hex: String,
    pub interface_hex: String,
}

/// HTTP client for the artifact server.
#[derive(Clone)]
pub struct ArtifactFetcher {
    inner: Arc<ArtifactFetcherInner>,
}

struct ArtifactFetcherInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<String, String>,
}

impl ArtifactFetcher {
    /// Create a fetcher for the configured artifact server.
    #[must_use]
    pub fn new(config: &ArtifactConfig) -> Self {
        let cache = Cache::builder()
            .weigher(|_url: &String, hex: &String| cache_weight(hex))
            .max_capacity(CACHE_MAX_BYTES)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(ArtifactFetcherInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                cache,
            }),
        }
    }

    /// Resolve an artifact path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`WeilError::FetchFailed`] if the path does not form a valid URL.
    pub fn resolve(&self, path: &str) -> Result<Url, WeilError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| WeilError::FetchFailed {
                url: path.to_string(),
                status: None,
                reason: e.to_string(),
            })
    }

    /// Fetch one artifact and hex-encode its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WeilError::FetchFailed`] with the HTTP status for a non-2xx
    /// response, or without a status when the server cannot be reached.
    #[instrument(skip(self, url), fields(url = %url))]
    pub async fn fetch_as_hex(&self, url: &Url) -> Result<String, WeilError> {
        let key = url.to_string();
        if let Some(hex) = self.inner.cache.get(&key).await {
            tracing::debug!("Artifact cache hit");
            return Ok(hex);
        }

        let response = self
            .inner
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| WeilError::FetchFailed {
                url: key.clone(),
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Artifact server returned an error");
            return Err(WeilError::FetchFailed {
                url: key,
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}"),
            });
        }

        let bytes = response.bytes().await.map_err(|e| WeilError::FetchFailed {
            url: key.clone(),
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })?;

        let hex = encode_hex(&bytes);
        tracing::debug!(bytes = bytes.len(), "Fetched artifact");
        self.inner.cache.insert(key, hex.clone()).await;
        Ok(hex)
    }

    /// Fetch both artifacts of a product concurrently.
    ///
    /// # Errors
    ///
    /// The first failing fetch fails the pair.
    #[instrument(skip(self, paths), fields(module = %paths.module))]
    pub async fn fetch_product(&self, paths: &ArtifactPaths) -> Result<EncodedArtifacts, WeilError> {
        let module_url = self.resolve(&paths.module)?;
        let interface_url = self.resolve(&paths.interface)?;

        let (module_hex, interface_hex) = tokio::try_join!(
            self.fetch_as_hex(&module_url),
            self.fetch_as_hex(&interface_url)
        )?;

        Ok(EncodedArtifacts {
            module_hex,
            interface_hex,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use mockito::Server;

    use super::*;

    fn fetcher(base: &str) -> ArtifactFetcher {
        ArtifactFetcher::new(&ArtifactConfig {
            base_url: Url::parse(&format!("{base}/artifacts/")).unwrap(),
            cache_ttl: Duration::from_secs(60),
        })
    }

    fn paths(id: &str) -> ArtifactPaths {
        ArtifactPaths {
            module: format!("{id}.wasm"),
            interface: format!("{id}.widl"),
        }
    }

    #[test]
    fn test_encode_hex() {
        assert_eq!(encode_hex(&[0x00, 0xFF, 0x10]), "00ff10");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn test_resolve_against_base() {
        let fetcher = fetcher("http://localhost:3000");
        assert_eq!(
            fetcher.resolve("slack.wasm").unwrap().as_str(),
            "http://localhost:3000/artifacts/slack.wasm"
        );
    }

    #[tokio::test]
    async fn test_fetch_as_hex() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/artifacts/discord.wasm")
            .with_status(200)
            .with_body([0x00, 0xFF, 0x10])
            .expect(1)
            .create_async()
            .await;

        let fetcher = fetcher(&server.url());
        let url = fetcher.resolve("discord.wasm").unwrap();

        assert_eq!(fetcher.fetch_as_hex(&url).await.unwrap(), "00ff10");
        // Served from cache the second time.
        assert_eq!(fetcher.fetch_as_hex(&url).await.unwrap(), "00ff10");
        mock.assert_async().await;
    }

    #[test]
    fn test_cache_weight_is_hex_length() {
        assert_eq!(cache_weight(""), 0);
        assert_eq!(cache_weight("00ff10"), 6);
    }

    #[tokio::test]
    async fn test_cache_is_bounded_by_bytes() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/artifacts/logger.wasm")
            .with_body(vec![0xAB; 512])
            .create_async()
            .await;

        let fetcher = fetcher(&server.url());
        let url = fetcher.resolve("logger.wasm").unwrap();
        fetcher.fetch_as_hex(&url).await.unwrap();

        let cache = &fetcher.inner.cache;
        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.weighted_size(), 1024);
        assert_eq!(cache.policy().max_capacity(), Some(CACHE_MAX_BYTES));
    }

    #[tokio::test]
    async fn test_non_2xx_carries_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/artifacts/missing.wasm")
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let fetcher = fetcher(&server.url());
        let url = fetcher.resolve("missing.wasm").unwrap();

        let err = fetcher.fetch_as_hex(&url).await.unwrap_err();
        assert_eq!(err.fetch_status(), Some(404));

        // Failures are not cached.
        assert!(fetcher.fetch_as_hex(&url).await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_server_has_no_status() {
        let fetcher = fetcher("http://127.0.0.1:1");
        let url = fetcher.resolve("slack.wasm").unwrap();

        let err = fetcher.fetch_as_hex(&url).await.unwrap_err();
        assert!(matches!(err, WeilError::FetchFailed { status: None, .. }));
    }

    #[tokio::test]
    async fn test_fetch_product_pair() {
        let mut server = Server::new_async().await;
        let _module = server
            .mock("GET", "/artifacts/slack.wasm")
            .with_body([0x00, 0x61, 0x73, 0x6d])
            .create_async()
            .await;
        let _interface = server
            .mock("GET", "/artifacts/slack.widl")
            .with_body("ab")
            .create_async()
            .await;

        let encoded = fetcher(&server.url())
            .fetch_product(&paths("slack"))
            .await
            .unwrap();

        assert_eq!(encoded.module_hex, "0061736d");
        assert_eq!(encoded.interface_hex, "6162");
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_pair() {
        let mut server = Server::new_async().await;
        let _module = server
            .mock("GET", "/artifacts/slack.wasm")
            .with_body([0x00])
            .create_async()
            .await;
        let _interface = server
            .mock("GET", "/artifacts/slack.widl")
            .with_status(500)
            .create_async()
            .await;

        let err = fetcher(&server.url())
            .fetch_product(&paths("slack"))
            .await
            .unwrap_err();

        assert_eq!(err.fetch_status(), Some(500));
    }
}
