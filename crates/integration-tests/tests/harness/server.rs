//! Test server wrapper that starts Wayfarer on a random port

use std::net::SocketAddr;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wayfarer_cache::CacheContext;
use wayfarer_config::Config;
use wayfarer_server::Server;

/// A running test server instance backed by the in-memory cache
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    cache: CacheContext,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let cache = CacheContext::in_memory(Duration::from_secs(config.cache.default_ttl_seconds));
        let server = Server::new(config, cache.clone())?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(
                listener,
                server.into_router().into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                shutdown_clone.cancelled().await;
            })
            .await
            .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            cache,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Cache shared with the server
    pub fn cache(&self) -> &CacheContext {
        &self.cache
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.cache.close();
    }
}
