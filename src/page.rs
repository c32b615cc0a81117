// Page services — the components of one page load, built once and passed by reference.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::auth::{AuthSession, TokenStore};
use crate::config::ClientConfig;
use crate::context::{extract_payload, ContextHandle, ContextLoader, PageContext};
use crate::countdown::{Clock, CountdownEngine, CountdownOutcome, PageReloader};
use crate::rpc::{GrpcWebTransport, RpcClient, UnaryTransport};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

pub struct PageServices {
    config: ClientConfig,
    loader: Mutex<Option<ContextLoader>>,
    context: ContextHandle,
    rpc: Arc<RpcClient>,
    auth: AuthSession,
    countdown: Arc<CountdownEngine>,
    shutdown: CancellationToken,
}

impl PageServices {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn UnaryTransport>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        reloader: Arc<dyn PageReloader>,
    ) -> Self {
        let (loader, context) = ContextLoader::new();
        let rpc = Arc::new(RpcClient::new(transport, TokenStore::new(store.clone())));
        let auth = AuthSession::new(store);
        let countdown = Arc::new(CountdownEngine::new(&config, clock, reloader));
        Self {
            config,
            loader: Mutex::new(Some(loader)),
            context,
            rpc,
            auth,
            countdown,
            shutdown: CancellationToken::new(),
        }
    }

    /// Services talking gRPC-web to the API on `hostname`, with storage
    /// chosen by `config.storage_path`.
    pub fn for_host(
        config: ClientConfig,
        hostname: &str,
        clock: Arc<dyn Clock>,
        reloader: Arc<dyn PageReloader>,
    ) -> Result<Self> {
        let transport = Arc::new(GrpcWebTransport::for_host(&config, hostname));
        let store = open_store(&config)?;
        Ok(Self::new(config, transport, store, clock, reloader))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn context(&self) -> &ContextHandle {
        &self.context
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn countdown(&self) -> &Arc<CountdownEngine> {
        &self.countdown
    }

    /// Load the context embedded in the rendered page. Fires the readiness
    /// signal; a page can be attached only once.
    pub fn attach_page(&self, html: &str) -> Result<Arc<PageContext>> {
        let loader = self
            .loader
            .lock()
            .take()
            .ok_or_else(|| anyhow!("page already attached"))?;
        let payload = extract_payload(html);
        Ok(loader.load(payload.as_deref())?)
    }

    /// Run the countdown engine until it reloads, goes inert, or the page is
    /// torn down.
    pub fn spawn_countdown(&self) -> JoinHandle<CountdownOutcome> {
        let engine = self.countdown.clone();
        let context = self.context.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move { engine.run(&context, shutdown).await })
    }

    /// Tear down the page: stops the countdown and any pending reload.
    pub fn teardown(&self) {
        info!("page teardown");
        self.shutdown.cancel();
    }
}

/// File storage when a path is configured, memory otherwise.
pub fn open_store(config: &ClientConfig) -> Result<Arc<dyn KeyValueStore>> {
    if config.storage_path.is_empty() {
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(FileStore::open(Path::new(&config.storage_path))?))
}
