//! Wiring: real collaborators behind the engine's traits.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use attestor_cache::{spawn_cache_sweeper, CacheProxy, Prefetcher};
use attestor_chain::RpcChain;
use attestor_da::DaClient;
use attestor_engine::{Attestor, EngineConfig, EngineMetrics, Records};
use attestor_rpc::{AppState, RpcServer};
use attestor_store::{spawn_retention_sweeper, MemoryStatusStore, StatusStore};
use attestor_types::{Clock, SystemClock};
use attestor_utils::format_duration;
use attestor_verifier::VerifierClient;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct App {
    pub config: EngineConfig,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn StatusStore>,
    pub cache: Arc<CacheProxy>,
    pub attestor: Arc<Attestor>,
    pub metrics: Arc<EngineMetrics>,
    pub shutdown: CancellationToken,
}

impl App {
    pub fn build(config: EngineConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store: Arc<dyn StatusStore> = Arc::new(MemoryStatusStore::new());
        let cache = Arc::new(CacheProxy::new(clock.clone(), config.cache_retention()));
        let metrics = Arc::new(EngineMetrics::new().context("registering metrics")?);

        let verifier = Arc::new(VerifierClient::new(
            &config.verifier_url,
            &config.verifier_api_key,
        ));
        let chain = Arc::new(RpcChain::connect(
            &config.chain_settings(),
            config.private_key.expose(),
        )?);
        let da = Arc::new(DaClient::new(&config.da_url, config.da_api_key.clone()));
        let prefetcher = Arc::new(Prefetcher::new(
            cache.clone(),
            config.public_base_url.clone(),
        ));

        let records = Records::new(store.clone(), clock.clone());
        let attestor = Attestor::from_config(&config, records, verifier, chain, da)
            .with_prefetcher(prefetcher)
            .with_metrics(metrics.clone());

        let wait = config.wait_policy();
        tracing::info!(
            verifier = %config.verifier_url,
            da = %config.da_url,
            rpc = %config.rpc_url,
            max_wait = %format_duration(wait.max_wait),
            poll_interval = %format_duration(wait.poll_interval),
            proxy = config.public_base_url.as_deref().unwrap_or("off"),
            "engine configured"
        );

        Ok(Self {
            config,
            clock,
            store,
            cache,
            attestor: Arc::new(attestor),
            metrics,
            shutdown,
        })
    }

    /// Cache and record sweepers; both stop with the shutdown token.
    pub fn spawn_sweepers(&self) -> Vec<JoinHandle<()>> {
        let mut handles = vec![spawn_cache_sweeper(
            self.cache.clone(),
            self.config.cache_sweep_interval(),
            self.shutdown.child_token(),
        )];
        match self.config.record_retention() {
            Some(retention) => handles.push(spawn_retention_sweeper(
                self.store.clone(),
                self.clock.clone(),
                retention,
                self.config.record_sweep_interval(),
                self.shutdown.child_token(),
            )),
            None => tracing::info!("status record retention disabled"),
        }
        handles
    }

    pub fn state(&self) -> AppState {
        AppState {
            cache: self.cache.clone(),
            store: self.store.clone(),
            attestor: self.attestor.clone(),
            metrics: self.metrics.clone(),
            api_token: self.config.api_token.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// HTTP surface on `listen_addr`, in the background.
    pub fn spawn_server(&self) -> anyhow::Result<JoinHandle<()>> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.config.listen_addr))?;
        if self.config.api_token.is_none() {
            tracing::warn!("no api_token configured; /attestations and /metrics will refuse every request");
        }
        let state = self.state();
        let shutdown = self.shutdown.clone();
        Ok(tokio::spawn(async move {
            if let Err(e) = RpcServer::new(addr).serve(state).await {
                tracing::error!("HTTP server stopped: {e}");
                shutdown.cancel();
            }
        }))
    }
}
