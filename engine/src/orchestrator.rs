//! End-to-end composition of the four stages.

use std::sync::Arc;

use attestor_cache::{CacheError, Prefetcher};
use attestor_chain::AttestationChain;
use attestor_da::DaApi;
use attestor_types::{AttestationId, DecodedProof};
use attestor_verifier::VerifierApi;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    AttestationFailure, ChainSubmitter, DaProofFetcher, EngineConfig, EngineError, EngineMetrics,
    FinalizationWaiter, PreparedRequest, Preset, ProofFetcher, Records, RelayWaiter,
    RequestPreparer, SourceDefinition, Submitter, VerifierPreparer, WaitPolicy, Web2JsonSource,
};

/// Body of a request to start an attestation: either a preset or a direct
/// source description.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttestRequest {
    Preset(Preset),
    Direct(Web2JsonSource),
}

enum Job {
    Direct(Web2JsonSource),
    Proxied(Arc<Prefetcher>, SourceDefinition),
}

/// Runs attestations through prepare → submit → wait → fetch.
///
/// No stage is retried from the outside and a failed attestation is never
/// resumed; callers start a new one.
pub struct Attestor {
    records: Records,
    preparer: Arc<dyn RequestPreparer>,
    submitter: Arc<dyn Submitter>,
    waiter: Arc<dyn FinalizationWaiter>,
    fetcher: Arc<dyn ProofFetcher>,
    prefetcher: Option<Arc<Prefetcher>>,
    wait_policy: WaitPolicy,
    metrics: Option<Arc<EngineMetrics>>,
}

impl Attestor {
    pub fn new(
        records: Records,
        preparer: Arc<dyn RequestPreparer>,
        submitter: Arc<dyn Submitter>,
        waiter: Arc<dyn FinalizationWaiter>,
        fetcher: Arc<dyn ProofFetcher>,
    ) -> Self {
        Self {
            records,
            preparer,
            submitter,
            waiter,
            fetcher,
            prefetcher: None,
            wait_policy: WaitPolicy::default(),
            metrics: None,
        }
    }

    /// The standard stages over real (or nullable) collaborators.
    pub fn from_config(
        config: &EngineConfig,
        records: Records,
        verifier: Arc<dyn VerifierApi>,
        chain: Arc<dyn AttestationChain>,
        da: Arc<dyn DaApi>,
    ) -> Self {
        Self::new(
            records.clone(),
            Arc::new(VerifierPreparer::new(verifier, records.clone())),
            Arc::new(ChainSubmitter::new(chain.clone(), records.clone())),
            Arc::new(RelayWaiter::new(chain, records.clone(), config.protocol_id)),
            Arc::new(DaProofFetcher::new(da, records, config.fetch_policy())),
        )
        .with_wait_policy(config.wait_policy())
    }

    pub fn with_prefetcher(mut self, prefetcher: Arc<Prefetcher>) -> Self {
        self.prefetcher = Some(prefetcher);
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Prepare only. The record stays in `preparing` until
    /// [`complete`](Self::complete) is called.
    pub async fn prepare(
        &self,
        source: &Web2JsonSource,
    ) -> Result<PreparedRequest, AttestationFailure> {
        let id = self.open()?;
        match self.preparer.prepare(&id, source).await {
            Ok(encoded_request) => Ok(PreparedRequest {
                id,
                encoded_request,
            }),
            Err(e) => Err(self.failed(id, e)),
        }
    }

    /// Submit, wait and fetch for a request from [`prepare`](Self::prepare).
    pub async fn complete(
        &self,
        prepared: &PreparedRequest,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, AttestationFailure> {
        let result = self
            .run_from_submit(&prepared.id, &prepared.encoded_request, cancel)
            .await;
        self.conclude(prepared.id.clone(), result).map(|(_, proof)| proof)
    }

    /// The full chain for a directly reachable source.
    pub async fn attest(
        &self,
        source: &Web2JsonSource,
        cancel: &CancellationToken,
    ) -> Result<(AttestationId, DecodedProof), AttestationFailure> {
        let id = self.open()?;
        let result = self.run_from_prepare(&id, source, cancel).await;
        self.conclude(id, result)
    }

    /// Pre-fetch `definition` through the cache proxy, then run the full
    /// chain against the proxied URL.
    ///
    /// Fails before creating a record when no public base URL is configured.
    pub async fn attest_proxied(
        &self,
        definition: &SourceDefinition,
        cancel: &CancellationToken,
    ) -> Result<(AttestationId, DecodedProof), AttestationFailure> {
        let prefetcher = self.prefetcher().map_err(AttestationFailure::unrecorded)?;
        let id = self.open()?;
        let result = self.run_proxied(&id, &prefetcher, definition, cancel).await;
        self.conclude(id, result)
    }

    /// Start an attestation in the background and return its id at once.
    ///
    /// Configuration problems (bad preset, missing public URL) are reported
    /// here, before a record exists. Everything later lands in the record.
    pub fn start(
        self: &Arc<Self>,
        request: AttestRequest,
        cancel: CancellationToken,
    ) -> Result<AttestationId, AttestationFailure> {
        let job = match request {
            AttestRequest::Direct(source) => {
                if source.url.trim().is_empty() {
                    return Err(AttestationFailure::unrecorded(EngineError::InvalidSource(
                        "url is empty".into(),
                    )));
                }
                Job::Direct(source)
            }
            AttestRequest::Preset(preset) => {
                let definition = preset.definition().map_err(AttestationFailure::unrecorded)?;
                let prefetcher = self.prefetcher().map_err(AttestationFailure::unrecorded)?;
                Job::Proxied(prefetcher, definition)
            }
        };

        let id = self.open()?;
        let this = Arc::clone(self);
        let task_id = id.clone();
        tokio::spawn(async move {
            let result = match job {
                Job::Direct(source) => this.run_from_prepare(&task_id, &source, &cancel).await,
                Job::Proxied(prefetcher, definition) => {
                    this.run_proxied(&task_id, &prefetcher, &definition, &cancel)
                        .await
                }
            };
            // Outcome is in the record and the metrics.
            let _ = this.conclude(task_id, result);
        });
        Ok(id)
    }

    fn prefetcher(&self) -> Result<Arc<Prefetcher>, EngineError> {
        let prefetcher = self
            .prefetcher
            .as_ref()
            .ok_or(EngineError::Cache(CacheError::MissingPublicUrl))?;
        prefetcher.public_base_url()?;
        Ok(Arc::clone(prefetcher))
    }

    fn open(&self) -> Result<AttestationId, AttestationFailure> {
        let id = self.records.open().map_err(AttestationFailure::unrecorded)?;
        if let Some(metrics) = &self.metrics {
            metrics.started.inc();
            metrics.in_flight.inc();
        }
        Ok(id)
    }

    async fn run_proxied(
        &self,
        id: &AttestationId,
        prefetcher: &Prefetcher,
        definition: &SourceDefinition,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError> {
        let proxied_url = prefetcher
            .proxy(&definition.url, &definition.keep_paths())
            .await
            .map_err(EngineError::from)
            .inspect_err(|e| self.records.fail(id, e))?;
        tracing::debug!(attestation_id = %id, proxied_url = %proxied_url, "source proxied");
        self.run_from_prepare(id, &definition.proxied(proxied_url), cancel)
            .await
    }

    async fn run_from_prepare(
        &self,
        id: &AttestationId,
        source: &Web2JsonSource,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError> {
        let encoded_request = self.preparer.prepare(id, source).await?;
        self.run_from_submit(id, &encoded_request, cancel).await
    }

    async fn run_from_submit(
        &self,
        id: &AttestationId,
        encoded_request: &[u8],
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError> {
        let submitted = self.submitter.submit(encoded_request, id).await?;
        let voting_round = submitted.voting_round;

        let finalized = self
            .waiter
            .wait(voting_round, id, self.wait_policy, cancel)
            .await?;
        if !finalized {
            return Err(EngineError::FinalizationTimeout {
                voting_round,
                waited: self.wait_policy.max_wait,
            });
        }

        self.fetcher
            .fetch(encoded_request, voting_round, id, cancel)
            .await
    }

    fn conclude(
        &self,
        id: AttestationId,
        result: Result<DecodedProof, EngineError>,
    ) -> Result<(AttestationId, DecodedProof), AttestationFailure> {
        let proof = result.map_err(|e| self.failed(id.clone(), e))?;
        if let Some(metrics) = &self.metrics {
            metrics.in_flight.dec();
            metrics.proof_ready.inc();
        }
        tracing::info!(
            attestation_id = %id,
            voting_round = proof.data.voting_round,
            "attestation proof ready"
        );
        Ok((id, proof))
    }

    /// Settle metrics and make sure the failure is on the record even when a
    /// substituted stage did not write it.
    fn failed(&self, id: AttestationId, error: EngineError) -> AttestationFailure {
        let recorded = self
            .records
            .store()
            .get(&id)
            .map(|status| status.phase().is_terminal())
            .unwrap_or(false);
        if !recorded {
            self.records.fail(&id, &error);
        }
        if let Some(metrics) = &self.metrics {
            metrics.in_flight.dec();
            metrics.record_failure(error.kind());
        }
        AttestationFailure::new(&id, error)
    }
}
