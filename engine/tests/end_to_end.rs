//! Full pipeline scenarios over nullable collaborators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attestor_codec::encode_response;
use attestor_da::{RawProof, RequestEncoding};
use attestor_engine::{
    AttestRequest, Attestor, EngineConfig, EngineError, EngineMetrics, ProofFetcher, Records,
    Web2JsonSource,
};
use attestor_nullables::{NullChain, NullClock, NullDa, NullVerifier};
use attestor_store::{MemoryStatusStore, StatusStore};
use attestor_types::{
    AttestationId, AttestationResponse, Bytes32, DecodedProof, ErrorKind, Phase, RequestBody,
    ResponseBody,
};
use tokio_util::sync::CancellationToken;

const ROUND: u64 = 905_112;
const BLOCK_TIME: u64 = 1_700_000_123;
const ENCODED: [u8; 4] = [0x0a, 0x0b, 0x0c, 0x0d];

fn response(url: &str) -> AttestationResponse {
    AttestationResponse {
        attestation_type: Bytes32::from_ascii("Web2Json").unwrap(),
        source_id: Bytes32::from_ascii("PublicWeb2").unwrap(),
        voting_round: ROUND,
        lowest_used_timestamp: BLOCK_TIME - 60,
        request_body: RequestBody {
            url: url.into(),
            http_method: "GET".into(),
            headers: "{}".into(),
            query_params: "{}".into(),
            body: "{}".into(),
            post_process_jq: ".".into(),
            abi_signature: "{}".into(),
        },
        response_body: ResponseBody {
            abi_encoded_data: vec![0x01; 64],
        },
    }
}

fn raw_proof() -> RawProof {
    RawProof {
        proof: vec![
            format!("0x{}", "ab".repeat(32)),
            format!("0x{}", "cd".repeat(32)),
        ],
        response_hex: RequestEncoding::HexPrefixed
            .encode(&encode_response(&response("https://src.example/a"))),
    }
}

fn source() -> Web2JsonSource {
    Web2JsonSource::get("https://src.example/a", ".", "{}")
}

struct Harness {
    attestor: Arc<Attestor>,
    store: Arc<MemoryStatusStore>,
    chain: Arc<NullChain>,
    da: Arc<NullDa>,
    verifier: Arc<NullVerifier>,
    metrics: Arc<EngineMetrics>,
}

impl Harness {
    fn new(config: &EngineConfig, verifier: NullVerifier, chain: NullChain, da: NullDa) -> Self {
        let store = Arc::new(MemoryStatusStore::new());
        let records = Records::new(store.clone(), Arc::new(NullClock::new(BLOCK_TIME)));
        let verifier = Arc::new(verifier);
        let chain = Arc::new(chain);
        let da = Arc::new(da);
        let metrics = Arc::new(EngineMetrics::new().unwrap());
        let attestor = Attestor::from_config(
            config,
            records,
            verifier.clone(),
            chain.clone(),
            da.clone(),
        )
        .with_metrics(metrics.clone());
        Self {
            attestor: Arc::new(attestor),
            store,
            chain,
            da,
            verifier,
            metrics,
        }
    }

    fn standard(chain: NullChain) -> Self {
        Self::new(
            &EngineConfig::default(),
            NullVerifier::returning(ENCODED.to_vec()),
            chain,
            NullDa::serving(ROUND, RequestEncoding::HexPrefixed.encode(&ENCODED), raw_proof()),
        )
    }

    fn status(&self, id: &AttestationId) -> attestor_types::AttestationStatus {
        self.store.get(id).unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn success_ends_proof_ready_with_submission_round() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME).finalized_on_poll(3));

    let (id, proof) = h
        .attestor
        .attest(&source(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(proof.data.voting_round, ROUND);
    assert_eq!(proof.merkle_proof.len(), 2);
    assert_eq!(h.chain.submitted(), vec![ENCODED.to_vec()]);
    assert_eq!(h.chain.queried_timestamps(), vec![BLOCK_TIME]);

    let status = h.status(&id);
    assert_eq!(status.phase(), Phase::ProofReady);
    assert_eq!(status.voting_round(), Some(ROUND));
    assert_eq!(status.proof(), Some(&proof));
    assert!(status.error().is_none());

    assert_eq!(h.metrics.started.get(), 1);
    assert_eq!(h.metrics.proof_ready.get(), 1);
    assert_eq!(h.metrics.in_flight.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn finalization_timeout_skips_proof_fetch() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME).never_finalized());

    let failure = h
        .attestor
        .attest(&source(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::Timeout);
    assert!(matches!(failure.error, EngineError::FinalizationTimeout { voting_round: ROUND, .. }));
    assert!(h.da.calls().is_empty());

    let status = h.status(failure.id.as_ref().unwrap());
    assert_eq!(status.phase(), Phase::Failed);
    assert_eq!(status.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(status.voting_round(), Some(ROUND));
    assert!(status.proof().is_none());

    assert_eq!(h.metrics.failed.with_label_values(&["timeout"]).get(), 1);
    assert_eq!(h.metrics.in_flight.get(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_preparation_never_reaches_the_chain() {
    let h = Harness::new(
        &EngineConfig::default(),
        NullVerifier::rejecting(422, "jq: syntax error"),
        NullChain::new(ROUND, BLOCK_TIME),
        NullDa::never(),
    );

    let failure = h
        .attestor
        .attest(&source(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::UpstreamRejection);
    assert!(h.chain.submitted().is_empty());
    let status = h.status(failure.id.as_ref().unwrap());
    assert_eq!(status.phase(), Phase::Failed);
    assert!(status.voting_round().is_none());
    assert!(status.error().unwrap().contains("jq: syntax error"));
}

#[tokio::test(start_paused = true)]
async fn proof_found_under_base64_spelling() {
    let h = Harness::new(
        &EngineConfig::default(),
        NullVerifier::returning(ENCODED.to_vec()),
        NullChain::new(ROUND, BLOCK_TIME),
        NullDa::serving(ROUND, RequestEncoding::Base64.encode(&ENCODED), raw_proof()),
    );

    let (id, _) = h
        .attestor
        .attest(&source(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(h.status(&id).phase(), Phase::ProofReady);
    assert_eq!(h.da.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn prepare_then_complete() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME));

    let prepared = h.attestor.prepare(&source()).await.unwrap();
    assert_eq!(prepared.encoded_request, ENCODED.to_vec());
    assert_eq!(h.status(&prepared.id).phase(), Phase::Preparing);

    let proof = h
        .attestor
        .complete(&prepared, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(proof.data.voting_round, ROUND);
    assert_eq!(h.status(&prepared.id).phase(), Phase::ProofReady);
}

#[tokio::test(start_paused = true)]
async fn concurrent_attestations_are_independent() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME).finalized_on_poll(2));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let attestor = h.attestor.clone();
            tokio::spawn(async move { attestor.attest(&source(), &CancellationToken::new()).await })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        let (id, _) = task.await.unwrap().unwrap();
        ids.push(id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(h.store.len(), 8);
    assert!(h
        .store
        .list()
        .unwrap()
        .iter()
        .all(|s| s.phase() == Phase::ProofReady));
    assert_eq!(h.chain.submitted().len(), 8);
}

#[tokio::test(start_paused = true)]
async fn cancellation_while_waiting() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME).never_finalized());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(45)).await;
        trigger.cancel();
    });

    let failure = h.attestor.attest(&source(), &cancel).await.unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::Cancelled);
    assert_eq!(
        h.status(failure.id.as_ref().unwrap()).error_kind(),
        Some(ErrorKind::Cancelled)
    );
}

/// Fetcher that fails without touching the record.
struct SilentFetcher;

#[async_trait]
impl ProofFetcher for SilentFetcher {
    async fn fetch(
        &self,
        _encoded_request: &[u8],
        voting_round: u64,
        _id: &AttestationId,
        _cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError> {
        Err(EngineError::ProofUnavailable {
            voting_round,
            attempts: 0,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn substituted_stage_failure_is_still_recorded() {
    let store = Arc::new(MemoryStatusStore::new());
    let records = Records::new(store.clone(), Arc::new(NullClock::new(BLOCK_TIME)));
    let chain = Arc::new(NullChain::new(ROUND, BLOCK_TIME));
    let attestor = Attestor::new(
        records.clone(),
        Arc::new(attestor_engine::VerifierPreparer::new(
            Arc::new(NullVerifier::returning(ENCODED.to_vec())),
            records.clone(),
        )),
        Arc::new(attestor_engine::ChainSubmitter::new(chain.clone(), records.clone())),
        Arc::new(attestor_engine::RelayWaiter::new(
            chain,
            records.clone(),
            200,
        )),
        Arc::new(SilentFetcher),
    );

    let failure = attestor
        .attest(&source(), &CancellationToken::new())
        .await
        .unwrap_err();
    let status = store.get(failure.id.as_ref().unwrap()).unwrap();
    assert_eq!(status.phase(), Phase::Failed);
    assert_eq!(status.error_kind(), Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn proxied_attestation_requires_public_url() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME));
    let definition = attestor_engine::presets::pull_request("o", "r", 1).unwrap();

    let failure = h
        .attestor
        .attest_proxied(&definition, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(failure.id.is_none());
    assert_eq!(failure.kind(), ErrorKind::Configuration);
    assert!(h.store.is_empty());

    let started = h.attestor.start(
        AttestRequest::Preset(attestor_engine::Preset::PullRequest {
            owner: "o".into(),
            repo: "r".into(),
            number: 1,
        }),
        CancellationToken::new(),
    );
    assert!(matches!(started, Err(ref f) if f.id.is_none()));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn proxied_attestation_points_verifier_at_cache() {
    use attestor_cache::{CacheProxy, Prefetcher, DEFAULT_RETENTION};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let source_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/o/r/pulls/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "number": 5,
            "state": "closed",
            "merged": true,
            "merged_at": "2024-01-01T00:00:00Z",
            "merge_commit_sha": "abc123",
            "html_url": "https://github.com/o/r/pull/5",
            "user": {"login": "someone"},
            "body": "long description"
        })))
        .mount(&source_server)
        .await;

    let config = EngineConfig {
        settle_secs: 0,
        ..EngineConfig::default()
    };
    let h = Harness::new(
        &config,
        NullVerifier::returning(ENCODED.to_vec()),
        NullChain::new(ROUND, BLOCK_TIME),
        NullDa::serving(ROUND, RequestEncoding::HexPrefixed.encode(&ENCODED), raw_proof()),
    );
    let cache = Arc::new(CacheProxy::new(Arc::new(NullClock::new(0)), DEFAULT_RETENTION));
    let prefetcher = Arc::new(Prefetcher::new(
        cache.clone(),
        Some("https://attestor.example/".into()),
    ));

    let records = Records::new(h.store.clone(), Arc::new(NullClock::new(BLOCK_TIME)));
    let attestor = Attestor::from_config(
        &config,
        records,
        h.verifier.clone(),
        h.chain.clone(),
        h.da.clone(),
    )
    .with_prefetcher(prefetcher);

    let mut definition = attestor_engine::presets::pull_request("o", "r", 5).unwrap();
    definition.url = format!("{}/repos/o/r/pulls/5", source_server.uri());

    let (id, _) = attestor
        .attest_proxied(&definition, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(h.status(&id).phase(), Phase::ProofReady);

    let sent = h.verifier.requests();
    assert_eq!(sent.len(), 1);
    let proxied = &sent[0].request_body.url;
    let key = proxied
        .strip_prefix("https://attestor.example/cache/")
        .expect("verifier should fetch from the cache proxy");
    let cached: serde_json::Value = serde_json::from_str(&cache.get(key).unwrap()).unwrap();
    assert_eq!(cached["merged"], true);
    assert_eq!(cached["merge_commit_sha"], "abc123");
    assert!(cached.get("user").is_none());
    assert_eq!(sent[0].request_body.post_process_jq, definition.post_process_jq);
}

#[tokio::test(start_paused = true)]
async fn background_start_returns_id_immediately() {
    let h = Harness::standard(NullChain::new(ROUND, BLOCK_TIME).finalized_on_poll(2));

    let id = h
        .attestor
        .start(AttestRequest::Direct(source()), CancellationToken::new())
        .unwrap();
    assert!(!h.status(&id).phase().is_terminal());

    while !h.status(&id).phase().is_terminal() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert_eq!(h.status(&id).phase(), Phase::ProofReady);
}

#[test]
fn attest_request_accepts_both_shapes() {
    let direct: AttestRequest = serde_json::from_value(serde_json::json!({
        "url": "https://src.example/a",
        "postProcessJq": ".",
        "abiSignature": "{}"
    }))
    .unwrap();
    assert!(matches!(direct, AttestRequest::Direct(ref s) if s.http_method == "GET"));

    let preset: AttestRequest = serde_json::from_value(serde_json::json!({
        "preset": "pull-request",
        "owner": "o",
        "repo": "r",
        "number": 3
    }))
    .unwrap();
    assert!(matches!(preset, AttestRequest::Preset(_)));
}
