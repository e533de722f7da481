//! Nullable DA service — serves one proof for one exact request spelling.

use std::sync::Mutex;

use async_trait::async_trait;
use attestor_da::{DaApi, DaError, RawProof};

/// Answers "not ready" unless the round and request spelling match what it
/// was told to serve, and only from the `ready_from_call`-th call on.
pub struct NullDa {
    served: Option<(u64, String, RawProof)>,
    ready_from_call: usize,
    stalled: bool,
    calls: Mutex<Vec<(u64, String)>>,
}

impl NullDa {
    /// Never has a proof.
    pub fn never() -> Self {
        Self {
            served: None,
            ready_from_call: 1,
            stalled: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve `proof` for `request_bytes` in `voting_round`.
    pub fn serving(voting_round: u64, request_bytes: impl Into<String>, proof: RawProof) -> Self {
        Self {
            served: Some((voting_round, request_bytes.into(), proof)),
            ..Self::never()
        }
    }

    /// Accept every call and never respond.
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::never()
        }
    }

    /// Stay "not ready" for the first `call - 1` calls.
    pub fn ready_from_call(mut self, call: usize) -> Self {
        self.ready_from_call = call;
        self
    }

    /// `(voting_round, request_bytes)` of every call so far.
    pub fn calls(&self) -> Vec<(u64, String)> {
        crate::lock(&self.calls).clone()
    }
}

#[async_trait]
impl DaApi for NullDa {
    async fn proof_by_request_round(
        &self,
        voting_round: u64,
        request_bytes: &str,
    ) -> Result<RawProof, DaError> {
        let call = {
            let mut calls = crate::lock(&self.calls);
            calls.push((voting_round, request_bytes.to_string()));
            calls.len()
        };
        if self.stalled {
            std::future::pending::<()>().await;
        }
        match &self.served {
            Some((round, bytes, proof))
                if *round == voting_round && bytes == request_bytes && call >= self.ready_from_call =>
            {
                Ok(proof.clone())
            }
            _ => Err(DaError::NotReady {
                status: 400,
                body: "proof not available".into(),
            }),
        }
    }
}
