//! Nullable chain — records submissions, finalizes on a scripted poll.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use attestor_chain::{AttestationChain, ChainError, Submission};

/// In-memory ledger.
///
/// Every submission lands in block 1 at `block_timestamp`; the relay maps
/// any timestamp to `voting_round`.
pub struct NullChain {
    voting_round: u64,
    block_timestamp: u64,
    /// `None` never finalizes.
    finalized_on_poll: Option<u32>,
    submission_error: Option<String>,
    stalled_relay: bool,
    polls: AtomicU32,
    submitted: Mutex<Vec<Vec<u8>>>,
    queried_timestamps: Mutex<Vec<u64>>,
}

impl NullChain {
    /// A chain whose round is finalized on the first poll.
    pub fn new(voting_round: u64, block_timestamp: u64) -> Self {
        Self {
            voting_round,
            block_timestamp,
            finalized_on_poll: Some(1),
            submission_error: None,
            stalled_relay: false,
            polls: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
            queried_timestamps: Mutex::new(Vec::new()),
        }
    }

    /// Report the round finalized starting at the `poll`-th query (1-based).
    pub fn finalized_on_poll(mut self, poll: u32) -> Self {
        self.finalized_on_poll = Some(poll);
        self
    }

    pub fn never_finalized(mut self) -> Self {
        self.finalized_on_poll = None;
        self
    }

    /// Relay accepts finalization queries but never answers them.
    pub fn stalled_relay(mut self) -> Self {
        self.stalled_relay = true;
        self
    }

    /// Make every submission fail with `reason`.
    pub fn failing_submission(mut self, reason: &str) -> Self {
        self.submission_error = Some(reason.to_string());
        self
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<Vec<u8>> {
        crate::lock(&self.submitted).clone()
    }

    /// Timestamps passed to `voting_round_at`.
    pub fn queried_timestamps(&self) -> Vec<u64> {
        crate::lock(&self.queried_timestamps).clone()
    }
}

#[async_trait]
impl AttestationChain for NullChain {
    async fn submit_request(&self, encoded_request: &[u8]) -> Result<Submission, ChainError> {
        if let Some(reason) = &self.submission_error {
            return Err(ChainError::Submission(reason.clone()));
        }
        let mut submitted = crate::lock(&self.submitted);
        submitted.push(encoded_request.to_vec());
        Ok(Submission {
            tx_hash: format!("0x{:064x}", submitted.len()),
            block_number: 1,
            block_timestamp: self.block_timestamp,
        })
    }

    async fn voting_round_at(&self, timestamp: u64) -> Result<u64, ChainError> {
        crate::lock(&self.queried_timestamps).push(timestamp);
        Ok(self.voting_round)
    }

    async fn is_finalized(&self, _protocol_id: u64, voting_round: u64) -> Result<bool, ChainError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.stalled_relay {
            std::future::pending::<()>().await;
        }
        if voting_round != self.voting_round {
            return Ok(false);
        }
        Ok(self.finalized_on_poll.is_some_and(|target| poll >= target))
    }
}
