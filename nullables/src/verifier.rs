//! Nullable verifier — scripted prepare responses.

use std::sync::Mutex;

use async_trait::async_trait;
use attestor_verifier::{PrepareRequest, VerifierApi, VerifierError};

#[derive(Clone, Debug)]
enum Script {
    Encoded(Vec<u8>),
    Rejected { status: u16, body: String },
    NoEncodedRequest,
    Unreachable,
}

/// Verifier that answers every prepare call the same way.
pub struct NullVerifier {
    script: Script,
    requests: Mutex<Vec<PrepareRequest>>,
}

impl NullVerifier {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer with `encoded` as the encoded request.
    pub fn returning(encoded: Vec<u8>) -> Self {
        Self::with_script(Script::Encoded(encoded))
    }

    /// Answer with a non-success HTTP status.
    pub fn rejecting(status: u16, body: &str) -> Self {
        Self::with_script(Script::Rejected {
            status,
            body: body.to_string(),
        })
    }

    /// Answer successfully but without an encoded request.
    pub fn without_encoded_request() -> Self {
        Self::with_script(Script::NoEncodedRequest)
    }

    pub fn unreachable() -> Self {
        Self::with_script(Script::Unreachable)
    }

    /// Every envelope received so far.
    pub fn requests(&self) -> Vec<PrepareRequest> {
        crate::lock(&self.requests).clone()
    }
}

#[async_trait]
impl VerifierApi for NullVerifier {
    async fn prepare_request(&self, request: &PrepareRequest) -> Result<Vec<u8>, VerifierError> {
        crate::lock(&self.requests).push(request.clone());
        match &self.script {
            Script::Encoded(bytes) => Ok(bytes.clone()),
            Script::Rejected { status, body } => Err(VerifierError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            Script::NoEncodedRequest => Err(VerifierError::NoEncodedRequest("INVALID".into())),
            Script::Unreachable => Err(VerifierError::Unreachable("connection refused".into())),
        }
    }
}
