//! Ready-made source definitions for proxied attestations.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Web2JsonSource};

/// A source fetched by the engine itself and republished through the cache
/// proxy before the verifier sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDefinition {
    /// Where the engine fetches the original document.
    pub url: String,
    /// Dotted field paths kept in the republished copy.
    pub keep: Vec<String>,
    pub post_process_jq: String,
    pub abi_signature: String,
}

impl SourceDefinition {
    /// The request the verifier actually receives, pointed at the proxy.
    pub fn proxied(&self, proxied_url: String) -> Web2JsonSource {
        Web2JsonSource {
            url: proxied_url,
            http_method: "GET".to_string(),
            post_process_jq: self.post_process_jq.clone(),
            abi_signature: self.abi_signature.clone(),
        }
    }

    pub fn keep_paths(&self) -> Vec<&str> {
        self.keep.iter().map(String::as_str).collect()
    }
}

/// Named presets accepted by the HTTP surface and the CLI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "kebab-case")]
pub enum Preset {
    PullRequest {
        owner: String,
        repo: String,
        number: u64,
    },
}

impl Preset {
    pub fn definition(&self) -> Result<SourceDefinition, EngineError> {
        match self {
            Preset::PullRequest {
                owner,
                repo,
                number,
            } => pull_request(owner, repo, *number),
        }
    }
}

const PULL_REQUEST_FIELDS: [&str; 6] = [
    "number",
    "state",
    "merged",
    "merged_at",
    "merge_commit_sha",
    "html_url",
];

const PULL_REQUEST_JQ: &str = r#"{number: .number, merged: .merged, mergedAt: (.merged_at // ""), mergeCommitSha: (.merge_commit_sha // "")}"#;

const PULL_REQUEST_ABI: &str = r#"{"components":[{"internalType":"uint256","name":"number","type":"uint256"},{"internalType":"bool","name":"merged","type":"bool"},{"internalType":"string","name":"mergedAt","type":"string"},{"internalType":"string","name":"mergeCommitSha","type":"string"}],"name":"task","type":"tuple"}"#;

fn path_segment(value: &str, what: &str) -> Result<String, EngineError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid && value != "." && value != ".." {
        Ok(value.to_string())
    } else {
        Err(EngineError::InvalidSource(format!("invalid {what}: {value:?}")))
    }
}

/// Merge state of a GitHub pull request.
pub fn pull_request(owner: &str, repo: &str, number: u64) -> Result<SourceDefinition, EngineError> {
    let owner = path_segment(owner, "owner")?;
    let repo = path_segment(repo, "repository")?;
    Ok(SourceDefinition {
        url: format!("https://api.github.com/repos/{owner}/{repo}/pulls/{number}"),
        keep: PULL_REQUEST_FIELDS.iter().map(|f| f.to_string()).collect(),
        post_process_jq: PULL_REQUEST_JQ.to_string(),
        abi_signature: PULL_REQUEST_ABI.to_string(),
    })
}
