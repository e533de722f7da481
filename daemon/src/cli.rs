//! Command line: every setting may come from a flag, an environment
//! variable or the TOML config file, in that order of precedence.

use std::path::PathBuf;

use attestor_engine::{EngineConfig, SecretKey};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "attestor", about = "Web data attestation daemon", version)]
pub struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ATTESTOR_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "ATTESTOR_VERIFIER_URL")]
    pub verifier_url: Option<String>,

    #[arg(long, env = "ATTESTOR_VERIFIER_API_KEY", hide_env_values = true)]
    pub verifier_api_key: Option<String>,

    #[arg(long, env = "ATTESTOR_DA_URL")]
    pub da_url: Option<String>,

    #[arg(long, env = "ATTESTOR_DA_API_KEY", hide_env_values = true)]
    pub da_api_key: Option<String>,

    /// Chain JSON-RPC endpoint.
    #[arg(long, env = "ATTESTOR_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Submitter key. Prefer the environment variable over the flag.
    #[arg(long, env = "ATTESTOR_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    #[arg(long, env = "ATTESTOR_REGISTRY_ADDRESS")]
    pub registry_address: Option<String>,

    /// Base URL at which the verifier reaches this daemon's `/cache/{key}`.
    #[arg(long, env = "ATTESTOR_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// HTTP listen address, e.g. "0.0.0.0:7080".
    #[arg(long, env = "ATTESTOR_LISTEN")]
    pub listen: Option<String>,

    /// Bearer token required on `/attestations` and `/metrics`.
    #[arg(long, env = "ATTESTOR_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ATTESTOR_LOG_FORMAT")]
    pub log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ATTESTOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP surface and background sweepers until interrupted.
    Serve,

    /// Attest a directly reachable JSON source and print the proof.
    Attest {
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// jq filter applied by the verifier.
        #[arg(long)]
        jq: String,
        /// JSON ABI fragment describing the filtered result.
        #[arg(long)]
        abi: String,
    },

    /// Attest the merge state of a GitHub pull request through the cache proxy.
    AttestPr {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        #[arg(long)]
        number: u64,
    },

    /// Print the effective configuration (without secrets) and exit.
    ShowConfig,
}

impl Cli {
    /// File config (or defaults) with flags and env applied on top.
    pub fn resolve_config(&self) -> anyhow::Result<EngineConfig> {
        let base = match &self.config {
            Some(path) => {
                let config = EngineConfig::from_toml_file(path)?;
                tracing::info!("loaded config from {}", path.display());
                config
            }
            None => EngineConfig::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(&self, file: EngineConfig) -> EngineConfig {
        fn pick(flag: &Option<String>, file: String) -> String {
            flag.clone().unwrap_or(file)
        }

        EngineConfig {
            verifier_url: pick(&self.verifier_url, file.verifier_url),
            verifier_api_key: pick(&self.verifier_api_key, file.verifier_api_key),
            da_url: pick(&self.da_url, file.da_url),
            da_api_key: self.da_api_key.clone().or(file.da_api_key),
            rpc_url: pick(&self.rpc_url, file.rpc_url),
            private_key: self
                .private_key
                .as_deref()
                .map(SecretKey::new)
                .unwrap_or(file.private_key),
            registry_address: pick(&self.registry_address, file.registry_address),
            public_base_url: self.public_base_url.clone().or(file.public_base_url),
            listen_addr: pick(&self.listen, file.listen_addr),
            api_token: self
                .api_token
                .as_deref()
                .map(SecretKey::new)
                .or(file.api_token),
            log_format: pick(&self.log_format, file.log_format),
            log_level: pick(&self.log_level, file.log_level),
            ..file
        }
    }
}
