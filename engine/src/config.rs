//! Engine configuration with TOML file support.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use attestor_chain::ChainSettings;
use attestor_da::{RequestEncoding, DEFAULT_ENCODINGS};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroizing;

use crate::{EngineError, FetchPolicy, WaitPolicy};

/// Submitter private key. Wiped on drop, redacted in `Debug`, never serialized.
#[derive(Clone, Default)]
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([redacted])")
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecretKey::new)
    }
}

/// Configuration for the attestation engine and the daemon around it.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). All durations are in seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the off-chain verifier.
    #[serde(default = "default_verifier_url")]
    pub verifier_url: String,

    #[serde(default)]
    pub verifier_api_key: String,

    /// Base URL of the data-availability service.
    #[serde(default = "default_da_url")]
    pub da_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub da_api_key: Option<String>,

    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    #[serde(default, skip_serializing)]
    pub private_key: SecretKey,

    /// Address of the contract registry.
    #[serde(default = "default_registry_address")]
    pub registry_address: String,

    #[serde(default = "default_hub_name")]
    pub hub_name: String,

    #[serde(default = "default_relay_name")]
    pub relay_name: String,

    /// Relay protocol id whose finalization is awaited.
    #[serde(default = "default_protocol_id")]
    pub protocol_id: u64,

    /// Fee attached to each request, in wei. Written as a decimal string;
    /// a plain integer is accepted too.
    #[serde(default = "default_request_fee_wei", with = "wei")]
    pub request_fee_wei: u128,

    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Base URL under which the verifier can reach `/cache/{key}`.
    /// Proxied attestations fail without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    /// Address the HTTP surface listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Bearer token for the attestation and metrics routes. Unset keeps
    /// those routes closed; `/cache/{key}` and `/health` stay public.
    #[serde(default, skip_serializing)]
    pub api_token: Option<SecretKey>,

    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Pause between finalization and the first DA request.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,

    /// Request-byte spellings tried against the DA service, in order.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<RequestEncoding>,

    #[serde(default = "default_cache_retention_secs")]
    pub cache_retention_secs: u64,

    #[serde(default = "default_cache_sweep_secs")]
    pub cache_sweep_secs: u64,

    /// How long finished status records are kept. `0` keeps them forever.
    #[serde(default = "default_record_retention_secs")]
    pub record_retention_secs: u64,

    #[serde(default = "default_record_sweep_secs")]
    pub record_sweep_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_verifier_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_da_url() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_registry_address() -> String {
    "0xaD67FE66660Fb8dFE9d6b1b4240d8650e30F6019".to_string()
}

fn default_hub_name() -> String {
    attestor_chain::contracts::DEFAULT_HUB_NAME.to_string()
}

fn default_relay_name() -> String {
    attestor_chain::contracts::DEFAULT_RELAY_NAME.to_string()
}

fn default_protocol_id() -> u64 {
    200
}

fn default_request_fee_wei() -> u128 {
    1_000_000_000_000_000_000
}

fn default_confirm_timeout_secs() -> u64 {
    120
}

fn default_listen_addr() -> String {
    "127.0.0.1:7080".to_string()
}

fn default_max_wait_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_settle_secs() -> u64 {
    30
}

fn default_fetch_attempts() -> u32 {
    30
}

fn default_fetch_interval_secs() -> u64 {
    10
}

fn default_encodings() -> Vec<RequestEncoding> {
    DEFAULT_ENCODINGS.to_vec()
}

fn default_cache_retention_secs() -> u64 {
    60 * 60
}

fn default_cache_sweep_secs() -> u64 {
    10 * 60
}

fn default_record_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_record_sweep_secs() -> u64 {
    10 * 60
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `u128` amounts as decimal strings; TOML integers stop at `i64::MAX`.
mod wei {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Integer(u64),
        Decimal(String),
    }

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Amount::deserialize(deserializer)? {
            Amount::Integer(n) => Ok(u128::from(n)),
            Amount::Decimal(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid wei amount {s:?}"))),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Read and parse `path`.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string. The private key is omitted.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Reject settings no attestation could succeed with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.private_key.is_empty() {
            return Err(EngineError::Config("submitter private key is not set".into()));
        }
        if self.poll_interval_secs == 0 || self.fetch_interval_secs == 0 {
            return Err(EngineError::Config("poll intervals must be non-zero".into()));
        }
        if self.fetch_attempts == 0 {
            return Err(EngineError::Config("fetch_attempts must be at least 1".into()));
        }
        if self.encodings.is_empty() {
            return Err(EngineError::Config("at least one request encoding is required".into()));
        }
        if self.cache_retention_secs == 0 {
            return Err(EngineError::Config("cache_retention_secs must be non-zero".into()));
        }
        if self.cache_sweep_secs == 0 || self.record_sweep_secs == 0 {
            return Err(EngineError::Config("sweep intervals must be non-zero".into()));
        }
        if self.api_token.as_ref().is_some_and(SecretKey::is_empty) {
            return Err(EngineError::Config("api_token is set but empty".into()));
        }
        Ok(())
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            max_wait: Duration::from_secs(self.max_wait_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
        }
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            settle: Duration::from_secs(self.settle_secs),
            max_attempts: self.fetch_attempts,
            interval: Duration::from_secs(self.fetch_interval_secs),
            encodings: self.encodings.clone(),
        }
    }

    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            rpc_url: self.rpc_url.clone(),
            registry_address: self.registry_address.clone(),
            hub_name: self.hub_name.clone(),
            relay_name: self.relay_name.clone(),
            request_fee_wei: self.request_fee_wei,
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
        }
    }

    pub fn cache_retention(&self) -> Duration {
        Duration::from_secs(self.cache_retention_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_secs)
    }

    /// `None` when record retention is disabled.
    pub fn record_retention(&self) -> Option<Duration> {
        (self.record_retention_secs > 0).then(|| Duration::from_secs(self.record_retention_secs))
    }

    pub fn record_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.record_sweep_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verifier_url: default_verifier_url(),
            verifier_api_key: String::new(),
            da_url: default_da_url(),
            da_api_key: None,
            rpc_url: default_rpc_url(),
            private_key: SecretKey::default(),
            registry_address: default_registry_address(),
            hub_name: default_hub_name(),
            relay_name: default_relay_name(),
            protocol_id: default_protocol_id(),
            request_fee_wei: default_request_fee_wei(),
            confirm_timeout_secs: default_confirm_timeout_secs(),
            public_base_url: None,
            listen_addr: default_listen_addr(),
            api_token: None,
            max_wait_secs: default_max_wait_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            settle_secs: default_settle_secs(),
            fetch_attempts: default_fetch_attempts(),
            fetch_interval_secs: default_fetch_interval_secs(),
            encodings: default_encodings(),
            cache_retention_secs: default_cache_retention_secs(),
            cache_sweep_secs: default_cache_sweep_secs(),
            record_retention_secs: default_record_retention_secs(),
            record_sweep_secs: default_record_sweep_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_survive_show_config_output() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.max_wait_secs, config.max_wait_secs);
        assert_eq!(parsed.encodings, config.encodings);
        assert_eq!(parsed.request_fee_wei, config.request_fee_wei);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.max_wait_secs, 300);
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.settle_secs, 30);
        assert_eq!(config.fetch_attempts, 30);
        assert_eq!(config.hub_name, "FdcHub");
        assert_eq!(config.relay_name, "Relay");
        assert_eq!(config.encodings, DEFAULT_ENCODINGS.to_vec());
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn listed_keys_override_defaults() {
        let toml = r#"
            max_wait_secs = 60
            encodings = ["base64", "hex-bare"]
            public_base_url = "https://attestor.example"
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.wait_policy().max_wait, Duration::from_secs(60));
        assert_eq!(
            config.encodings,
            vec![RequestEncoding::Base64, RequestEncoding::HexBare]
        );
        assert_eq!(config.public_base_url.as_deref(), Some("https://attestor.example"));
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn private_key_is_read_but_never_written() {
        let config = EngineConfig::from_toml_str(r#"private_key = "0xabc""#).unwrap();
        assert_eq!(config.private_key.expose(), "0xabc");
        assert!(!config.to_toml_string().unwrap().contains("0xabc"));
        assert!(!format!("{config:?}").contains("0xabc"));
    }

    #[test]
    fn validation_requires_a_key() {
        let mut config = EngineConfig::default();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
        config.private_key = SecretKey::new("0x01");
        assert!(config.validate().is_ok());
        config.encodings.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_sweep_or_cache_retention_is_rejected() {
        let valid = || EngineConfig {
            private_key: SecretKey::new("0x01"),
            ..EngineConfig::default()
        };
        for broken in [
            EngineConfig { cache_sweep_secs: 0, ..valid() },
            EngineConfig { record_sweep_secs: 0, ..valid() },
            EngineConfig { cache_retention_secs: 0, ..valid() },
        ] {
            assert!(matches!(broken.validate(), Err(EngineError::Config(_))));
        }
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn fee_above_u64_is_accepted_as_decimal_string() {
        let config =
            EngineConfig::from_toml_str(r#"request_fee_wei = "100000000000000000000""#).unwrap();
        assert_eq!(config.request_fee_wei, 100 * 10u128.pow(18));
        assert_eq!(config.chain_settings().request_fee_wei, 100 * 10u128.pow(18));

        let written = config.to_toml_string().unwrap();
        assert!(written.contains(r#"request_fee_wei = "100000000000000000000""#));

        let integer = EngineConfig::from_toml_str("request_fee_wei = 5").unwrap();
        assert_eq!(integer.request_fee_wei, 5);
        assert!(EngineConfig::from_toml_str(r#"request_fee_wei = "lots""#).is_err());
    }

    #[test]
    fn api_token_is_never_written() {
        let config = EngineConfig::from_toml_str(r#"api_token = "s3cret""#).unwrap();
        assert_eq!(config.api_token.as_ref().map(SecretKey::expose), Some("s3cret"));
        assert!(!config.to_toml_string().unwrap().contains("s3cret"));
    }

    #[test]
    fn zero_record_retention_disables_eviction() {
        let config = EngineConfig::from_toml_str("record_retention_secs = 0").unwrap();
        assert!(config.record_retention().is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "protocol_id = 7").unwrap();
        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.protocol_id, 7);
    }

    #[test]
    fn absent_file_is_a_config_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/attestor.toml");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
