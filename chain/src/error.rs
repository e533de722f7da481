use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid chain configuration: {0}")]
    Config(String),

    #[error("registry has no contract named {0:?}")]
    UnknownContract(String),

    #[error("RPC call failed: {0}")]
    Rpc(String),

    #[error("request submission failed: {0}")]
    Submission(String),

    #[error("request transaction {0} reverted")]
    Reverted(String),

    #[error("receipt missing for transaction {0}")]
    ReceiptMissing(String),

    #[error("block {0} missing after confirmation")]
    BlockMissing(u64),

    #[error("relay returned out-of-range value: {0}")]
    Overflow(String),
}
