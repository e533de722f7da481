use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid hex input: {0}")]
    InvalidHex(String),

    #[error("response does not match the Web2Json ABI layout: {0}")]
    Decode(String),
}
