use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub use crux_kv::error::KeyValueError;
pub use crux_kv::value::Value;
pub use crux_kv::{KeyValue, KeyValueOperation, KeyValueResponse, KeyValueResult};

pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// What every `get`, `set` and `delete` reports back: the stored (or
/// previous) bytes, if any.
pub type KvResult = Result<Option<Vec<u8>>, KeyValueError>;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("storage error: {0}")]
    Store(#[from] KeyValueError),

    #[error("value too large: {size} bytes exceeds maximum of {max} bytes")]
    ValueTooLarge { size: usize, max: usize },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

/// Reads a stored value as UTF-8 text.
pub fn read_string(result: KvResult) -> Result<Option<String>, KvError> {
    match result? {
        None => Ok(None),
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| KvError::Serialization {
                message: e.to_string(),
            }),
    }
}

/// Reads a stored value as JSON.
pub fn read_json<T: DeserializeOwned>(result: KvResult) -> Result<Option<T>, KvError> {
    match result? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| KvError::Serialization {
                message: e.to_string(),
            }),
    }
}

/// Encodes `value` for storage.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, KvError> {
    let data = serde_json::to_vec(value).map_err(|e| KvError::Serialization {
        message: e.to_string(),
    })?;
    if data.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge {
            size: data.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(data)
}
