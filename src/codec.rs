// Dashboard document (de)serialization.

use bytes::Bytes;
use thiserror::Error;

use crate::models::DashboardData;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("decode dashboard: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("encode dashboard: {0}")]
    Encode(#[source] serde_json::Error),
}

pub trait DocumentCodec: Send + Sync {
    /// Must ignore unknown fields.
    fn decode(&self, bytes: &[u8]) -> Result<DashboardData, CodecError>;
    fn encode(&self, doc: &DashboardData) -> Result<Bytes, CodecError>;
}

/// JSON codec. History is a `BTreeMap`, so equal documents encode to identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl DocumentCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DashboardData, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    fn encode(&self, doc: &DashboardData) -> Result<Bytes, CodecError> {
        let out = if self.pretty {
            serde_json::to_vec_pretty(doc)
        } else {
            serde_json::to_vec(doc)
        };
        out.map(Bytes::from).map_err(CodecError::Encode)
    }
}
