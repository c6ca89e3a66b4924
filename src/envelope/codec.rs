//! Wire encoding of envelopes.

use super::types::Envelope;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Payload encoding format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadEncoding {
    MessagePack,
    Json,
}

impl Default for PayloadEncoding {
    fn default() -> Self {
        PayloadEncoding::MessagePack
    }
}

/// Encode an envelope into the bytes handed to sinks.
pub fn encode(envelope: &Envelope, encoding: PayloadEncoding) -> Result<Vec<u8>> {
    let bytes = match encoding {
        // Named fields keep the payload readable by schema-less consumers.
        PayloadEncoding::MessagePack => rmp_serde::to_vec_named(envelope)?,
        PayloadEncoding::Json => serde_json::to_vec(envelope)?,
    };
    Ok(bytes)
}
