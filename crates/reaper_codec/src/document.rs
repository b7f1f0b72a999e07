//! serde <-> CBOR bridge.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a value as a CBOR document.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serde rejects the value.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(value, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(format!("{e:?}")))?;
    Ok(buffer)
}

/// Decodes a CBOR document.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] on malformed bytes or a shape that
/// does not match `T`.
pub fn from_document<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(format!("{e:?}")))
}

/// A record type that is stored as one CBOR document.
///
/// Implementors only opt in; the encoding comes from their serde derives.
///
/// ```
/// use reaper_codec::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Tag {
///     name: String,
/// }
///
/// impl Document for Tag {}
///
/// let tag = Tag { name: "rust".into() };
/// assert_eq!(Tag::decode(&tag.encode().unwrap()).unwrap(), tag);
/// ```
pub trait Document: Serialize + DeserializeOwned {
    /// Encodes this record.
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_document(self)
    }

    /// Decodes a record previously produced by [`encode`](Self::encode).
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_document(bytes)
    }
}
