//! # Reaper Codec
//!
//! Binary document encoding for stored records.
//!
//! Records are serialized with serde into CBOR, a self-describing binary
//! format. Field names travel with the data, so a record can be inspected
//! without its Rust type, and `decode(encode(x)) == x` holds for every value.
//!
//! The crate also defines [`ObjectId`], the 12-byte time-ordered identifier
//! used for categories and feeds.
//!
//! ## Usage
//!
//! ```
//! use reaper_codec::{from_document, to_document};
//!
//! let bytes = to_document(&("tech", 3u32)).unwrap();
//! let decoded: (String, u32) = from_document(&bytes).unwrap();
//! assert_eq!(decoded, ("tech".to_string(), 3));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod object_id;

pub use document::{from_document, to_document, Document};
pub use error::{CodecError, CodecResult};
pub use object_id::{ObjectId, OBJECT_ID_LEN};
