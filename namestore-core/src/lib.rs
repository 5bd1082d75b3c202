//! namestore-core - Name and Packet Types
//!
//! Pure data structures and wire codecs with no storage behavior: the
//! hierarchical [`Name`] model, the NDN TLV variable-size number codec,
//! Data-packet metadata extraction and the stored [`Record`] type.
//! The storage layer lives in the `namestore` crate.

pub mod data;
pub mod error;
pub mod name;
pub mod record;
pub mod tlv;

pub use data::{encode_data, parse_data_metadata, DataMetadata};
pub use error::CodecError;
pub use name::{Component, Name};
pub use record::{Record, Timestamp};
