//! Data packet metadata extraction and a minimal encoder.
//!
//! The store never interprets packet internals beyond the MetaInfo block:
//! the FreshnessPeriod is the only field that feeds expiry computation.
//! [`encode_data`] builds a structurally valid Data packet so applications
//! and tests can produce inputs without a full NDN library; signatures are
//! written as a DigestSha256 placeholder since the store does not validate
//! them.

use std::time::Duration;

use crate::error::CodecError;
use crate::name::Name;
use crate::tlv::{encode_nonneg_integer, parse_nonneg_integer, parse_tlv, write_tlv};

/// TLV type of a Data packet.
pub const TLV_TYPE_DATA: u64 = 6;

const TLV_TYPE_META_INFO: u64 = 20;
const TLV_TYPE_CONTENT: u64 = 21;
const TLV_TYPE_SIGNATURE_INFO: u64 = 22;
const TLV_TYPE_SIGNATURE_VALUE: u64 = 23;
const TLV_TYPE_CONTENT_TYPE: u64 = 24;
const TLV_TYPE_FRESHNESS_PERIOD: u64 = 25;
const TLV_TYPE_SIGNATURE_TYPE: u64 = 27;

const SIGNATURE_TYPE_DIGEST_SHA256: u64 = 0;

/// Metadata carried in a Data packet's MetaInfo block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataMetadata {
    pub content_type: Option<u64>,
    /// Declared freshness window; `None` when the producer declared none.
    pub freshness_period: Option<Duration>,
}

/// Extract [`DataMetadata`] from an encoded Data packet.
///
/// Unknown TLVs inside the packet and inside MetaInfo are skipped. A packet
/// without a MetaInfo block yields the default (empty) metadata.
pub fn parse_data_metadata(packet: &[u8]) -> Result<DataMetadata, CodecError> {
    let outer = parse_tlv(packet, 0)?;
    if outer.typ != TLV_TYPE_DATA {
        return Err(CodecError::UnexpectedType {
            expected: TLV_TYPE_DATA,
            found: outer.typ,
        });
    }

    let mut metadata = DataMetadata::default();
    let mut body = outer.value;
    while !body.is_empty() {
        let tlv = parse_tlv(body, 0)?;
        if tlv.typ == TLV_TYPE_META_INFO {
            let mut inner = tlv.value;
            while !inner.is_empty() {
                let field = parse_tlv(inner, 0)?;
                match field.typ {
                    TLV_TYPE_CONTENT_TYPE => {
                        metadata.content_type = Some(parse_nonneg_integer(field.value)?);
                    }
                    TLV_TYPE_FRESHNESS_PERIOD => {
                        let ms = parse_nonneg_integer(field.value)?;
                        metadata.freshness_period = Some(Duration::from_millis(ms));
                    }
                    _ => {}
                }
                inner = &inner[field.span..];
            }
            break;
        }
        body = &body[tlv.span..];
    }
    Ok(metadata)
}

/// Encode a Data packet carrying `content` under `name`.
///
/// MetaInfo is emitted only when a freshness period is declared. The
/// signature is a 32-byte zero DigestSha256 placeholder.
pub fn encode_data(name: &Name, freshness_period: Option<Duration>, content: &[u8]) -> Vec<u8> {
    let mut body = name.to_wire();

    if let Some(period) = freshness_period {
        let millis = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        let mut meta = Vec::new();
        write_tlv(
            &mut meta,
            TLV_TYPE_FRESHNESS_PERIOD,
            &encode_nonneg_integer(millis),
        );
        write_tlv(&mut body, TLV_TYPE_META_INFO, &meta);
    }

    write_tlv(&mut body, TLV_TYPE_CONTENT, content);

    let mut signature_info = Vec::new();
    write_tlv(
        &mut signature_info,
        TLV_TYPE_SIGNATURE_TYPE,
        &encode_nonneg_integer(SIGNATURE_TYPE_DIGEST_SHA256),
    );
    write_tlv(&mut body, TLV_TYPE_SIGNATURE_INFO, &signature_info);
    write_tlv(&mut body, TLV_TYPE_SIGNATURE_VALUE, &[0u8; 32]);

    let mut packet = Vec::new();
    write_tlv(&mut packet, TLV_TYPE_DATA, &body);
    packet
}
