//! The stored record: a packet paired with its expiry timestamp.

use chrono::{DateTime, Utc};

use crate::data::parse_data_metadata;
use crate::error::CodecError;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// A stored packet and the instant it stops being fresh.
///
/// `expire_at` is `None` when the packet declared no freshness period; such
/// records satisfy every freshness requirement. Staleness is always judged
/// against the clock at read time, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub packet: Vec<u8>,
    pub expire_at: Option<Timestamp>,
}

impl Record {
    /// Build a record from an encoded Data packet, computing `expire_at` as
    /// now plus the packet's declared freshness period.
    pub fn from_packet(packet: &[u8]) -> Result<Self, CodecError> {
        let metadata = parse_data_metadata(packet)?;
        let expire_at = metadata.freshness_period.map(|period| {
            // a wire-valid period can exceed both i64 milliseconds and the
            // calendar range; saturate instead of wrapping into the past
            let millis = i64::try_from(period.as_millis()).unwrap_or(i64::MAX);
            Utc::now()
                .checked_add_signed(chrono::Duration::milliseconds(millis))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        });
        Ok(Self {
            packet: packet.to_vec(),
            expire_at,
        })
    }

    /// True iff the record is fresh at `now`. Records without an expiry are
    /// always fresh.
    pub fn is_fresh_at(&self, now: Timestamp) -> bool {
        self.expire_at.map_or(true, |expire_at| expire_at > now)
    }

    /// Apply the read-side freshness filter.
    pub fn satisfies(&self, must_be_fresh: bool, now: Timestamp) -> bool {
        !must_be_fresh || self.is_fresh_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encode_data;
    use crate::name::Name;
    use std::time::Duration;

    #[test]
    fn record_without_freshness_is_always_fresh() {
        let name = Name::from_uri("/r").unwrap();
        let record = Record::from_packet(&encode_data(&name, None, b"x")).unwrap();
        assert_eq!(record.expire_at, None);
        assert!(record.is_fresh_at(Utc::now()));
        assert!(record.satisfies(true, Utc::now()));
    }

    #[test]
    fn record_expiry_from_freshness_period() {
        let name = Name::from_uri("/r").unwrap();
        let record =
            Record::from_packet(&encode_data(&name, Some(Duration::from_secs(60)), b"x")).unwrap();
        let expire_at = record.expire_at.expect("expiry should be set");

        let now = Utc::now();
        assert!(expire_at > now + chrono::Duration::seconds(50));
        assert!(expire_at < now + chrono::Duration::seconds(70));

        assert!(record.satisfies(true, now));
        assert!(!record.satisfies(true, expire_at));
        assert!(record.satisfies(false, expire_at + chrono::Duration::days(1)));
    }

    #[test]
    fn enormous_freshness_period_saturates_into_the_future() {
        let name = Name::from_uri("/r").unwrap();
        // u64::MAX milliseconds is wire-valid but past every i64 and
        // calendar bound; it must not wrap into the past
        let packet = encode_data(&name, Some(Duration::from_millis(u64::MAX)), b"x");
        let record = Record::from_packet(&packet).unwrap();

        let expire_at = record.expire_at.expect("expiry should be set");
        assert!(expire_at > Utc::now());
        assert!(record.satisfies(true, Utc::now()));
    }
}
