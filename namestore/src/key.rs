//! Persistence-key transform.
//!
//! Backends store records under the wire-encoded name with the outer type
//! and length headers stripped, leaving only the concatenated component
//! TLVs. Dropping the whole-name length header is what makes the transform
//! useful: with it in place two names of different total lengths would
//! diverge in their leading bytes even when they share components, and a
//! byte-prefix scan in the backend could no longer stand in for a name
//! prefix search.

use namestore_core::tlv::parse_var_number;
use namestore_core::{CodecError, Name};

/// Derive the backend key for `name`.
///
/// For any names A and B, A is a name prefix of B iff `persistence_key(A)`
/// is a byte prefix of `persistence_key(B)`. The empty name maps to the
/// empty key, a prefix of every key.
pub fn persistence_key(name: &Name) -> Result<Vec<u8>, CodecError> {
    let wire = name.to_wire();
    let mut offset = 0;
    let (_typ, consumed) = parse_var_number(&wire, offset)?;
    offset += consumed;
    let (_len, consumed) = parse_var_number(&wire, offset)?;
    offset += consumed;
    Ok(wire[offset..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use namestore_core::Component;
    use proptest::prelude::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[test]
    fn key_is_wire_without_envelope() {
        let n = name("/a/b");
        let key = persistence_key(&n).unwrap();
        let wire = n.to_wire();
        assert!(wire.ends_with(&key));
        // generic component TLVs only: 08 01 'a' 08 01 'b'
        assert_eq!(key, vec![8, 1, b'a', 8, 1, b'b']);
    }

    #[test]
    fn empty_name_maps_to_empty_key() {
        assert_eq!(persistence_key(&Name::new()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn name_prefix_implies_key_prefix() {
        let a = persistence_key(&name("/edge/video")).unwrap();
        let b = persistence_key(&name("/edge/video/seg0")).unwrap();
        let c = persistence_key(&name("/edge/videos")).unwrap();
        assert!(b.starts_with(&a));
        // "/edge/video" is not a name prefix of "/edge/videos"
        assert!(!c.starts_with(&a));
        assert!(!a.starts_with(&c));
    }

    fn arbitrary_name() -> impl Strategy<Value = Name> {
        proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..4), 0..5).prop_map(
            |components| {
                Name::from_components(components.into_iter().map(Component::generic).collect())
            },
        )
    }

    proptest! {
        // The load-bearing invariant: byte-prefix containment of keys is
        // exactly name-prefix containment, in both directions.
        #[test]
        fn key_prefix_matches_name_prefix(a in arbitrary_name(), b in arbitrary_name()) {
            let key_a = persistence_key(&a).unwrap();
            let key_b = persistence_key(&b).unwrap();
            prop_assert_eq!(a.is_prefix_of(&b), key_b.starts_with(&key_a));
            prop_assert_eq!(b.is_prefix_of(&a), key_a.starts_with(&key_b));
        }
    }
}
