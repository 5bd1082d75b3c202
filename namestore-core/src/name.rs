//! Hierarchical names: ordered sequences of typed byte components.
//!
//! A [`Name`] owns its components, unlike wire-level representations that
//! borrow from a packet buffer. Components order canonically by type, then
//! value length, then value bytes, and names order lexicographically over
//! components, so a name always sorts immediately before the names it is a
//! prefix of.

use core::cmp::Ordering;
use core::fmt;
use core::num::NonZeroU16;

use crate::error::CodecError;
use crate::tlv::{parse_tlv, var_number_length, write_tlv, write_var_number};

/// TLV type of a Name block.
pub const TLV_TYPE_NAME: u64 = 7;

/// GenericNameComponent.
pub const COMPONENT_TYPE_GENERIC: u16 = 8;
/// ImplicitSha256DigestComponent.
pub const COMPONENT_TYPE_IMPLICIT_SHA256: u16 = 1;
/// ParametersSha256DigestComponent.
pub const COMPONENT_TYPE_PARAMETER_SHA256: u16 = 2;

/// One typed component of a hierarchical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Component {
    typ: NonZeroU16,
    value: Vec<u8>,
}

impl Component {
    /// Create a component with an explicit type number. Zero is reserved.
    pub fn new(typ: u16, value: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        let typ = NonZeroU16::new(typ).ok_or(CodecError::ZeroComponentType)?;
        Ok(Self {
            typ,
            value: value.into(),
        })
    }

    /// Create a GenericNameComponent.
    pub fn generic(value: impl Into<Vec<u8>>) -> Self {
        Self {
            typ: COMPONENT_TYPE_GENERIC.try_into().unwrap(),
            value: value.into(),
        }
    }

    pub fn typ(&self) -> u16 {
        self.typ.get()
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    fn encoded_length(&self) -> usize {
        var_number_length(self.typ.get() as u64)
            + var_number_length(self.value.len() as u64)
            + self.value.len()
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        write_tlv(buf, self.typ.get() as u64, &self.value);
    }
}

impl Ord for Component {
    /// Canonical NDN component order: type, then value length, then value.
    fn cmp(&self, other: &Self) -> Ordering {
        self.typ
            .cmp(&other.typ)
            .then_with(|| self.value.len().cmp(&other.value.len()))
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A hierarchical name: an ordered sequence of [`Component`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    /// The empty name, a prefix of every name.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Append a component, returning the extended name.
    pub fn appending(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// True iff `self`'s components are a leading subsequence of `other`'s,
    /// including the case where the two names are equal.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        other.components.len() >= self.components.len()
            && other.components[..self.components.len()] == self.components[..]
    }

    /// Encode to the wire format: a Name TLV enclosing the concatenated
    /// component TLVs.
    pub fn to_wire(&self) -> Vec<u8> {
        let inner_len: usize = self.components.iter().map(Component::encoded_length).sum();
        let mut buf =
            Vec::with_capacity(var_number_length(TLV_TYPE_NAME) + var_number_length(inner_len as u64) + inner_len);
        write_var_number(&mut buf, TLV_TYPE_NAME);
        write_var_number(&mut buf, inner_len as u64);
        for component in &self.components {
            component.encode_into(&mut buf);
        }
        buf
    }

    /// Decode a Name TLV. Trailing bytes after the block are rejected.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, CodecError> {
        let outer = parse_tlv(bytes, 0)?;
        if outer.typ != TLV_TYPE_NAME {
            return Err(CodecError::UnexpectedType {
                expected: TLV_TYPE_NAME,
                found: outer.typ,
            });
        }
        if outer.span != bytes.len() {
            return Err(CodecError::Truncated);
        }
        Self::components_from_wire(outer.value)
    }

    /// Decode a bare concatenation of component TLVs (a Name block with its
    /// outer type and length stripped).
    pub fn components_from_wire(mut bytes: &[u8]) -> Result<Self, CodecError> {
        let mut components = Vec::new();
        while !bytes.is_empty() {
            let tlv = parse_tlv(bytes, 0)?;
            let typ: u16 = tlv
                .typ
                .try_into()
                .map_err(|_| CodecError::ComponentTypeRange(tlv.typ))?;
            components.push(Component::new(typ, tlv.value)?);
            bytes = &bytes[tlv.span..];
        }
        Ok(Self { components })
    }

    /// Parse a URI like `/a/b/c`. Empty segments collapse, `%XX` escapes are
    /// decoded, and a `<number>=` prefix selects a non-generic component
    /// type. `ndn:` schemes are accepted and ignored.
    pub fn from_uri(uri: &str) -> Result<Self, CodecError> {
        let uri = uri.strip_prefix("ndn:").unwrap_or(uri);
        let mut components = Vec::new();
        for segment in uri.split('/') {
            if segment.is_empty() {
                continue;
            }
            let (typ, raw) = match segment.split_once('=') {
                Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_digit()) => {
                    let typ: u16 = prefix.parse().map_err(|_| CodecError::InvalidUri {
                        reason: format!("component type out of range in {segment:?}"),
                    })?;
                    (typ, rest)
                }
                _ => (COMPONENT_TYPE_GENERIC, segment),
            };
            components.push(Component::new(typ, percent_decode(raw)?)?);
        }
        Ok(Self { components })
    }
}

fn percent_decode(segment: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(segment.len());
    let mut bytes = segment.bytes();
    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let hi = bytes.next();
        let lo = bytes.next();
        match (hi.and_then(hex_digit), lo.and_then(hex_digit)) {
            (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
            _ => {
                return Err(CodecError::InvalidUri {
                    reason: format!("bad percent-escape in {segment:?}"),
                })
            }
        }
    }
    Ok(out)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn is_unescaped(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.typ() != COMPONENT_TYPE_GENERIC {
            write!(f, "{}=", self.typ())?;
        }
        for &b in &self.value {
            if is_unescaped(b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{b:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[test]
    fn uri_parse_and_display() {
        let n = name("/alpha/beta/v1");
        assert_eq!(n.len(), 3);
        assert_eq!(n.components()[0].value(), b"alpha");
        assert_eq!(n.to_string(), "/alpha/beta/v1");

        assert_eq!(name("//alpha//beta/"), name("/alpha/beta"));
        assert_eq!(name("ndn:/alpha"), name("/alpha"));
        assert_eq!(Name::new().to_string(), "/");
    }

    #[test]
    fn uri_escapes_and_typed_components() {
        let n = name("/a%2Fb/1=abc");
        assert_eq!(n.components()[0].value(), b"a/b");
        assert_eq!(n.components()[1].typ(), COMPONENT_TYPE_IMPLICIT_SHA256);
        assert_eq!(n.to_string(), "/a%2Fb/1=abc");

        assert!(Name::from_uri("/bad%2").is_err());
        assert!(Name::from_uri("/bad%zz").is_err());
    }

    #[test]
    fn zero_component_type_rejected() {
        assert_eq!(Component::new(0, b"x".to_vec()), Err(CodecError::ZeroComponentType));
    }

    #[test]
    fn prefix_relation() {
        let a = name("/a/b");
        let b = name("/a/b/c");
        let c = name("/a/x");
        assert!(a.is_prefix_of(&b));
        assert!(a.is_prefix_of(&a));
        assert!(Name::new().is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(!a.is_prefix_of(&c));
        assert!(!c.is_prefix_of(&b));
    }

    #[test]
    fn ordering_sorts_prefix_first() {
        let mut names = vec![name("/a/b/c"), name("/a"), name("/a/b"), name("/b")];
        names.sort();
        assert_eq!(
            names,
            vec![name("/a"), name("/a/b"), name("/a/b/c"), name("/b")]
        );
    }

    #[test]
    fn component_canonical_order() {
        // shorter value sorts first regardless of byte content
        let short = Component::generic(b"zz".to_vec());
        let long = Component::generic(b"aaa".to_vec());
        assert!(short < long);
        // type dominates
        let digest = Component::new(COMPONENT_TYPE_IMPLICIT_SHA256, b"zzzz".to_vec()).unwrap();
        assert!(digest < short);
    }

    #[test]
    fn wire_roundtrip() {
        for uri in ["/", "/a", "/alpha/beta/v1", "/x/1=y"] {
            let n = name(uri);
            let wire = n.to_wire();
            assert_eq!(Name::from_wire(&wire).unwrap(), n);
        }
    }

    #[test]
    fn wire_rejects_trailing_bytes() {
        let mut wire = name("/a").to_wire();
        wire.push(0xFF);
        assert!(Name::from_wire(&wire).is_err());
    }
}
