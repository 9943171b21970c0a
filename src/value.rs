//! Frame value trees.
//!
//! A decoded or to-be-encoded frame is an ordered tree: each field name maps
//! to an integer, a byte string, a nested frame, or a sequence of nested
//! frames (for repeated structures). Field order is significant — it is the
//! wire order. A tree is local to one decode/encode call and has no identity
//! beyond it.

use alloc::borrow::Cow;
use alloc::vec::Vec;

/// A single field value inside a [`Frame`].
///
/// Byte values are [`Cow`]s: the decoder borrows them zero-copy from the
/// input buffer, while builders store owned bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value<'a> {
    /// Unsigned integer scalar (codes, lengths, ports, addresses, bit subfields).
    Uint(u64),
    /// Byte-string scalar (IP addresses, serial numbers, opaque payloads).
    Bytes(Cow<'a, [u8]>),
    /// Nested structure.
    Block(Frame<'a>),
    /// Repeated structures, in wire order.
    List(Vec<Frame<'a>>),
}

impl<'a> Value<'a> {
    /// Borrowed byte-string value.
    pub fn bytes(data: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(data))
    }

    /// Owned byte-string value.
    pub fn owned_bytes(data: Vec<u8>) -> Self {
        Value::Bytes(Cow::Owned(data))
    }
}

impl From<u64> for Value<'_> {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::Bytes(Cow::Borrowed(v))
    }
}

impl<'a> From<Frame<'a>> for Value<'a> {
    fn from(v: Frame<'a>) -> Self {
        Value::Block(v)
    }
}

/// Ordered field-name → value tree for one frame or structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Frame<'a> {
    fields: Vec<(&'static str, Value<'a>)>,
}

impl<'a> Frame<'a> {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub(crate) fn from_fields(fields: Vec<(&'static str, Value<'a>)>) -> Self {
        Self { fields }
    }

    /// Append a field (wire order is append order).
    pub fn push(&mut self, name: &'static str, value: Value<'a>) {
        self.fields.push((name, value));
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, name: &'static str, value: Value<'a>) -> Self {
        self.push(name, value);
        self
    }

    /// All fields in wire order.
    pub fn fields(&self) -> &[(&'static str, Value<'a>)] {
        &self.fields
    }

    /// Number of direct fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the frame has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a direct field by name.
    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Direct field as integer.
    pub fn uint(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(Value::Uint(v)) => Some(*v),
            _ => None,
        }
    }

    /// Direct field as byte string.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.get(name) {
            Some(Value::Bytes(b)) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Direct field as nested frame.
    pub fn frame(&self, name: &str) -> Option<&Frame<'a>> {
        match self.get(name) {
            Some(Value::Block(f)) => Some(f),
            _ => None,
        }
    }

    /// Direct field as repeated frames.
    pub fn list(&self, name: &str) -> Option<&[Frame<'a>]> {
        match self.get(name) {
            Some(Value::List(l)) => Some(l),
            _ => None,
        }
    }

    /// Recursive field lookup: direct fields first, then descent into nested
    /// frames in declaration order. Repeated fields are not descended into —
    /// a name inside a repeat is ambiguous by construction.
    pub fn find(&self, name: &str) -> Option<&Value<'a>> {
        find_in(&self.fields, name)
    }
}

/// Recursive lookup over a raw field list. Shared by [`Frame::find`] and the
/// dependency resolver's scope chain, which searches partially-built lists.
pub(crate) fn find_in<'f, 'a>(
    fields: &'f [(&'static str, Value<'a>)],
    name: &str,
) -> Option<&'f Value<'a>> {
    for (n, v) in fields {
        if *n == name {
            return Some(v);
        }
    }
    for (_, v) in fields {
        if let Value::Block(f) = v {
            if let Some(hit) = f.find(name) {
                return Some(hit);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_accessors() {
        let frame = Frame::new()
            .with("port", Value::Uint(3671))
            .with("ip address", Value::bytes(&[192, 168, 1, 1]));

        assert_eq!(frame.uint("port"), Some(3671));
        assert_eq!(frame.bytes("ip address"), Some(&[192, 168, 1, 1][..]));
        assert_eq!(frame.uint("ip address"), None);
        assert_eq!(frame.get("missing"), None);
    }

    #[test]
    fn test_find_descends_into_nested_blocks() {
        let header = Frame::new().with("service identifier", Value::Uint(0x0205));
        let frame = Frame::new()
            .with("header", Value::Block(header))
            .with("body", Value::Block(Frame::new()));

        assert_eq!(
            frame.find("service identifier"),
            Some(&Value::Uint(0x0205))
        );
    }

    #[test]
    fn test_find_prefers_direct_fields() {
        let inner = Frame::new().with("status", Value::Uint(0x21));
        let frame = Frame::new()
            .with("nested", Value::Block(inner))
            .with("status", Value::Uint(0x00));

        assert_eq!(frame.find("status"), Some(&Value::Uint(0x00)));
    }

    #[test]
    fn test_wire_order_is_preserved() {
        let frame = Frame::new()
            .with("b", Value::Uint(2))
            .with("a", Value::Uint(1));
        let names: alloc::vec::Vec<_> = frame.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
