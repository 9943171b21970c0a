//! Scope-chain resolution for dependent fields.
//!
//! Variant and sized fields reference an earlier field by name. During a
//! walk, the referenced value may live among the current block's
//! already-processed fields or anywhere in an enclosing block (the FRAME
//! body's discriminant sits inside the header block, for instance). A
//! [`Scope`] links the partially-built field list of each nesting level into
//! a chain searched innermost-first.

use crate::schema::Schema;
use crate::value::{find_in, Value};

/// One nesting level of a decode/encode walk.
pub(crate) struct Scope<'f, 'a> {
    /// Fields of this level, in wire order, possibly still being built.
    pub fields: &'f [(&'static str, Value<'a>)],
    /// Enclosing level, if any.
    pub parent: Option<&'f Scope<'f, 'a>>,
}

impl<'f, 'a> Scope<'f, 'a> {
    /// Innermost-first lookup; within a level, direct fields shadow fields
    /// of nested blocks.
    pub fn find(&self, name: &str) -> Option<&'f Value<'a>> {
        if let Some(v) = find_in(self.fields, name) {
            return Some(v);
        }
        self.parent.and_then(|p| p.find(name))
    }

    pub fn find_uint(&self, name: &str) -> Option<u64> {
        match self.find(name) {
            Some(Value::Uint(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Resolve a variant field's target block: discriminant value through its
/// code table. `None` when the discriminant is absent or has no entry.
pub(crate) fn resolve_variant(
    schema: &Schema,
    scope: &Scope<'_, '_>,
    on: &str,
    table: &str,
) -> Option<&'static str> {
    let code = scope.find_uint(on)?;
    schema.code_name(table, code)
}

/// Resolve a sized field's byte length from its governor field.
pub(crate) fn resolve_size(scope: &Scope<'_, '_>, from: &str) -> Option<usize> {
    scope.find_uint(from).map(|v| v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Frame;

    #[test]
    fn test_scope_chain_searches_outward() {
        let outer_fields = [("service identifier", Value::Uint(0x0205))];
        let outer = Scope {
            fields: &outer_fields,
            parent: None,
        };
        let inner_fields = [("port", Value::Uint(3671))];
        let inner = Scope {
            fields: &inner_fields,
            parent: Some(&outer),
        };

        assert_eq!(inner.find_uint("port"), Some(3671));
        assert_eq!(inner.find_uint("service identifier"), Some(0x0205));
        assert_eq!(inner.find_uint("missing"), None);
    }

    #[test]
    fn test_scope_descends_into_nested_blocks() {
        let header = Frame::new().with("message code", Value::Uint(0x11));
        let fields = [("header", Value::Block(header))];
        let scope = Scope {
            fields: &fields,
            parent: None,
        };
        assert_eq!(scope.find_uint("message code"), Some(0x11));
    }
}
