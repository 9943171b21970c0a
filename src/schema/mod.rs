//! Grammar tables and the compiled schema registry.
//!
//! A schema is built from declarative block definitions: each block is an
//! ordered list of [`FieldDef`]s, and dependent fields (variants, sized byte
//! runs) name the earlier field they depend on. [`Schema::new`] compiles and
//! validates the tables once; the decoder and encoder then interpret the
//! compiled registry without any per-message code.
//!
//! Field definitions are built with `const fn`s so grammars can live in
//! static tables:
//!
//! ```text
//! const HPAI: &[FieldDef] = &[
//!     FieldDef::length("structure length", 1),
//!     FieldDef::uint("host protocol code", 1).with_default(0x01),
//!     FieldDef::bytes("ip address", 4),
//!     FieldDef::uint("port", 2),
//! ];
//! ```

pub mod knxnet;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::{DecodeError, SchemaError, SchemaErrorKind};

/// What a length-prefix field measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LengthScope {
    /// The enclosing block, including the length field itself.
    Block,
    /// The whole frame from its first byte.
    Total,
}

/// Field layout kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKind {
    /// Big-endian unsigned integer of `size` bytes (1..=8).
    Uint { size: usize },
    /// Fixed-size byte string.
    Bytes { size: usize },
    /// Length prefix of `size` bytes, computed on encode and enforced
    /// on decode.
    Length { size: usize, scope: LengthScope },
    /// Bit-packed span; the field name lists sub-names comma-separated,
    /// one per width.
    Bits { widths: &'static [u8] },
    /// Nested block by name.
    Block { block: &'static str },
    /// Nested block selected by an earlier field's value through a code
    /// table.
    Variant { on: &'static str, table: &'static str },
    /// Byte string whose length is an earlier field's value.
    SizedBytes { from: &'static str },
    /// Byte string consuming the rest of the enclosing region.
    Tail,
}

/// One declarative field in a block definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldDef {
    name: &'static str,
    kind: FieldKind,
    optional: bool,
    repeated: bool,
    default: Option<u64>,
}

impl FieldDef {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            optional: false,
            repeated: false,
            default: None,
        }
    }

    /// Big-endian unsigned integer field.
    pub const fn uint(name: &'static str, size: usize) -> Self {
        Self::new(name, FieldKind::Uint { size })
    }

    /// Fixed-size byte-string field.
    pub const fn bytes(name: &'static str, size: usize) -> Self {
        Self::new(name, FieldKind::Bytes { size })
    }

    /// Block-scoped length prefix (covers the enclosing block, itself
    /// included).
    pub const fn length(name: &'static str, size: usize) -> Self {
        Self::new(
            name,
            FieldKind::Length {
                size,
                scope: LengthScope::Block,
            },
        )
    }

    /// Frame-scoped length prefix (covers the whole frame).
    pub const fn total_length(name: &'static str, size: usize) -> Self {
        Self::new(
            name,
            FieldKind::Length {
                size,
                scope: LengthScope::Total,
            },
        )
    }

    /// Bit-packed span. `names` is a comma-separated sub-name list, one
    /// name per entry in `widths`.
    pub const fn bits(names: &'static str, widths: &'static [u8]) -> Self {
        Self::new(names, FieldKind::Bits { widths })
    }

    /// Nested block field.
    pub const fn block(name: &'static str, block: &'static str) -> Self {
        Self::new(name, FieldKind::Block { block })
    }

    /// Dependent block field: the block decoded/encoded here is chosen by
    /// the value of field `on`, mapped through code table `table`.
    pub const fn variant(name: &'static str, on: &'static str, table: &'static str) -> Self {
        Self::new(name, FieldKind::Variant { on, table })
    }

    /// Byte string whose length is the value of the earlier field `from`.
    pub const fn sized(name: &'static str, from: &'static str) -> Self {
        Self::new(name, FieldKind::SizedBytes { from })
    }

    /// Byte string consuming the rest of the enclosing region.
    pub const fn tail(name: &'static str) -> Self {
        Self::new(name, FieldKind::Tail)
    }

    /// Declare a default value, filled by the encoder when the field is
    /// absent from the value tree.
    pub const fn with_default(mut self, value: u64) -> Self {
        self.default = Some(value);
        self
    }

    /// Mark the field optional: skipped by the decoder when its region is
    /// exhausted and by the encoder when absent from the tree.
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field repeated: decoded as a sequence of block elements
    /// until the enclosing region is exhausted.
    pub const fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// A compiled field: the declarative [`FieldDef`] plus derived links.
#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
    pub repeated: bool,
    pub default: Option<u64>,
    /// When this integer field is the length governor of a later sized
    /// field, the governed field's name. The encoder then computes its
    /// value instead of trusting the caller.
    pub length_of: Option<&'static str>,
    /// Split sub-names for bit-packed fields, empty otherwise.
    pub bit_names: Vec<&'static str>,
}

/// A compiled block: ordered fields.
#[derive(Debug, Clone)]
pub(crate) struct BlockDef {
    pub fields: Vec<Field>,
}

/// Compiled, validated grammar registry.
///
/// Immutable after construction; decode and encode borrow it concurrently.
#[derive(Debug)]
pub struct Schema {
    blocks: BTreeMap<&'static str, BlockDef>,
    codes: BTreeMap<&'static str, BTreeMap<u64, &'static str>>,
    object_types: BTreeMap<&'static str, u16>,
    properties: BTreeMap<&'static str, BTreeMap<&'static str, u16>>,
}

/// Depth cap when expanding nested blocks for visibility checks.
const EXPAND_DEPTH: usize = 8;

impl Schema {
    /// Compile and validate grammar tables into a registry.
    ///
    /// Rejects duplicate blocks, references to undefined blocks or tables,
    /// forward references from dependent fields, malformed bit layouts,
    /// repeats of non-block fields and out-of-range scalar sizes. On error
    /// nothing is retained.
    pub fn new(
        blocks: &[(&'static str, &[FieldDef])],
        codes: &[(&'static str, &[(u64, &'static str)])],
        object_types: &[(&'static str, u16)],
        properties: &[(&'static str, &[(&'static str, u16)])],
    ) -> Result<Self, SchemaError> {
        let mut schema = Self {
            blocks: BTreeMap::new(),
            codes: BTreeMap::new(),
            object_types: BTreeMap::new(),
            properties: BTreeMap::new(),
        };

        for &(table, entries) in codes {
            let mut map = BTreeMap::new();
            for &(code, target) in entries {
                map.insert(code, target);
            }
            schema.codes.insert(table, map);
        }
        for &(name, id) in object_types {
            schema.object_types.insert(name, id);
        }
        for &(object, entries) in properties {
            let mut map = BTreeMap::new();
            for &(prop, id) in entries {
                map.insert(prop, id);
            }
            schema.properties.insert(object, map);
        }

        for &(name, defs) in blocks {
            if schema.blocks.contains_key(name) {
                return Err(SchemaError::new(SchemaErrorKind::DuplicateBlock));
            }
            let block = compile_block(defs)?;
            schema.blocks.insert(name, block);
        }

        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for block in self.blocks.values() {
            let mut visible: Vec<&'static str> = Vec::new();
            for field in &block.fields {
                match field.kind {
                    FieldKind::Uint { size } | FieldKind::Length { size, .. } => {
                        if size == 0 || size > 8 {
                            return Err(SchemaError::new(SchemaErrorKind::InvalidFieldSize));
                        }
                    }
                    FieldKind::Bytes { size } => {
                        if size == 0 {
                            return Err(SchemaError::new(SchemaErrorKind::InvalidFieldSize));
                        }
                    }
                    FieldKind::Bits { widths } => {
                        let mut sum = 0usize;
                        for &w in widths {
                            if w == 0 || w > 63 {
                                return Err(SchemaError::new(SchemaErrorKind::InvalidBitfield));
                            }
                            sum += w as usize;
                        }
                        if sum == 0
                            || sum % 8 != 0
                            || sum > 64
                            || widths.len() > crate::bitfield::MAX_SUBFIELDS
                            || field.bit_names.len() != widths.len()
                        {
                            return Err(SchemaError::new(SchemaErrorKind::InvalidBitfield));
                        }
                    }
                    FieldKind::Block { block } => {
                        if !self.blocks.contains_key(block) {
                            return Err(SchemaError::new(SchemaErrorKind::UnknownBlock));
                        }
                    }
                    FieldKind::Variant { on, table } => {
                        let Some(entries) = self.codes.get(table) else {
                            return Err(SchemaError::new(SchemaErrorKind::UnknownTable));
                        };
                        for target in entries.values() {
                            if !self.blocks.contains_key(target) {
                                return Err(SchemaError::new(SchemaErrorKind::UnknownBlock));
                            }
                        }
                        if !visible.contains(&on) {
                            return Err(SchemaError::new(SchemaErrorKind::ForwardReference));
                        }
                    }
                    FieldKind::SizedBytes { from } => {
                        if !visible.contains(&from) {
                            return Err(SchemaError::new(SchemaErrorKind::ForwardReference));
                        }
                    }
                    FieldKind::Tail => {}
                }
                if field.repeated && !matches!(field.kind, FieldKind::Block { .. }) {
                    return Err(SchemaError::new(SchemaErrorKind::InvalidRepeat));
                }
                self.extend_visible(&mut visible, field, EXPAND_DEPTH);
            }
        }
        Ok(())
    }

    /// Add the names a field makes resolvable, descending into nested
    /// blocks (their fields are in scope for later siblings).
    fn extend_visible(&self, visible: &mut Vec<&'static str>, field: &Field, depth: usize) {
        if !field.bit_names.is_empty() {
            visible.extend_from_slice(&field.bit_names);
            return;
        }
        visible.push(field.name);
        if depth == 0 {
            return;
        }
        match field.kind {
            FieldKind::Block { block } if !field.repeated => {
                if let Some(def) = self.blocks.get(block) {
                    for inner in &def.fields {
                        self.extend_visible(visible, inner, depth - 1);
                    }
                }
            }
            FieldKind::Variant { table, .. } => {
                if let Some(entries) = self.codes.get(table) {
                    for target in entries.values() {
                        if let Some(def) = self.blocks.get(target) {
                            for inner in &def.fields {
                                self.extend_visible(visible, inner, depth - 1);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub(crate) fn block(&self, name: &str) -> Option<&BlockDef> {
        self.blocks.get(name)
    }

    /// Map a code through a table, rejecting codes with no entry.
    pub fn lookup_code(&self, table: &str, code: u64) -> Result<&'static str, DecodeError> {
        self.code_name(table, code).ok_or_else(DecodeError::unknown_code)
    }

    pub(crate) fn code_name(&self, table: &str, code: u64) -> Option<&'static str> {
        self.codes.get(table)?.get(&code).copied()
    }

    /// Numeric identifier of a named object type.
    pub fn lookup_object_type(&self, name: &str) -> Result<u16, SchemaError> {
        self.object_types
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::new(SchemaErrorKind::UnknownObjectType))
    }

    /// Numeric identifier of a named property within an object type.
    pub fn lookup_property(&self, object_type: &str, property: &str) -> Result<u16, SchemaError> {
        if !self.object_types.contains_key(object_type) {
            return Err(SchemaError::new(SchemaErrorKind::UnknownObjectType));
        }
        self.properties
            .get(object_type)
            .and_then(|m| m.get(property))
            .copied()
            .ok_or_else(|| SchemaError::new(SchemaErrorKind::UnknownProperty))
    }
}

fn compile_block(defs: &[FieldDef]) -> Result<BlockDef, SchemaError> {
    let mut fields: Vec<Field> = Vec::with_capacity(defs.len());
    for def in defs {
        let bit_names: Vec<&'static str> = match def.kind {
            FieldKind::Bits { .. } => def.name.split(',').collect(),
            _ => Vec::new(),
        };
        fields.push(Field {
            name: def.name,
            kind: def.kind,
            optional: def.optional,
            repeated: def.repeated,
            default: def.default,
            length_of: None,
            bit_names,
        });
    }
    // Link same-block length governors: an integer field named as a sized
    // field's source has its value computed by the encoder.
    for i in 0..fields.len() {
        if let FieldKind::SizedBytes { from } = fields[i].kind {
            let governed = fields[i].name;
            for field in &mut fields[..i] {
                if field.name == from && matches!(field.kind, FieldKind::Uint { .. }) {
                    field.length_of = Some(governed);
                }
            }
        }
    }
    Ok(BlockDef { fields })
}
