//! Error types for the codec, following the structured kind-enum pattern.
//!
//! Three error families cover the three phases of the codec's life: schema
//! construction (`SchemaError`), decoding (`DecodeError`) and encoding
//! (`EncodeError`). Each carries a public kind enum and, when the `std`
//! feature is enabled, a captured backtrace.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, CodecError>;

// =============================================================================
// Error Kind Enums
// =============================================================================

/// Decode error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeErrorKind {
    /// Not enough bytes in the buffer for a required field.
    BufferUnderrun,
    /// A length-prefix field disagrees with the actually-available region.
    LengthMismatch,
    /// A code (service identifier, message code, ...) is not in its table.
    UnknownCode,
    /// A repeated-field region is not an exact multiple of its element size.
    TruncatedRepeat,
    /// Bit widths do not sum to the bit length of the packed span.
    BitWidthMismatch,
    /// The requested start block does not exist in the schema.
    UnknownBlock,
}

/// Encode error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeErrorKind {
    /// A required field without a declared default is absent from the tree.
    MissingField,
    /// A value does not fit its declared field or bit width.
    ValueOutOfRange,
    /// Bit-packed value count or widths disagree with the declared layout.
    BitWidthMismatch,
    /// A dependent field's discriminant cannot be determined from the tree.
    AmbiguousVariant,
    /// The output buffer is too small for the serialized frame.
    BufferTooSmall,
    /// The requested block does not exist in the schema.
    UnknownBlock,
}

/// Schema construction/lookup error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchemaErrorKind {
    /// Two block definitions share a name.
    DuplicateBlock,
    /// A nested-block or code-table target names a block that does not exist.
    UnknownBlock,
    /// A variant field references a code table that does not exist.
    UnknownTable,
    /// A dependent field references a field declared after it.
    ForwardReference,
    /// Bit widths do not sum to whole bytes, or sub-name count mismatches.
    InvalidBitfield,
    /// A repeated field is not a nested block.
    InvalidRepeat,
    /// A scalar field size is outside the supported 1..=8 byte range.
    InvalidFieldSize,
    /// Object-type name not present in the object table.
    UnknownObjectType,
    /// Property name not present for the given object type.
    UnknownProperty,
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Decode error with optional backtrace.
///
/// Decode errors are local to one input buffer; the schema registry is never
/// left in a corrupt state and no malformed input is silently defaulted.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeError {
    kind: DecodeErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Get the error kind.
    pub const fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Check if this is a buffer underrun.
    pub fn is_buffer_underrun(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::BufferUnderrun)
    }

    /// Check if this is an unknown-code rejection.
    pub fn is_unknown_code(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::UnknownCode)
    }

    /// Check if this is a length mismatch.
    pub fn is_length_mismatch(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::LengthMismatch)
    }

    pub(crate) fn buffer_underrun() -> Self {
        Self::new(DecodeErrorKind::BufferUnderrun)
    }

    pub(crate) fn length_mismatch() -> Self {
        Self::new(DecodeErrorKind::LengthMismatch)
    }

    pub(crate) fn unknown_code() -> Self {
        Self::new(DecodeErrorKind::UnknownCode)
    }

    pub(crate) fn truncated_repeat() -> Self {
        Self::new(DecodeErrorKind::TruncatedRepeat)
    }

    pub(crate) fn bit_width_mismatch() -> Self {
        Self::new(DecodeErrorKind::BitWidthMismatch)
    }

    pub(crate) fn unknown_block() -> Self {
        Self::new(DecodeErrorKind::UnknownBlock)
    }
}

/// Encode error with optional backtrace.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodeError {
    kind: EncodeErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl EncodeError {
    pub(crate) fn new(kind: EncodeErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Get the error kind.
    pub const fn kind(&self) -> EncodeErrorKind {
        self.kind
    }

    /// Check if the encoder could not infer a variant discriminant.
    pub fn is_ambiguous_variant(&self) -> bool {
        matches!(self.kind, EncodeErrorKind::AmbiguousVariant)
    }

    /// Check if a required field was missing from the value tree.
    pub fn is_missing_field(&self) -> bool {
        matches!(self.kind, EncodeErrorKind::MissingField)
    }

    pub(crate) fn missing_field() -> Self {
        Self::new(EncodeErrorKind::MissingField)
    }

    pub(crate) fn value_out_of_range() -> Self {
        Self::new(EncodeErrorKind::ValueOutOfRange)
    }

    pub(crate) fn bit_width_mismatch() -> Self {
        Self::new(EncodeErrorKind::BitWidthMismatch)
    }

    pub(crate) fn ambiguous_variant() -> Self {
        Self::new(EncodeErrorKind::AmbiguousVariant)
    }

    pub(crate) fn buffer_too_small() -> Self {
        Self::new(EncodeErrorKind::BufferTooSmall)
    }

    pub(crate) fn unknown_block() -> Self {
        Self::new(EncodeErrorKind::UnknownBlock)
    }
}

/// Schema error with optional backtrace.
///
/// Raised while compiling grammar tables into a registry, or by the named
/// lookups (`lookup_object_type`, `lookup_property`).
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchemaError {
    kind: SchemaErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl SchemaError {
    pub(crate) fn new(kind: SchemaErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Get the error kind.
    pub const fn kind(&self) -> SchemaErrorKind {
        self.kind
    }

    /// Check if a dependent field referenced a later field.
    pub fn is_forward_reference(&self) -> bool {
        matches!(self.kind, SchemaErrorKind::ForwardReference)
    }
}

// =============================================================================
// Top-Level Error Type
// =============================================================================

/// Codec error wrapper for callers that mix schema construction with
/// decode/encode calls behind a single `?`.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Decoding failure (malformed or truncated input buffer).
    Decode(DecodeError),
    /// Encoding failure (incomplete or out-of-range value tree).
    Encode(EncodeError),
    /// Schema construction or lookup failure.
    Schema(SchemaError),
}

impl From<DecodeError> for CodecError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<EncodeError> for CodecError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<SchemaError> for CodecError {
    fn from(e: SchemaError) -> Self {
        Self::Schema(e)
    }
}

// =============================================================================
// Display Implementations
// =============================================================================

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode error: {:?}", self.kind)
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encode error: {:?}", self.kind)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema error: {:?}", self.kind)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Decode(e) => e.fmt(f),
            CodecError::Encode(e) => e.fmt(f),
            CodecError::Schema(e) => e.fmt(f),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

#[cfg(feature = "std")]
impl std::error::Error for SchemaError {}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}
