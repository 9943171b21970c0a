//! Generic schema-driven decoder.
//!
//! The decoder walks a block definition against a byte buffer, left to
//! right, and builds a [`Frame`] value tree. All structure comes from the
//! schema: length prefixes narrow the readable region, variant fields
//! dispatch through code tables, sized fields consult their governor, and
//! repeated fields consume their region in whole elements.
//!
//! Region discipline: a read past the end of the innermost declared region
//! is a `LengthMismatch` when more bytes physically exist behind it, and a
//! `BufferUnderrun` when the region boundary is the end of the input
//! itself. Unknown codes are rejected, never defaulted.

use alloc::vec::Vec;

use crate::codec::resolver::{self, Scope};
use crate::error::DecodeError;
use crate::schema::knxnet::TOP_LEVEL_BLOCK;
use crate::schema::{FieldKind, LengthScope, Schema};
use crate::value::{Frame, Value};

/// Decode one whole datagram starting at the frame block.
///
/// Returns the value tree and the number of bytes consumed. Trailing bytes
/// beyond a declared total length are left untouched.
pub fn decode<'a>(schema: &Schema, buf: &'a [u8]) -> Result<(Frame<'a>, usize), DecodeError> {
    decode_block(schema, TOP_LEVEL_BLOCK, buf)
}

/// Decode an arbitrary schema block from the start of `buf`.
pub fn decode_block<'a>(
    schema: &Schema,
    name: &str,
    buf: &'a [u8],
) -> Result<(Frame<'a>, usize), DecodeError> {
    knx_log!(trace, "decoding block {}", name);
    let mut dec = Decoder {
        schema,
        buf,
        pos: 0,
        total_end: buf.len(),
        total_declared: false,
    };
    let frame = dec.block(name, buf.len(), None)?;
    if dec.total_declared && dec.pos != dec.total_end {
        return Err(DecodeError::length_mismatch());
    }
    Ok((frame, dec.pos))
}

struct Decoder<'s, 'a> {
    schema: &'s Schema,
    buf: &'a [u8],
    pos: usize,
    /// End of the frame: buffer end until a total-length field narrows it.
    total_end: usize,
    total_declared: bool,
}

impl<'s, 'a> Decoder<'s, 'a> {
    fn block(
        &mut self,
        name: &str,
        mut limit: usize,
        scope: Option<&Scope<'_, 'a>>,
    ) -> Result<Frame<'a>, DecodeError> {
        let def = self
            .schema
            .block(name)
            .ok_or_else(DecodeError::unknown_block)?;

        let mut fields: Vec<(&'static str, Value<'a>)> = Vec::with_capacity(def.fields.len());
        let mut declared_end: Option<usize> = None;

        for field in &def.fields {
            let end = limit.min(self.total_end);
            if field.optional && self.pos >= end {
                continue;
            }
            if field.repeated {
                let FieldKind::Block { block } = field.kind else {
                    // Schema validation rejects non-block repeats.
                    return Err(DecodeError::unknown_block());
                };
                let mut elements = Vec::new();
                while self.pos < limit.min(self.total_end) {
                    let chain = Scope {
                        fields: &fields,
                        parent: scope,
                    };
                    let end = limit.min(self.total_end);
                    match self.block(block, end, Some(&chain)) {
                        Ok(element) => elements.push(element),
                        Err(e) if e.is_buffer_underrun() || e.is_length_mismatch() => {
                            return Err(DecodeError::truncated_repeat());
                        }
                        Err(e) => return Err(e),
                    }
                }
                fields.push((field.name, Value::List(elements)));
                continue;
            }
            match field.kind {
                FieldKind::Uint { size } => {
                    let v = self.read_uint(size, end)?;
                    fields.push((field.name, Value::Uint(v)));
                }
                FieldKind::Bytes { size } => {
                    let b = self.read_bytes(size, end)?;
                    fields.push((field.name, Value::bytes(b)));
                }
                FieldKind::Length { size, scope: len_scope } => {
                    let start = self.pos;
                    let v = self.read_uint(size, end)?;
                    let declared = start + v as usize;
                    match len_scope {
                        LengthScope::Block => {
                            if declared > self.buf.len() {
                                return Err(DecodeError::buffer_underrun());
                            }
                            if declared > end || declared < self.pos {
                                return Err(DecodeError::length_mismatch());
                            }
                            limit = declared;
                            declared_end = Some(declared);
                        }
                        LengthScope::Total => {
                            // Total lengths count from the frame's first
                            // byte, which is where this walk began.
                            let frame_end = v as usize;
                            if frame_end > self.buf.len() {
                                return Err(DecodeError::buffer_underrun());
                            }
                            if frame_end < self.pos {
                                return Err(DecodeError::length_mismatch());
                            }
                            self.total_end = frame_end;
                            self.total_declared = true;
                        }
                    }
                    fields.push((field.name, Value::Uint(v)));
                }
                FieldKind::Bits { widths } => {
                    let nbytes = widths.iter().map(|&w| usize::from(w)).sum::<usize>() / 8;
                    let span = self.read_bytes(nbytes, end)?;
                    let values = crate::bitfield::unpack(span, widths)?;
                    for (&sub, &v) in field.bit_names.iter().zip(values.iter()) {
                        fields.push((sub, Value::Uint(v)));
                    }
                }
                FieldKind::Block { block } => {
                    let chain = Scope {
                        fields: &fields,
                        parent: scope,
                    };
                    let inner = self.block(block, end, Some(&chain))?;
                    fields.push((field.name, Value::Block(inner)));
                }
                FieldKind::Variant { on, table } => {
                    let chain = Scope {
                        fields: &fields,
                        parent: scope,
                    };
                    let target = resolver::resolve_variant(self.schema, &chain, on, table)
                        .ok_or_else(DecodeError::unknown_code)?;
                    knx_log!(trace, "variant {} -> {}", field.name, target);
                    let inner = self.block(target, end, Some(&chain))?;
                    fields.push((field.name, Value::Block(inner)));
                }
                FieldKind::SizedBytes { from } => {
                    let chain = Scope {
                        fields: &fields,
                        parent: scope,
                    };
                    let size = resolver::resolve_size(&chain, from)
                        .ok_or_else(DecodeError::length_mismatch)?;
                    let b = self.read_bytes(size, end)?;
                    fields.push((field.name, Value::bytes(b)));
                }
                FieldKind::Tail => {
                    let b = self.read_bytes(end - self.pos, end)?;
                    fields.push((field.name, Value::bytes(b)));
                }
            }
        }

        // A block-scoped length must be consumed exactly.
        if let Some(end) = declared_end {
            if self.pos != end {
                return Err(DecodeError::length_mismatch());
            }
        }
        Ok(Frame::from_fields(fields))
    }

    fn read_bytes(&mut self, size: usize, end: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + size > end {
            return Err(if end >= self.buf.len() {
                DecodeError::buffer_underrun()
            } else {
                DecodeError::length_mismatch()
            });
        }
        let span = &self.buf[self.pos..self.pos + size];
        self.pos += size;
        Ok(span)
    }

    fn read_uint(&mut self, size: usize, end: usize) -> Result<u64, DecodeError> {
        let span = self.read_bytes(size, end)?;
        let mut v = 0u64;
        for &b in span {
            v = (v << 8) | u64::from(b);
        }
        Ok(v)
    }
}
