//! Generic schema-driven encoder.
//!
//! The encoder walks a block definition against a [`Frame`] value tree and
//! serializes it. Length prefixes are never taken from the tree: block
//! lengths are back-patched once the block is closed, the total length once
//! the whole frame is written, and governor fields are recomputed from the
//! bytes they govern. Declared defaults fill absent scalar fields; a
//! required field with no default and no value is a `MissingField`.

use crate::codec::resolver::{self, Scope};
use crate::codec::{FrameBuffer, MAX_FRAME_SIZE};
use crate::error::EncodeError;
use crate::schema::knxnet::TOP_LEVEL_BLOCK;
use crate::schema::{FieldKind, LengthScope, Schema};
use crate::value::Frame;

/// Serialize a whole datagram into `buf`, returning the byte count.
pub fn encode(schema: &Schema, frame: &Frame<'_>, buf: &mut [u8]) -> Result<usize, EncodeError> {
    run(schema, TOP_LEVEL_BLOCK, frame, buf)
}

/// Serialize an arbitrary schema block into `buf`.
pub fn encode_block(
    schema: &Schema,
    name: &str,
    frame: &Frame<'_>,
    buf: &mut [u8],
) -> Result<usize, EncodeError> {
    run(schema, name, frame, buf)
}

/// Serialize a whole datagram into an owned stack buffer.
pub fn encode_frame(schema: &Schema, frame: &Frame<'_>) -> Result<FrameBuffer, EncodeError> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let len = encode(schema, frame, &mut buf)?;
    let mut out = FrameBuffer::new();
    out.extend_from_slice(&buf[..len])
        .map_err(|_e| EncodeError::buffer_too_small())?;
    Ok(out)
}

fn run(
    schema: &Schema,
    name: &str,
    frame: &Frame<'_>,
    buf: &mut [u8],
) -> Result<usize, EncodeError> {
    knx_log!(trace, "encoding block {}", name);
    let mut enc = Encoder {
        schema,
        total_patch: None,
    };
    let mut pos = 0;
    enc.block(name, frame, buf, &mut pos, None)?;
    if let Some((at, size)) = enc.total_patch {
        patch(buf, at, size, pos as u64)?;
    }
    Ok(pos)
}

struct Encoder<'s> {
    schema: &'s Schema,
    /// Placeholder position and size of the frame's total-length field.
    total_patch: Option<(usize, usize)>,
}

impl<'s> Encoder<'s> {
    fn block(
        &mut self,
        name: &str,
        frame: &Frame<'_>,
        buf: &mut [u8],
        pos: &mut usize,
        scope: Option<&Scope<'_, '_>>,
    ) -> Result<(), EncodeError> {
        let def = self
            .schema
            .block(name)
            .ok_or_else(EncodeError::unknown_block)?;

        let block_start = *pos;
        // At most one block-scoped length per block: placeholder position
        // and size, patched when the block closes.
        let mut block_patch: Option<(usize, usize)> = None;

        for field in &def.fields {
            if field.repeated {
                let FieldKind::Block { block } = field.kind else {
                    return Err(EncodeError::unknown_block());
                };
                // An absent repeated field is an empty sequence.
                let elements = frame.list(field.name).unwrap_or(&[]);
                for element in elements {
                    let chain = Scope {
                        fields: frame.fields(),
                        parent: scope,
                    };
                    self.block(block, element, buf, pos, Some(&chain))?;
                }
                continue;
            }
            match field.kind {
                FieldKind::Uint { size } => {
                    let v = if let Some(governed) = field.length_of {
                        // Governors are computed from the governed bytes,
                        // never trusted from the tree.
                        frame.bytes(governed).map_or(0, <[u8]>::len) as u64
                    } else if let Some(v) = frame.uint(field.name) {
                        v
                    } else if let Some(d) = field.default {
                        d
                    } else if field.optional {
                        continue;
                    } else {
                        return Err(EncodeError::missing_field());
                    };
                    write_uint(buf, pos, v, size)?;
                }
                FieldKind::Bytes { size } => {
                    let Some(b) = frame.bytes(field.name) else {
                        if field.optional {
                            continue;
                        }
                        return Err(EncodeError::missing_field());
                    };
                    if b.len() != size {
                        return Err(EncodeError::value_out_of_range());
                    }
                    write_bytes(buf, pos, b)?;
                }
                FieldKind::Length { size, scope: len_scope } => {
                    match len_scope {
                        LengthScope::Block => block_patch = Some((*pos, size)),
                        LengthScope::Total => self.total_patch = Some((*pos, size)),
                    }
                    write_uint(buf, pos, 0, size)?;
                }
                FieldKind::Bits { widths } => {
                    let mut values = heapless::Vec::<u64, { crate::bitfield::MAX_SUBFIELDS }>::new();
                    for sub in &field.bit_names {
                        values
                            .push(frame.uint(sub).unwrap_or(0))
                            .map_err(|_v| EncodeError::bit_width_mismatch())?;
                    }
                    let packed = crate::bitfield::pack(&values, widths)?;
                    write_bytes(buf, pos, &packed)?;
                }
                FieldKind::Block { block } => {
                    let Some(inner) = frame.frame(field.name) else {
                        if field.optional {
                            continue;
                        }
                        return Err(EncodeError::missing_field());
                    };
                    let chain = Scope {
                        fields: frame.fields(),
                        parent: scope,
                    };
                    self.block(block, inner, buf, pos, Some(&chain))?;
                }
                FieldKind::Variant { on, table } => {
                    let Some(inner) = frame.frame(field.name) else {
                        if field.optional {
                            continue;
                        }
                        return Err(EncodeError::missing_field());
                    };
                    let chain = Scope {
                        fields: frame.fields(),
                        parent: scope,
                    };
                    let target = resolver::resolve_variant(self.schema, &chain, on, table)
                        .ok_or_else(EncodeError::ambiguous_variant)?;
                    self.block(target, inner, buf, pos, Some(&chain))?;
                }
                FieldKind::SizedBytes { .. } | FieldKind::Tail => {
                    // Absent payloads encode as zero bytes; the governor
                    // (if any) then writes zero.
                    if let Some(b) = frame.bytes(field.name) {
                        write_bytes(buf, pos, b)?;
                    }
                }
            }
        }

        if let Some((at, size)) = block_patch {
            patch(buf, at, size, (*pos - block_start) as u64)?;
        }
        Ok(())
    }
}

fn write_bytes(buf: &mut [u8], pos: &mut usize, data: &[u8]) -> Result<(), EncodeError> {
    let end = *pos + data.len();
    if end > buf.len() {
        return Err(EncodeError::buffer_too_small());
    }
    buf[*pos..end].copy_from_slice(data);
    *pos = end;
    Ok(())
}

fn write_uint(buf: &mut [u8], pos: &mut usize, v: u64, size: usize) -> Result<(), EncodeError> {
    if size < 8 && v >> (size * 8) != 0 {
        return Err(EncodeError::value_out_of_range());
    }
    write_bytes(buf, pos, &v.to_be_bytes()[8 - size..])
}

fn patch(buf: &mut [u8], at: usize, size: usize, v: u64) -> Result<(), EncodeError> {
    if size < 8 && v >> (size * 8) != 0 {
        return Err(EncodeError::value_out_of_range());
    }
    buf[at..at + size].copy_from_slice(&v.to_be_bytes()[8 - size..]);
    Ok(())
}
