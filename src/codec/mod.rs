//! Schema interpreter: decoder, encoder and the dependency resolver they
//! share.

pub mod decoder;
pub mod encoder;
mod resolver;

/// Maximum serialized frame size for the stack-allocated encode path.
///
/// KNXnet/IP core frames are small; the largest common frame (SEARCH_RESPONSE
/// with a full service-family list) stays well under this.
pub const MAX_FRAME_SIZE: usize = 256;

/// Owned encode output buffer.
pub type FrameBuffer = heapless::Vec<u8, MAX_FRAME_SIZE>;
