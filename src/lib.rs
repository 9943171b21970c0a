#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![doc = include_str!("../README.md")]

extern crate alloc;

#[macro_use]
mod logging;

pub mod bitfield;
pub mod codec;
pub mod error;
pub mod messages;
pub mod schema;
pub mod value;

pub use codec::decoder::{decode, decode_block};
pub use codec::encoder::{encode, encode_block, encode_frame};
pub use codec::{FrameBuffer, MAX_FRAME_SIZE};
pub use error::{
    CodecError, DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind, Result, SchemaError,
    SchemaErrorKind,
};
pub use schema::knxnet::knxnet_schema;
pub use schema::{FieldDef, FieldKind, LengthScope, Schema};
pub use value::{Frame, Value};
