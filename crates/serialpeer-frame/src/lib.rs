//! COBS framing with a checksummed command header.
//!
//! Every message on the wire is:
//! - a 1-byte command id
//! - a 1-byte payload length
//! - a 1-byte additive checksum of the payload
//! - the payload itself (at most 255 bytes)
//!
//! COBS-stuffed so the body never contains `0x00`, then terminated by a
//! single `0x00` delimiter.

pub mod codec;
pub mod command;
pub mod error;
pub mod header;
pub mod hex;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode, encode_frame, find_delimiter, max_encoded_len, FrameConfig, DELIMITER,
    MAX_RAW_LEN, MAX_WIRE_LEN,
};
pub use command::{InputState, SetupCommand, INPUT_STATE_PAYLOAD_LEN, SETUP, SETUP_PAYLOAD_LEN};
pub use error::{FrameError, Result};
pub use header::{build, build_into, checksum, parse, Frame, HEADER_SIZE, MAX_PAYLOAD_LEN};
pub use hex::hex_dump;
pub use reader::{FrameReader, ReadStatus};
pub use writer::FrameWriter;
