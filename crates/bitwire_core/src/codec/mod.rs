//! # Primitive and Diff Codecs
//!
//! [`BitWriter`] and [`BitReader`] wrap a [`BitBuffer`](crate::BitBuffer)
//! and agree on one encoding per method pair:
//!
//! | Family        | Encoding                                              |
//! |---------------|-------------------------------------------------------|
//! | fixed         | little-endian, byte by byte, any bit offset           |
//! | packed        | zig-zag (signed) + 5-tier header, see [`crate::packed`]|
//! | bool          | one bit                                               |
//! | string        | packed UTF-16 length + units                          |
//! | array         | packed length (unless known) + elements               |
//! | diff          | length + changed bitmap + changed payloads            |
//!
//! Writer and reader must issue the same call sequence; nothing on the wire
//! identifies a value's type.

mod diff;
mod element;
mod reader;
mod writer;

pub use element::WireElement;
pub use reader::BitReader;
pub use writer::BitWriter;
