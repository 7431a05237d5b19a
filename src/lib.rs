#![cfg_attr(not(test), no_std)]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! A small DEFLATE decompressor, and a truecolor PNG decoder built on it.
//!
//! * The [`inflate`] module decodes raw DEFLATE streams (RFC 1951) from a
//!   single slice into a single buffer. It can also just count the output
//!   bytes, so you can size your buffer exactly before decoding for real.
//! * The [`png`] module decodes 8-bit RGB and RGBA PNG files, without
//!   interlacing, into a [`PngImage`](image::PngImage).
//!
//! Neither needs any other compression library.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod bit_reader;
mod block;
mod code_lengths;
mod huffman;

pub mod error;
pub use error::*;

pub mod sink;
pub use sink::*;

pub mod inflate;
pub use inflate::*;

pub mod pixel_formats;
pub use pixel_formats::*;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod image;

#[cfg(feature = "png")]
#[cfg_attr(docs_rs, doc(cfg(feature = "png")))]
pub mod png;
