//! Block compression codecs behind one [`Codec`](codec::Codec) contract,
//! including a backend for Intel QuickAssist accelerators.
//!
//! ```
//! use qatcodec::codec::registry::{make_codec, CodecKind, CodecOptions};
//!
//! let mut codec = make_codec(CodecKind::Qat, &CodecOptions::default()).unwrap();
//! let input = b"Hello, world!";
//! let mut compressed = vec![0; codec.max_compressed_len(input.len())];
//! let n = codec.compress(input, &mut compressed).unwrap();
//!
//! let mut output = vec![0; input.len()];
//! let m = codec.decompress(&compressed[..n], &mut output).unwrap();
//! assert_eq!(&output[..m], input);
//! ```

pub mod codec;
pub mod frame;
