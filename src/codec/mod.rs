use std::io;

pub mod error;
pub mod lz4;
pub mod qat;
pub mod registry;
pub mod snappy;
pub mod zstd;

pub use error::{CodecError, Operation, Result};

/// A block codec: compresses and decompresses whole buffers.
///
/// `compress` and `decompress` take `&mut self`; a codec that owns a backend
/// session therefore never sees two calls in flight at once.
pub trait Codec: Send {
    fn name(&self) -> &'static str;

    /// Upper bound of the compressed size of any input of `input_len` bytes.
    /// Never underestimates and never decreases as `input_len` grows.
    fn max_compressed_len(&self, input_len: usize) -> usize;

    /// Compresses `src` into `dest`, returning the number of bytes written.
    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize>;

    /// Decompresses `src` into `dest`, returning the number of bytes written.
    /// `dest` must be at least as large as the decompressed data.
    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize>;

    fn make_streaming_compressor(&self) -> Result<Box<dyn StreamingCompressor>>;

    fn make_streaming_decompressor(&self) -> Result<Box<dyn StreamingDecompressor>>;
}

/// Incremental compression. Output is appended to the caller's vector.
pub trait StreamingCompressor: Send {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()>;
}

/// Incremental decompression. Output is appended to the caller's vector.
pub trait StreamingDecompressor: Send {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()>;
}

/// Maps an I/O error from a software codec into the codec taxonomy.
pub(crate) fn io_failure(codec: &str, op: Operation, e: io::Error) -> CodecError {
    tracing::debug!("{} {} failed: {}", codec, op, e);
    match e.kind() {
        io::ErrorKind::InvalidInput => CodecError::InvalidParams(op),
        _ => CodecError::OperationFailed(op),
    }
}
