use crate::codec::{
    io_failure, Codec, CodecError, Operation, Result, StreamingCompressor, StreamingDecompressor,
};
use lz4::block::CompressionMode;

/// LZ4 block codec. Negative levels select the fast mode, positive ones the
/// high-compression mode.
pub struct Lz4Codec(CompressionMode);

impl Lz4Codec {
    pub fn new(compression: i32) -> Lz4Codec {
        match compression {
            ..0 => Lz4Codec(CompressionMode::FAST(compression.saturating_neg())),
            0 => Lz4Codec(CompressionMode::DEFAULT),
            _ => Lz4Codec(CompressionMode::HIGHCOMPRESSION(compression)),
        }
    }
}

impl Codec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn max_compressed_len(&self, input_len: usize) -> usize {
        // lz4 refuses inputs above its block limit; no buffer can hold those.
        lz4::block::compress_bound(input_len).unwrap_or(usize::MAX)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        lz4::block::compress_to_buffer(src, Some(self.0), false, dest)
            .map_err(|e| io_failure(self.name(), Operation::Compress, e))
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        let capacity = i32::try_from(dest.len())
            .map_err(|_| CodecError::InvalidParams(Operation::Decompress))?;
        lz4::block::decompress_to_buffer(src, Some(capacity), dest)
            .map_err(|e| io_failure(self.name(), Operation::Decompress, e))
    }

    fn make_streaming_compressor(&self) -> Result<Box<dyn StreamingCompressor>> {
        Err(CodecError::UnsupportedOperation(Operation::Compress))
    }

    fn make_streaming_decompressor(&self) -> Result<Box<dyn StreamingDecompressor>> {
        Err(CodecError::UnsupportedOperation(Operation::Decompress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_in_every_mode() {
        let input = b"lz4 lz4 lz4 lz4 lz4 lz4 lz4 lz4 block codec".repeat(20);
        for level in [-3, 0, 9] {
            let mut codec = Lz4Codec::new(level);
            let mut compressed = vec![0; codec.max_compressed_len(input.len())];
            let n = codec.compress(&input, &mut compressed).unwrap();
            assert!(n < input.len());

            let mut output = vec![0; input.len()];
            let m = codec.decompress(&compressed[..n], &mut output).unwrap();
            assert_eq!(&output[..m], &input[..]);
        }
    }

    #[test]
    fn extreme_levels_still_round_trip() {
        let input = b"acceleration is clamped by lz4 itself ".repeat(10);
        for level in [i32::MIN, i32::MAX] {
            let mut codec = Lz4Codec::new(level);
            let mut compressed = vec![0; codec.max_compressed_len(input.len())];
            let n = codec.compress(&input, &mut compressed).unwrap();
            let mut output = vec![0; input.len()];
            assert_eq!(codec.decompress(&compressed[..n], &mut output), Ok(input.len()));
            assert_eq!(output, input);
        }
    }

    #[test]
    fn streaming_is_refused() {
        let codec = Lz4Codec::new(0);
        assert!(matches!(
            codec.make_streaming_compressor(),
            Err(CodecError::UnsupportedOperation(Operation::Compress))
        ));
        assert!(matches!(
            codec.make_streaming_decompressor(),
            Err(CodecError::UnsupportedOperation(Operation::Decompress))
        ));
    }
}
