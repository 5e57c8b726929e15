use crate::codec::{
    Codec, CodecError, Operation, Result, StreamingCompressor, StreamingDecompressor,
};

/// Snappy raw (unframed) codec.
pub struct SnappyCodec {
    encoder: snap::raw::Encoder,
    decoder: snap::raw::Decoder,
}

impl SnappyCodec {
    pub fn new() -> SnappyCodec {
        SnappyCodec {
            encoder: snap::raw::Encoder::new(),
            decoder: snap::raw::Decoder::new(),
        }
    }
}

impl Default for SnappyCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn snap_failure(op: Operation, e: snap::Error) -> CodecError {
    tracing::debug!("snappy {} failed: {}", op, e);
    match e {
        snap::Error::TooBig { .. } | snap::Error::BufferTooSmall { .. } => {
            CodecError::InvalidParams(op)
        }
        _ => CodecError::OperationFailed(op),
    }
}

impl Codec for SnappyCodec {
    fn name(&self) -> &'static str {
        "snappy"
    }

    fn max_compressed_len(&self, input_len: usize) -> usize {
        // 0 means the input is too large to ever be compressed.
        match snap::raw::max_compress_len(input_len) {
            0 => usize::MAX,
            n => n,
        }
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.encoder
            .compress(src, dest)
            .map_err(|e| snap_failure(Operation::Compress, e))
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.decoder
            .decompress(src, dest)
            .map_err(|e| snap_failure(Operation::Decompress, e))
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
    fn round_trip() {
        let input = b"snappy snappy snappy snappy snappy".repeat(10);
        let mut codec = SnappyCodec::new();
        let mut compressed = vec![0; codec.max_compressed_len(input.len())];
        let n = codec.compress(&input, &mut compressed).unwrap();

        let mut output = vec![0; input.len()];
        let m = codec.decompress(&compressed[..n], &mut output).unwrap();
        assert_eq!(m, input.len());
        assert_eq!(output, input);
    }

    #[test]
    fn short_output_buffer_is_an_error() {
        let input = vec![42u8; 1000];
        let mut codec = SnappyCodec::new();
        let mut compressed = vec![0; codec.max_compressed_len(input.len())];
        let n = codec.compress(&input, &mut compressed).unwrap();

        let mut output = vec![0; 10];
        assert_eq!(
            codec.decompress(&compressed[..n], &mut output),
            Err(CodecError::InvalidParams(Operation::Decompress))
        );
    }
}
