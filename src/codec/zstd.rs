use crate::codec::{
    io_failure, Codec, CodecError, Operation, Result, StreamingCompressor, StreamingDecompressor,
};
use std::io;
use std::io::Write;
use zstd::zstd_safe;
use zstd::zstd_safe::{DCtx, InBuffer, OutBuffer};

/// Zstandard codec. The only codec here with a streaming mode.
pub struct ZstdCodec {
    level: i32,
    compressor: zstd::bulk::Compressor<'static>,
    decompressor: zstd::bulk::Decompressor<'static>,
}

impl ZstdCodec {
    pub fn new(level: i32) -> Result<ZstdCodec> {
        let compressor = zstd::bulk::Compressor::new(level)
            .map_err(|e| io_failure("zstd", Operation::Init, e))?;
        let decompressor = zstd::bulk::Decompressor::new()
            .map_err(|e| io_failure("zstd", Operation::Init, e))?;
        Ok(ZstdCodec { level, compressor, decompressor })
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn max_compressed_len(&self, input_len: usize) -> usize {
        zstd_safe::compress_bound(input_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.compressor
            .compress_to_buffer(src, dest)
            .map_err(|e| io_failure("zstd", Operation::Compress, e))
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        self.decompressor
            .decompress_to_buffer(src, dest)
            .map_err(|e| io_failure("zstd", Operation::Decompress, e))
    }

    fn make_streaming_compressor(&self) -> Result<Box<dyn StreamingCompressor>> {
        let encoder = zstd::stream::write::Encoder::new(Vec::new(), self.level)
            .map_err(|e| io_failure("zstd", Operation::Compress, e))?;
        Ok(Box::new(ZstdStreamCompressor(encoder)))
    }

    fn make_streaming_decompressor(&self) -> Result<Box<dyn StreamingDecompressor>> {
        let context = DCtx::try_create().ok_or_else(|| {
            io_failure("zstd", Operation::Decompress, io::Error::other("out of memory"))
        })?;
        Ok(Box::new(ZstdStreamDecompressor { context, in_frame: false }))
    }
}

pub struct ZstdStreamCompressor(zstd::stream::write::Encoder<'static, Vec<u8>>);

impl StreamingCompressor for ZstdStreamCompressor {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        self.0
            .write_all(input)
            .map_err(|e| io_failure("zstd", Operation::Compress, e))?;
        output.append(self.0.get_mut());
        Ok(())
    }

    fn finish(self: Box<Self>, output: &mut Vec<u8>) -> Result<()> {
        let mut tail = self
            .0
            .finish()
            .map_err(|e| io_failure("zstd", Operation::Compress, e))?;
        output.append(&mut tail);
        Ok(())
    }
}

/// Drives the zstd stream decoder directly so that a frame cut off at the
/// end of the input is reported instead of silently accepted.
pub struct ZstdStreamDecompressor {
    context: DCtx<'static>,
    in_frame: bool,
}

impl StreamingDecompressor for ZstdStreamDecompressor {
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        if input.is_empty() {
            return Ok(());
        }
        let mut src = InBuffer::around(input);
        loop {
            output.reserve(DCtx::out_size());
            let pos = output.len();
            let mut dst = OutBuffer::around_pos(output, pos);
            let hint = self.context.decompress_stream(&mut dst, &mut src).map_err(|code| {
                let e = io::Error::other(zstd_safe::get_error_name(code));
                io_failure("zstd", Operation::Decompress, e)
            })?;
            let output_full = dst.pos() == dst.capacity();
            // A zero hint means the current frame is fully decoded and flushed.
            self.in_frame = hint != 0;
            if src.pos() == input.len() && !output_full {
                return Ok(());
            }
        }
    }

    fn finish(self: Box<Self>, _output: &mut Vec<u8>) -> Result<()> {
        if self.in_frame {
            tracing::debug!("zstd stream ended inside a frame");
            return Err(CodecError::OperationFailed(Operation::Decompress));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_round_trip() {
        let input = b"zstd block codec, zstd block codec, zstd block codec".repeat(8);
        let mut codec = ZstdCodec::new(3).unwrap();
        let mut compressed = vec![0; codec.max_compressed_len(input.len())];
        let n = codec.compress(&input, &mut compressed).unwrap();

        let mut output = vec![0; input.len()];
        let m = codec.decompress(&compressed[..n], &mut output).unwrap();
        assert_eq!(&output[..m], &input[..]);
    }

    #[test]
    fn short_output_buffer_is_an_error() {
        let input = vec![7u8; 4096];
        let mut codec = ZstdCodec::new(1).unwrap();
        let mut compressed = vec![0; codec.max_compressed_len(input.len())];
        let n = codec.compress(&input, &mut compressed).unwrap();

        let mut output = vec![0; 100];
        assert!(codec.decompress(&compressed[..n], &mut output).is_err());
    }

    #[test]
    fn streaming_round_trip_in_chunks() {
        let codec = ZstdCodec::new(3).unwrap();
        let input: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

        let mut compressor = codec.make_streaming_compressor().unwrap();
        let mut compressed = Vec::new();
        for chunk in input.chunks(4096) {
            compressor.compress(chunk, &mut compressed).unwrap();
        }
        compressor.finish(&mut compressed).unwrap();

        let mut decompressor = codec.make_streaming_decompressor().unwrap();
        let mut output = Vec::new();
        for chunk in compressed.chunks(1000) {
            decompressor.decompress(chunk, &mut output).unwrap();
        }
        decompressor.finish(&mut output).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn truncated_stream_fails_on_finish() {
        let codec = ZstdCodec::new(3).unwrap();
        let input = b"a frame that never ends ".repeat(500);
        let mut compressor = codec.make_streaming_compressor().unwrap();
        let mut compressed = Vec::new();
        compressor.compress(&input, &mut compressed).unwrap();
        compressor.finish(&mut compressed).unwrap();
        compressed.truncate(compressed.len() - 4);

        let mut decompressor = codec.make_streaming_decompressor().unwrap();
        let mut output = Vec::new();
        decompressor.decompress(&compressed, &mut output).unwrap();
        assert_eq!(
            decompressor.finish(&mut output),
            Err(CodecError::OperationFailed(Operation::Decompress))
        );
    }

    #[test]
    fn empty_stream_finishes_cleanly() {
        let codec = ZstdCodec::new(1).unwrap();
        let decompressor = codec.make_streaming_decompressor().unwrap();
        let mut output = Vec::new();
        decompressor.finish(&mut output).unwrap();
        assert!(output.is_empty());
    }
}
