//! Chunked framing on top of a block codec.
//!
//! Each chunk is compressed independently and written as
//! `u32 LE uncompressed_len`, `u32 LE compressed_len`, payload.

use crate::codec::Codec;
use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{BufRead, BufReader, Read, Write};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Measurement {
    pub input_len: u64,
    pub output_len: u64,
    pub elapsed: Duration,
}

impl Measurement {
    pub fn compression_ratio(&self) -> f64 {
        self.output_len as f64 / self.input_len as f64
    }

    pub fn input_throughput(&self) -> f64 {
        self.input_len as f64 / self.elapsed.as_secs_f64()
    }

    pub fn output_throughput(&self) -> f64 {
        self.output_len as f64 / self.elapsed.as_secs_f64()
    }

    pub fn format_compression(&self) -> String {
        format!(
            "{} => {} ({:.1} %)",
            self.input_len,
            self.output_len,
            self.compression_ratio() * 100.0
        )
    }
}

pub fn compress_frames<R: Read, W: Write>(
    input: R,
    mut output: W,
    chunk_size: usize,
    codec: &mut dyn Codec,
) -> anyhow::Result<Measurement> {
    if chunk_size == 0 || u32::try_from(chunk_size).is_err() {
        bail!("Chunk size must be between 1 and {} bytes", u32::MAX);
    }
    let Ok(bound) = u32::try_from(codec.max_compressed_len(chunk_size)) else {
        bail!(
            "Chunk size {} is too large for {}: a compressed chunk may not fit a frame",
            chunk_size,
            codec.name()
        );
    };
    let mut input = BufReader::with_capacity(chunk_size, input);
    let mut tmp_buf = vec![0; bound as usize];
    let mut input_len = 0u64;
    let mut output_len = 0u64;

    let start_time = Instant::now();
    while !input.fill_buf()?.is_empty() {
        let input_chunk = input.buffer();
        let uncompressed_len = input_chunk.len();
        let compressed_len = codec
            .compress(input_chunk, &mut tmp_buf)
            .with_context(|| format!("{} failed at input offset {}", codec.name(), input_len))?;
        output.write_u32::<LittleEndian>(u32::try_from(uncompressed_len)?)?;
        output.write_u32::<LittleEndian>(u32::try_from(compressed_len)?)?;
        output.write_all(&tmp_buf[0..compressed_len])?;
        input.consume(uncompressed_len);
        input_len += uncompressed_len as u64;
        output_len += 8 + compressed_len as u64;
    }
    output.flush()?;

    Ok(Measurement {
        input_len,
        output_len,
        elapsed: start_time.elapsed(),
    })
}

pub fn decompress_frames<R: Read, W: Write>(
    input: R,
    mut output: W,
    codec: &mut dyn Codec,
) -> anyhow::Result<Measurement> {
    let mut input = BufReader::with_capacity(256 * 1024, input);
    let mut src = Vec::new();
    let mut dest = Vec::new();
    let mut input_len = 0u64;
    let mut output_len = 0u64;

    let start_time = Instant::now();
    while !input.fill_buf()?.is_empty() {
        let uncompressed_len = input.read_u32::<LittleEndian>()? as usize;
        let frame_len = input.read_u32::<LittleEndian>()? as usize;
        // Read through `take` so a bogus length cannot allocate past the input.
        src.clear();
        (&mut input).take(frame_len as u64).read_to_end(&mut src)?;
        if src.len() != frame_len {
            bail!("Truncated frame at input offset {}", input_len);
        }
        dest.resize(uncompressed_len, 0);
        let count = codec
            .decompress(&src, &mut dest)
            .with_context(|| format!("{} failed at input offset {}", codec.name(), input_len))?;
        if count != uncompressed_len {
            bail!(
                "Frame at input offset {} decoded to {} bytes, expected {}",
                input_len,
                count,
                uncompressed_len
            );
        }
        output.write_all(&dest)?;
        input_len += 8 + frame_len as u64;
        output_len += uncompressed_len as u64;
    }
    output.flush()?;

    Ok(Measurement {
        input_len,
        output_len,
        elapsed: start_time.elapsed(),
    })
}
