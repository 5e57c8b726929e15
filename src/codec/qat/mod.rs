//! Codec backed by an Intel QuickAssist accelerator through the QATzip
//! session API.
//!
//! Only one-shot compression is offered: both streaming factories return
//! [`CodecError::UnsupportedOperation`] without looking at the session.

use crate::codec::{
    Codec, CodecError, Operation, Result, StreamingCompressor, StreamingDecompressor,
};

pub mod backend;
pub mod emulated;
pub mod params;
#[cfg(feature = "qatzip")]
pub mod qatzip;
pub mod session;
pub mod status;

pub use backend::Backend;
pub use emulated::{DeviceConfig, EmulatedBackend, EmulatedDevice};
pub use params::{DataFormat, PollingMode, SessionParams};
pub use session::{Session, SessionState};

pub struct QatCodec<B: Backend> {
    session: Session<B>,
}

impl<B: Backend> QatCodec<B> {
    /// Opens a session on `backend`. Any setup failure other than a duplicate
    /// init is returned as is and leaves nothing allocated.
    pub fn new(backend: B, params: SessionParams) -> Result<Self> {
        let session = Session::open(backend, params)?;
        Ok(QatCodec { session })
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }
}

impl QatCodec<EmulatedBackend> {
    /// A codec on a software-emulated device.
    pub fn emulated(device: &EmulatedDevice, params: SessionParams) -> Result<Self> {
        Self::new(device.backend(), params)
    }
}

#[cfg(feature = "qatzip")]
impl QatCodec<qatzip::QatzipBackend> {
    /// A codec on the accelerator reached through libqatzip.
    pub fn hardware(params: SessionParams) -> Result<Self> {
        Self::new(qatzip::QatzipBackend::new(), params)
    }
}

/// The backend counts lengths in 32 bits; larger buffers are refused rather
/// than wrapped.
fn narrow(len: usize, op: Operation) -> Result<u32> {
    u32::try_from(len).map_err(|_| CodecError::InvalidParams(op))
}

impl<B: Backend> Codec for QatCodec<B> {
    fn name(&self) -> &'static str {
        "qat"
    }

    fn max_compressed_len(&self, input_len: usize) -> usize {
        self.session.backend().max_compressed_length(input_len)
    }

    fn compress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        let backend = self.session.ready(Operation::Compress)?;
        let mut uncompressed_size = narrow(src.len(), Operation::Compress)?;
        let mut compressed_size = narrow(dest.len(), Operation::Compress)?;
        let rc = backend.compress(src, &mut uncompressed_size, dest, &mut compressed_size, true);
        status::check(Operation::Compress, rc)?;
        Ok(compressed_size as usize)
    }

    fn decompress(&mut self, src: &[u8], dest: &mut [u8]) -> Result<usize> {
        let backend = self.session.ready(Operation::Decompress)?;
        let mut compressed_size = narrow(src.len(), Operation::Decompress)?;
        let mut uncompressed_size = narrow(dest.len(), Operation::Decompress)?;
        let rc = backend.decompress(src, &mut compressed_size, dest, &mut uncompressed_size);
        status::check(Operation::Decompress, rc)?;
        Ok(uncompressed_size as usize)
    }

    fn make_streaming_compressor(&self) -> Result<Box<dyn StreamingCompressor>> {
        Err(CodecError::UnsupportedOperation(Operation::Compress))
    }

    fn make_streaming_decompressor(&self) -> Result<Box<dyn StreamingDecompressor>> {
        Err(CodecError::UnsupportedOperation(Operation::Decompress))
    }
}
