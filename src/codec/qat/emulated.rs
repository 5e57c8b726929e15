//! A software model of a QAT endpoint.
//!
//! Sessions on an [`EmulatedDevice`] follow the QATzip call protocol and
//! status vocabulary and emit the same stream layouts, with deflate done by
//! `flate2`. The device counts attached sessions so that resource leaks are
//! observable.

use crate::codec::qat::backend::Backend;
use crate::codec::qat::params::{DataFormat, PollingMode, SessionParams, DEFAULT_HW_BUFFER_SIZE};
use crate::codec::qat::status::*;
use flate2::read::{DeflateDecoder, MultiGzDecoder};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use std::ffi::c_int;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Compressed size of an empty input in the gzip-ext layout.
pub const COMPRESSED_SIZE_OF_EMPTY_INPUT: usize = 34;
const SKID_PAD_SIZE: u128 = 48;
const GZIP_EXT_HEADER_SIZE: u128 = 24;
const GZIP_FOOTER_SIZE: u128 = 8;
const HW_BUFFER_SIZE_MIN: u32 = 1024;
const HW_BUFFER_SIZE_MAX: u32 = 2 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const GZIP_CM_DEFLATE: u8 = 8;
const GZIP_FLAG_EXTRA: u8 = 0x04;
const GZIP_OS_UNKNOWN: u8 = 0xff;
const QZ_EXTRA_ID: [u8; 2] = *b"QZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    pub hardware_present: bool,
    pub memory_available: bool,
    pub supports_busy_polling: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            hardware_present: true,
            memory_available: true,
            supports_busy_polling: true,
        }
    }
}

#[derive(Debug)]
struct DeviceState {
    config: DeviceConfig,
    initialized: AtomicBool,
    open_sessions: AtomicUsize,
}

#[derive(Debug, Clone)]
pub struct EmulatedDevice {
    state: Arc<DeviceState>,
}

impl EmulatedDevice {
    pub fn new(config: DeviceConfig) -> EmulatedDevice {
        EmulatedDevice {
            state: Arc::new(DeviceState {
                config,
                initialized: AtomicBool::new(false),
                open_sessions: AtomicUsize::new(0),
            }),
        }
    }

    /// The process-wide device used when no accelerator library is linked.
    pub fn shared() -> &'static EmulatedDevice {
        static DEVICE: OnceLock<EmulatedDevice> = OnceLock::new();
        DEVICE.get_or_init(|| EmulatedDevice::new(DeviceConfig::default()))
    }

    pub fn config(&self) -> DeviceConfig {
        self.state.config
    }

    /// A fresh, uninitialized session handle on this device.
    pub fn backend(&self) -> EmulatedBackend {
        EmulatedBackend {
            device: self.state.clone(),
            attached: false,
            sw_backup: false,
            params: None,
        }
    }

    /// Number of sessions currently holding device resources.
    pub fn open_sessions(&self) -> usize {
        self.state.open_sessions.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct EmulatedBackend {
    device: Arc<DeviceState>,
    attached: bool,
    sw_backup: bool,
    params: Option<SessionParams>,
}

impl EmulatedBackend {
    fn usable(len: u32, buf_len: usize) -> Option<usize> {
        let len = len as usize;
        (len <= buf_len).then_some(len)
    }

    /// Gzip formats get one member per `hw_buffer_size` chunk of input, the
    /// way the hardware emits them. Raw deflate is a single stream.
    fn encode(params: &SessionParams, input: &[u8]) -> std::io::Result<Vec<u8>> {
        if params.data_format == DataFormat::DeflateRaw {
            return Self::deflate(params, input);
        }
        let mut out = Vec::with_capacity(input.len() / 2 + 64);
        if input.is_empty() {
            Self::encode_member(params, input, &mut out)?;
        }
        for chunk in input.chunks(params.hw_buffer_size as usize) {
            Self::encode_member(params, chunk, &mut out)?;
        }
        Ok(out)
    }

    fn deflate(params: &SessionParams, input: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder =
            DeflateEncoder::new(Vec::new(), Compression::new(params.compression_level));
        encoder.write_all(input)?;
        encoder.finish()
    }

    fn encode_member(
        params: &SessionParams,
        chunk: &[u8],
        out: &mut Vec<u8>,
    ) -> std::io::Result<()> {
        let body = Self::deflate(params, chunk)?;
        let ext = params.data_format == DataFormat::GzipExt;
        out.extend_from_slice(&GZIP_MAGIC);
        out.push(GZIP_CM_DEFLATE);
        out.push(if ext { GZIP_FLAG_EXTRA } else { 0 });
        out.extend_from_slice(&[0, 0, 0, 0, 0, GZIP_OS_UNKNOWN]);
        if ext {
            out.extend_from_slice(&12u16.to_le_bytes());
            out.extend_from_slice(&QZ_EXTRA_ID);
            out.extend_from_slice(&8u16.to_le_bytes());
            out.extend_from_slice(&params.hw_buffer_size.to_le_bytes());
            out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        }
        out.extend_from_slice(&body);

        let mut crc = Crc::new();
        crc.update(chunk);
        out.extend_from_slice(&crc.sum().to_le_bytes());
        out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        Ok(())
    }
}

impl Backend for EmulatedBackend {
    fn init(&mut self, sw_backup: bool) -> c_int {
        if self.attached {
            return QZ_DUPLICATE;
        }
        if !self.device.config.hardware_present && !sw_backup {
            return QZ_NOSW_NO_HW;
        }
        self.attached = true;
        self.sw_backup = sw_backup;
        self.device.open_sessions.fetch_add(1, Ordering::SeqCst);
        if self.device.initialized.swap(true, Ordering::SeqCst) {
            QZ_DUPLICATE
        } else {
            QZ_OK
        }
    }

    fn setup_session(&mut self, params: &SessionParams) -> c_int {
        let config = self.device.config;
        if !self.attached {
            return QZ_FAIL;
        }
        if !(1..=9).contains(&params.compression_level)
            || !(HW_BUFFER_SIZE_MIN..=HW_BUFFER_SIZE_MAX).contains(&params.hw_buffer_size)
        {
            return QZ_PARAMS;
        }
        if params.polling_mode == PollingMode::Busy && !config.supports_busy_polling {
            return QZ_PARAMS;
        }
        if !config.memory_available && !self.sw_backup {
            return QZ_NOSW_LOW_MEM;
        }
        self.params = Some(*params);
        QZ_OK
    }

    fn compress(
        &mut self,
        src: &[u8],
        src_len: &mut u32,
        dest: &mut [u8],
        dest_len: &mut u32,
        _last: bool,
    ) -> c_int {
        let Some(params) = self.params.as_ref() else {
            return QZ_FAIL;
        };
        let (Some(input_len), Some(capacity)) =
            (Self::usable(*src_len, src.len()), Self::usable(*dest_len, dest.len()))
        else {
            return QZ_PARAMS;
        };
        let out = match Self::encode(params, &src[..input_len]) {
            Ok(out) => out,
            Err(_) => return QZ_FAIL,
        };
        if out.len() > capacity {
            return QZ_FAIL;
        }
        dest[..out.len()].copy_from_slice(&out);
        *dest_len = out.len() as u32;
        QZ_OK
    }

    fn decompress(
        &mut self,
        src: &[u8],
        src_len: &mut u32,
        dest: &mut [u8],
        dest_len: &mut u32,
    ) -> c_int {
        let Some(params) = self.params.as_ref() else {
            return QZ_FAIL;
        };
        let (Some(input_len), Some(capacity)) =
            (Self::usable(*src_len, src.len()), Self::usable(*dest_len, dest.len()))
        else {
            return QZ_PARAMS;
        };
        let input = &src[..input_len];
        let mut reader: Box<dyn Read + '_> = match params.data_format {
            DataFormat::DeflateRaw => Box::new(DeflateDecoder::new(input)),
            DataFormat::Gzip | DataFormat::GzipExt => Box::new(MultiGzDecoder::new(input)),
        };

        let out = &mut dest[..capacity];
        let mut written = 0;
        while written < out.len() {
            match reader.read(&mut out[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(_) => return QZ_DATA_ERROR,
            }
        }
        if written == out.len() {
            // Anything left over means the caller's buffer was too small.
            let mut extra = [0u8; 1];
            match reader.read(&mut extra) {
                Ok(0) => {}
                Ok(_) => return QZ_FAIL,
                Err(_) => return QZ_DATA_ERROR,
            }
        }
        *dest_len = written as u32;
        QZ_OK
    }

    fn max_compressed_length(&self, src_len: usize) -> usize {
        if src_len == 0 {
            return COMPRESSED_SIZE_OF_EMPTY_INPUT;
        }
        let chunk = self
            .params
            .map_or(DEFAULT_HW_BUFFER_SIZE, |p| p.hw_buffer_size)
            .max(HW_BUFFER_SIZE_MIN) as u128;
        let n = src_len as u128;
        let chunks = n.div_ceil(chunk);
        let bound = (9 * n).div_ceil(8)
            + SKID_PAD_SIZE
            + chunks * (GZIP_EXT_HEADER_SIZE + GZIP_FOOTER_SIZE);
        usize::try_from(bound).unwrap_or(usize::MAX)
    }

    fn teardown_session(&mut self) -> c_int {
        if self.params.take().is_none() {
            return QZ_FAIL;
        }
        QZ_OK
    }

    fn close(&mut self) -> c_int {
        if self.attached {
            self.attached = false;
            self.device.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
        QZ_OK
    }
}
