//! Sessions on real QAT hardware through the system `libqatzip`.

#![allow(non_camel_case_types, non_snake_case)]

use crate::codec::qat::backend::Backend;
use crate::codec::qat::params::{DataFormat, PollingMode, SessionParams};
use crate::codec::qat::status::{QZ_OK, QZ_PARAMS};
use std::cell::UnsafeCell;
use std::ffi::{c_int, c_long, c_uchar, c_uint, c_ulong, c_void};

const QZ_DEFLATE_GZIP: c_uint = 1;
const QZ_DEFLATE_GZIP_EXT: c_uint = 2;
const QZ_DEFLATE_RAW: c_uint = 3;
const QZ_PERIODICAL_POLLING: c_uint = 0;
const QZ_BUSY_POLLING: c_uint = 1;

#[repr(C)]
struct QzSession_T {
    hw_session_stat: c_long,
    thd_sess_stat: c_int,
    internal: *mut c_void,
    total_in: c_ulong,
    total_out: c_ulong,
}

#[repr(C)]
struct QzSessionParams_T {
    huffman_hdr: c_uint,
    direction: c_uint,
    data_fmt: c_uint,
    comp_lvl: c_uint,
    comp_algorithm: c_uchar,
    max_forks: c_uint,
    sw_backup: c_uchar,
    hw_buff_sz: c_uint,
    strm_buff_sz: c_uint,
    input_sz_thrshold: c_uint,
    req_cnt_thrshold: c_uint,
    wait_cnt_thrshold: c_uint,
    polling_mode: c_uint,
}

#[link(name = "qatzip")]
extern "C" {
    fn qzInit(sess: *mut QzSession_T, sw_backup: c_uchar) -> c_int;
    fn qzGetDefaults(defaults: *mut QzSessionParams_T) -> c_int;
    fn qzSetupSession(sess: *mut QzSession_T, params: *mut QzSessionParams_T) -> c_int;
    fn qzCompress(
        sess: *mut QzSession_T,
        src: *const c_uchar,
        src_len: *mut c_uint,
        dest: *mut c_uchar,
        dest_len: *mut c_uint,
        last: c_uint,
    ) -> c_int;
    fn qzDecompress(
        sess: *mut QzSession_T,
        src: *const c_uchar,
        src_len: *mut c_uint,
        dest: *mut c_uchar,
        dest_len: *mut c_uint,
    ) -> c_int;
    fn qzMaxCompressedLength(src_sz: c_uint, sess: *mut QzSession_T) -> c_uint;
    fn qzTeardownSession(sess: *mut QzSession_T) -> c_int;
    fn qzClose(sess: *mut QzSession_T) -> c_int;
}

/// A zero-initialized `QzSession_T`, boxed so its address stays fixed for
/// the library.
pub struct QatzipBackend {
    session: Box<UnsafeCell<QzSession_T>>,
}

// SAFETY: the session is only reached through `&mut self`, except for
// `qzMaxCompressedLength`, which reads the session configuration only.
unsafe impl Send for QatzipBackend {}

impl QatzipBackend {
    pub fn new() -> QatzipBackend {
        QatzipBackend {
            session: Box::new(UnsafeCell::new(QzSession_T {
                hw_session_stat: 0,
                thd_sess_stat: 0,
                internal: std::ptr::null_mut(),
                total_in: 0,
                total_out: 0,
            })),
        }
    }

    fn raw(&self) -> *mut QzSession_T {
        self.session.get()
    }
}

impl Default for QatzipBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for QatzipBackend {
    fn init(&mut self, sw_backup: bool) -> c_int {
        unsafe { qzInit(self.raw(), sw_backup as c_uchar) }
    }

    fn setup_session(&mut self, params: &SessionParams) -> c_int {
        let mut raw = std::mem::MaybeUninit::<QzSessionParams_T>::zeroed();
        unsafe {
            let rc = qzGetDefaults(raw.as_mut_ptr());
            if rc != QZ_OK {
                return rc;
            }
            let mut raw = raw.assume_init();
            raw.data_fmt = match params.data_format {
                DataFormat::GzipExt => QZ_DEFLATE_GZIP_EXT,
                DataFormat::Gzip => QZ_DEFLATE_GZIP,
                DataFormat::DeflateRaw => QZ_DEFLATE_RAW,
            };
            raw.polling_mode = match params.polling_mode {
                PollingMode::Periodical => QZ_PERIODICAL_POLLING,
                PollingMode::Busy => QZ_BUSY_POLLING,
            };
            raw.comp_lvl = params.compression_level;
            raw.sw_backup = params.sw_backup as c_uchar;
            raw.hw_buff_sz = params.hw_buffer_size;
            qzSetupSession(self.raw(), &mut raw)
        }
    }

    fn compress(
        &mut self,
        src: &[u8],
        src_len: &mut u32,
        dest: &mut [u8],
        dest_len: &mut u32,
        last: bool,
    ) -> c_int {
        if *src_len as usize > src.len() || *dest_len as usize > dest.len() {
            return QZ_PARAMS;
        }
        unsafe {
            qzCompress(
                self.raw(),
                src.as_ptr(),
                src_len,
                dest.as_mut_ptr(),
                dest_len,
                last as c_uint,
            )
        }
    }

    fn decompress(
        &mut self,
        src: &[u8],
        src_len: &mut u32,
        dest: &mut [u8],
        dest_len: &mut u32,
    ) -> c_int {
        if *src_len as usize > src.len() || *dest_len as usize > dest.len() {
            return QZ_PARAMS;
        }
        unsafe { qzDecompress(self.raw(), src.as_ptr(), src_len, dest.as_mut_ptr(), dest_len) }
    }

    fn max_compressed_length(&self, src_len: usize) -> usize {
        let Ok(src_sz) = c_uint::try_from(src_len) else {
            return usize::MAX;
        };
        // The library reports overflow as 0.
        match unsafe { qzMaxCompressedLength(src_sz, self.raw()) } {
            0 => usize::MAX,
            n => n as usize,
        }
    }

    fn teardown_session(&mut self) -> c_int {
        unsafe { qzTeardownSession(self.raw()) }
    }

    fn close(&mut self) -> c_int {
        unsafe { qzClose(self.raw()) }
    }
}
