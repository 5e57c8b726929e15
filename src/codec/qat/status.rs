//! QATzip status codes and their translation into [`CodecError`].

use crate::codec::{CodecError, Operation};
use std::ffi::c_int;

pub const QZ_OK: c_int = 0;
pub const QZ_DUPLICATE: c_int = 1;
pub const QZ_FORCE_SW: c_int = 2;
pub const QZ_PARAMS: c_int = -1;
pub const QZ_FAIL: c_int = -2;
pub const QZ_BUF_ERROR: c_int = -3;
pub const QZ_DATA_ERROR: c_int = -4;
pub const QZ_TIMEOUT: c_int = -5;
pub const QZ_INTEG: c_int = -100;
pub const QZ_NO_HW: c_int = 11;
pub const QZ_NO_MDRV: c_int = 12;
pub const QZ_NO_INST_ATTACH: c_int = 13;
pub const QZ_LOW_MEM: c_int = 14;
pub const QZ_NOSW_NO_HW: c_int = -101;
pub const QZ_NOSW_NO_MDRV: c_int = -102;
pub const QZ_NOSW_NO_INST_ATTACH: c_int = -103;
pub const QZ_NOSW_LOW_MEM: c_int = -104;
pub const QZ_NO_SW_AVAIL: c_int = -105;
pub const QZ_NOT_SUPPORTED: c_int = -200;

/// `qzInit` may legitimately be called on an already initialized process.
pub fn init_failed(rc: c_int) -> bool {
    rc != QZ_OK && rc != QZ_DUPLICATE
}

/// Codes after which a session can never become usable.
pub fn setup_session_fatal(rc: c_int) -> bool {
    matches!(rc, QZ_PARAMS | QZ_NOSW_NO_HW | QZ_NOSW_LOW_MEM)
}

/// Translates the status of a compress or decompress call.
pub fn check(op: Operation, rc: c_int) -> Result<(), CodecError> {
    match rc {
        QZ_OK => Ok(()),
        QZ_PARAMS => Err(CodecError::InvalidParams(op)),
        QZ_FAIL => Err(CodecError::OperationFailed(op)),
        code => Err(CodecError::Unknown { op, code }),
    }
}

/// Translates the status of `qzInit` or `qzSetupSession`, where a missing
/// device or a lack of memory is distinguished from other failures.
pub fn check_setup(op: Operation, rc: c_int) -> Result<(), CodecError> {
    match rc {
        QZ_NOSW_NO_HW | QZ_NOSW_LOW_MEM => Err(CodecError::ResourceUnavailable { op, code: rc }),
        _ => check(op, rc),
    }
}
