use crate::codec::qat::params::SessionParams;
use std::ffi::c_int;

/// The QATzip session primitives.
///
/// A `Backend` value is one session: it is created zeroed, initialized and set
/// up once, and closed once. Every method returns a raw QATzip status code;
/// translation happens in [`super::status`]. Lengths are in/out parameters in
/// the library's 32-bit counters: on entry they hold the usable length of the
/// slice, on success the backend stores the bytes consumed or produced.
pub trait Backend: Send {
    fn init(&mut self, sw_backup: bool) -> c_int;

    fn setup_session(&mut self, params: &SessionParams) -> c_int;

    fn compress(
        &mut self,
        src: &[u8],
        src_len: &mut u32,
        dest: &mut [u8],
        dest_len: &mut u32,
        last: bool,
    ) -> c_int;

    fn decompress(
        &mut self,
        src: &[u8],
        src_len: &mut u32,
        dest: &mut [u8],
        dest_len: &mut u32,
    ) -> c_int;

    /// Worst-case compressed size for this session's configuration.
    fn max_compressed_length(&self, src_len: usize) -> usize;

    fn teardown_session(&mut self) -> c_int;

    fn close(&mut self) -> c_int;
}
