use crate::codec::qat::backend::Backend;
use crate::codec::qat::params::SessionParams;
use crate::codec::qat::status::{self, QZ_DUPLICATE, QZ_OK};
use crate::codec::{CodecError, Operation, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    /// A setup step failed; the session never becomes usable again.
    Error,
    Closed,
}

/// An accelerator session, exclusively owned and released exactly once.
///
/// The backend is closed when the session is dropped, whatever state it
/// reached, so a failed [`Session::open`] never leaks the device.
pub struct Session<B: Backend> {
    backend: B,
    params: SessionParams,
    state: SessionState,
    configured: bool,
}

impl<B: Backend> Session<B> {
    /// Initializes and configures `backend`. No step is retried.
    pub fn open(backend: B, params: SessionParams) -> Result<Session<B>> {
        let mut session = Session {
            backend,
            params,
            state: SessionState::Uninitialized,
            configured: false,
        };
        session.initialize()?;
        session.configure()?;
        Ok(session)
    }

    fn initialize(&mut self) -> Result<()> {
        self.state = SessionState::Initializing;
        let rc = self.backend.init(self.params.sw_backup);
        if status::init_failed(rc) {
            warn!("qzInit failed with error: {}", rc);
            self.state = SessionState::Error;
            return Err(setup_error(Operation::Init, rc));
        }
        if rc == QZ_DUPLICATE {
            debug!("QAT already initialized in this process");
        }
        Ok(())
    }

    fn configure(&mut self) -> Result<()> {
        let rc = self.backend.setup_session(&self.params);
        if rc != QZ_OK {
            if status::setup_session_fatal(rc) {
                warn!("qzSetupSession failed with error: {}", rc);
            } else {
                warn!("qzSetupSession returned {}, discarding session", rc);
            }
            self.state = SessionState::Error;
            return Err(setup_error(Operation::SetupSession, rc));
        }
        self.configured = true;
        self.state = SessionState::Ready;
        debug!(
            "QAT session ready: {} polling, {:?}, level {}",
            self.params.polling_mode, self.params.data_format, self.params.compression_level
        );
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, provided the session is ready for data calls.
    pub fn ready(&mut self, op: Operation) -> Result<&mut B> {
        match self.state {
            SessionState::Ready => Ok(&mut self.backend),
            _ => Err(CodecError::InvalidParams(op)),
        }
    }

    /// Releases the session. Later calls do nothing.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if self.configured {
            let rc = self.backend.teardown_session();
            if rc != QZ_OK {
                debug!("qzTeardownSession returned {}", rc);
            }
        }
        let rc = self.backend.close();
        if rc != QZ_OK {
            debug!("qzClose returned {}", rc);
        }
        self.configured = false;
        self.state = SessionState::Closed;
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Any failure while bringing a session up is fatal for it; codes outside
/// the setup vocabulary still surface as a generic error.
fn setup_error(op: Operation, rc: i32) -> CodecError {
    match status::check_setup(op, rc) {
        Err(e) => e,
        Ok(()) => CodecError::Unknown { op, code: rc },
    }
}
