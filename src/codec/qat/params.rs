use crate::codec::{CodecError, Operation};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How the backend waits for the accelerator to complete a request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollingMode {
    /// Sleep between polls (`QZ_PERIODICAL_POLLING`).
    Periodical,
    /// Spin on the response ring (`QZ_BUSY_POLLING`).
    #[default]
    Busy,
}

impl FromStr for PollingMode {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "periodical" => Ok(PollingMode::Periodical),
            "busy" => Ok(PollingMode::Busy),
            _ => Err(CodecError::InvalidParams(Operation::SetupSession)),
        }
    }
}

impl Display for PollingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PollingMode::Periodical => "periodical",
            PollingMode::Busy => "busy",
        })
    }
}

/// Layout of the compressed stream produced by the accelerator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    /// Gzip members with a `QZ` extra field recording chunk and block sizes.
    #[default]
    GzipExt,
    Gzip,
    DeflateRaw,
}

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 1;
pub const DEFAULT_HW_BUFFER_SIZE: u32 = 64 * 1024;

/// Session configuration, fixed when the session is set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    pub polling_mode: PollingMode,
    pub data_format: DataFormat,
    /// Deflate effort, 1..=9.
    pub compression_level: u32,
    /// Let the library fall back to software when no device is usable.
    pub sw_backup: bool,
    pub hw_buffer_size: u32,
}

impl Default for SessionParams {
    fn default() -> Self {
        SessionParams {
            polling_mode: PollingMode::default(),
            data_format: DataFormat::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            sw_backup: true,
            hw_buffer_size: DEFAULT_HW_BUFFER_SIZE,
        }
    }
}

impl SessionParams {
    pub fn with_polling_mode(polling_mode: PollingMode) -> Self {
        SessionParams { polling_mode, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_mode_parses_known_names_only() {
        assert_eq!("busy".parse::<PollingMode>(), Ok(PollingMode::Busy));
        assert_eq!("periodical".parse::<PollingMode>(), Ok(PollingMode::Periodical));
        assert_eq!(
            "interrupt".parse::<PollingMode>(),
            Err(CodecError::InvalidParams(Operation::SetupSession))
        );
        assert_eq!(PollingMode::Periodical.to_string().parse(), Ok(PollingMode::Periodical));
    }

    #[test]
    fn defaults_match_qatzip() {
        let params = SessionParams::default();
        assert_eq!(params.polling_mode, PollingMode::Busy);
        assert_eq!(params.data_format, DataFormat::GzipExt);
        assert_eq!(params.compression_level, 1);
        assert!(params.sw_backup);
        assert_eq!(params.hw_buffer_size, 65536);
    }
}
