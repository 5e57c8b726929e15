//! Name-keyed codec factory.

use crate::codec::lz4::Lz4Codec;
use crate::codec::qat::{QatCodec, SessionParams};
use crate::codec::snappy::SnappyCodec;
use crate::codec::zstd::ZstdCodec;
use crate::codec::{Codec, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Lz4,
    Zstd,
    Snappy,
    Qat,
}

impl CodecKind {
    pub const ALL: [CodecKind; 4] = [CodecKind::Lz4, CodecKind::Zstd, CodecKind::Snappy, CodecKind::Qat];

    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::Lz4 => "lz4",
            CodecKind::Zstd => "zstd",
            CodecKind::Snappy => "snappy",
            CodecKind::Qat => "qat",
        }
    }

    /// File extension of the framed output.
    pub fn extension(&self) -> &'static str {
        match self {
            CodecKind::Lz4 => "lz4",
            CodecKind::Zstd => "zstd",
            CodecKind::Snappy => "sz",
            CodecKind::Qat => "qz",
        }
    }

    pub fn from_extension(ext: &str) -> Option<CodecKind> {
        CodecKind::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

impl Display for CodecKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown codec: {0}")]
pub struct UnknownCodec(String);

impl FromStr for CodecKind {
    type Err = UnknownCodec;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "lz4" => Ok(CodecKind::Lz4),
            "zstd" => Ok(CodecKind::Zstd),
            "snappy" | "snap" => Ok(CodecKind::Snappy),
            "qat" | "qat-gzip" => Ok(CodecKind::Qat),
            other => Err(UnknownCodec(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Level for the software codecs. The QAT codec takes its level from
    /// `session`.
    pub level: i32,
    pub session: SessionParams,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            level: 1,
            session: SessionParams::default(),
        }
    }
}

/// Builds a ready-to-use codec, or returns the error that prevented its
/// session from coming up.
pub fn make_codec(kind: CodecKind, options: &CodecOptions) -> Result<Box<dyn Codec>> {
    Ok(match kind {
        CodecKind::Lz4 => Box::new(Lz4Codec::new(options.level)),
        CodecKind::Zstd => Box::new(ZstdCodec::new(options.level)?),
        CodecKind::Snappy => Box::new(SnappyCodec::new()),
        CodecKind::Qat => make_qat_codec(&options.session)?,
    })
}

#[cfg(feature = "qatzip")]
fn make_qat_codec(params: &SessionParams) -> Result<Box<dyn Codec>> {
    Ok(Box::new(QatCodec::hardware(*params)?))
}

#[cfg(not(feature = "qatzip"))]
fn make_qat_codec(params: &SessionParams) -> Result<Box<dyn Codec>> {
    use crate::codec::qat::EmulatedDevice;
    tracing::info!("built without qatzip support, using the emulated QAT device");
    Ok(Box::new(QatCodec::emulated(EmulatedDevice::shared(), *params)?))
}
