//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = ThenThanError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum ThenThanError {
    Configuration(ConfigurationError),
    UnknownTag(UnknownTagError),
    InvalidFormat(InvalidFormatError),
    InvalidModel(InvalidModelError),
    DecodeError(bincode::error::DecodeError),
    EncodeError(bincode::error::EncodeError),
    IOError(std::io::Error),
}

impl ThenThanError {
    pub(crate) fn configuration<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Configuration(ConfigurationError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn unknown_tag<S>(offset: i8, tag: S) -> Self
    where
        S: Into<String>,
    {
        Self::UnknownTag(UnknownTagError {
            offset,
            tag: tag.into(),
        })
    }

    pub(crate) fn invalid_format<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError { msg: msg.into() })
    }

    pub(crate) fn invalid_model<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidModel(InvalidModelError { msg: msg.into() })
    }
}

impl fmt::Display for ThenThanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Configuration(e) => e.fmt(f),
            Self::UnknownTag(e) => e.fmt(f),
            Self::InvalidFormat(e) => e.fmt(f),
            Self::InvalidModel(e) => e.fmt(f),
            Self::DecodeError(e) => e.fmt(f),
            Self::EncodeError(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for ThenThanError {}

/// Error used when a parameter is invalid or inconsistent with a trained model.
#[derive(Debug)]
pub struct ConfigurationError {
    /// Name of the parameter.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ConfigurationError: {}: {}", self.arg, self.msg)
    }
}

impl Error for ConfigurationError {}

/// Error used when a context contains a tag that was never observed at that slot during
/// training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTagError {
    /// Offset of the slot relative to the target word.
    pub(crate) offset: i8,

    /// The unseen tag.
    pub(crate) tag: String,
}

impl UnknownTagError {
    /// Offset of the slot relative to the target word.
    pub const fn offset(&self) -> i8 {
        self.offset
    }

    /// The tag that is missing from the feature schema.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for UnknownTagError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "UnknownTagError: tag {:?} was never observed at Slot{}",
            self.tag, self.offset
        )
    }
}

impl Error for UnknownTagError {}

/// Error used when an input text does not follow the expected format.
#[derive(Debug)]
pub struct InvalidFormatError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}", self.msg)
    }
}

impl Error for InvalidFormatError {}

/// Error used when the model is invalid.
#[derive(Debug)]
pub struct InvalidModelError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidModelError: {}", self.msg)
    }
}

impl Error for InvalidModelError {}

impl From<bincode::error::DecodeError> for ThenThanError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::DecodeError(error)
    }
}

impl From<bincode::error::EncodeError> for ThenThanError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::EncodeError(error)
    }
}

impl From<std::io::Error> for ThenThanError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}
