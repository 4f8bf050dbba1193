use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::{io, result};

use thiserror::Error;

use crate::token::Position;

pub type Result<T, E = Error> = result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("I/O error")]
    Io,
    #[error("input was not valid UTF-8")]
    Utf8,
    #[error("syntax error")]
    Syntax,
    #[error("structural error")]
    Structural,
    #[error("not found")]
    NotFound,
    #[error("invalid state")]
    InvalidState,
    #[error("validation failed")]
    Validation,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    position: Option<Position>,
    path: Option<PathBuf>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            path: None,
            source: None,
        }
    }

    pub(crate) fn syntax(message: impl Into<Cow<'static, str>>, position: Position) -> Self {
        Self::new(ErrorKind::Syntax, message).at(position)
    }

    pub(crate) fn structural(message: impl Into<Cow<'static, str>>, position: Position) -> Self {
        Self::new(ErrorKind::Structural, message).at(position)
    }

    pub(crate) fn not_found(what: &str, name: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} '{name}' not found"))
    }

    pub(crate) fn invalid_state(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Location in the input stream, present for tokenizer and grammar errors.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(position) = &self.position {
            write!(f, " at {position}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|boxed| boxed.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        // `read_line` reports malformed UTF-8 as InvalidData.
        let kind = if err.kind() == io::ErrorKind::InvalidData {
            ErrorKind::Utf8
        } else {
            ErrorKind::Io
        };
        Error::new(kind, err.to_string()).with_source(err)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::new(ErrorKind::Utf8, err.to_string()).with_source(err)
    }
}
