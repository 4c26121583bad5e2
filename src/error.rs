// Copyright 2015 Axel Rasmussen
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error is the crate's single error type. Each variant corresponds to one of
/// the error kinds the dispatcher and REPL are specified to surface, plus a
/// couple of ambient variants for the underlying I/O and formatting machinery.
#[derive(Debug, Error)]
pub enum Error {
    /// Tokenizing received a null input, or a quoted run was never closed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No command resolved for the first token of a command line.
    #[error("Invalid command '{name}'")]
    UnknownCommand {
        /// The unrecognized command name.
        name: String,
    },

    /// A required argument had no value bound to it.
    #[error("The value for {name} is required.")]
    MissingRequiredArgument {
        /// The name of the missing argument.
        name: String,
    },

    /// A value could not be converted to the formal parameter's declared type.
    #[error("Invalid value '{value}' for argument '{name}'")]
    InvalidArgumentValue {
        /// The name of the argument which failed to convert.
        name: String,
        /// The literal value which could not be converted.
        value: String,
    },

    /// Macro expansion referenced an option which is not registered.
    #[error("unknown option specified: {name}")]
    UnknownOption {
        /// The unrecognized option name.
        name: String,
    },

    /// A handler explicitly raised an application-level error. Only the
    /// message is surfaced to the user.
    #[error("{0}")]
    Application(String),

    /// Any other handler failure. The type name and message are both
    /// surfaced (the type name is supplied by the caller, since Rust has no
    /// runtime type name for arbitrary errors without `Any`).
    #[error("{type_name}: {message}")]
    Unhandled {
        /// A human-readable label for the kind of failure (stands in for a
        /// reflected exception type name).
        type_name: String,
        /// The failure's message.
        message: String,
    },

    /// Pagination (the `more` built-in) was invoked without an injected
    /// next-key reader.
    #[error("console I/O is unavailable: no next-character reader was configured")]
    ConsoleIoUnavailable,

    /// An option or command name collided with another registration in the
    /// same handler.
    #[error("duplicate name '{name}' registered more than once")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// The tokenizer's prefix or delimiter character set was set to empty.
    #[error("tokenizer character set must not be empty")]
    EmptyCharacterSet,

    /// An I/O failure (reading stdin, writing a redirected file, etc).
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A formatting failure while rendering help text or similar.
    #[error("{0}")]
    Fmt(#[from] std::fmt::Error),
}

impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        // Compare via the serializable shadow below, which preserves every
        // variant's message-bearing fields but not e.g. io::Error's kind.
        SerializableError::from(self) == SerializableError::from(other)
    }
}

/// A `Result` alias using this crate's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

/// A message-preserving shadow of `Error`, used so the core's error type can
/// round-trip through a binary serializer (the source's own exception type is
/// specified to support this).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SerializableError {
    /// See `Error::InvalidInput`.
    InvalidInput(String),
    /// See `Error::UnknownCommand`.
    UnknownCommand { name: String },
    /// See `Error::MissingRequiredArgument`.
    MissingRequiredArgument { name: String },
    /// See `Error::InvalidArgumentValue`.
    InvalidArgumentValue { name: String, value: String },
    /// See `Error::UnknownOption`.
    UnknownOption { name: String },
    /// See `Error::Application`.
    Application(String),
    /// See `Error::Unhandled`.
    Unhandled { type_name: String, message: String },
    /// See `Error::ConsoleIoUnavailable`.
    ConsoleIoUnavailable,
    /// See `Error::DuplicateName`.
    DuplicateName { name: String },
    /// See `Error::EmptyCharacterSet`.
    EmptyCharacterSet,
    /// `Error::Io` and `Error::Fmt` both collapse to their displayed message,
    /// since neither `io::Error` nor `fmt::Error` is itself serializable.
    Opaque(String),
}

impl<'a> From<&'a Error> for SerializableError {
    fn from(e: &'a Error) -> SerializableError {
        match e {
            Error::InvalidInput(s) => SerializableError::InvalidInput(s.clone()),
            Error::UnknownCommand { name } => SerializableError::UnknownCommand {
                name: name.clone(),
            },
            Error::MissingRequiredArgument { name } => {
                SerializableError::MissingRequiredArgument { name: name.clone() }
            }
            Error::InvalidArgumentValue { name, value } => SerializableError::InvalidArgumentValue {
                name: name.clone(),
                value: value.clone(),
            },
            Error::UnknownOption { name } => SerializableError::UnknownOption { name: name.clone() },
            Error::Application(s) => SerializableError::Application(s.clone()),
            Error::Unhandled { type_name, message } => SerializableError::Unhandled {
                type_name: type_name.clone(),
                message: message.clone(),
            },
            Error::ConsoleIoUnavailable => SerializableError::ConsoleIoUnavailable,
            Error::DuplicateName { name } => SerializableError::DuplicateName { name: name.clone() },
            Error::EmptyCharacterSet => SerializableError::EmptyCharacterSet,
            Error::Io(e) => SerializableError::Opaque(e.to_string()),
            Error::Fmt(e) => SerializableError::Opaque(e.to_string()),
        }
    }
}

/// The result type a registered command or filter closure returns. Handlers
/// don't throw arbitrary exceptions the way the source's reflected methods
/// do; they either raise a deliberate application-level error or report some
/// other failure tagged with a caller-supplied label standing in for a
/// reflected exception's type name.
#[derive(Debug)]
pub enum HandlerError {
    /// A deliberate, user-facing failure raised by application logic.
    Application(String),
    /// Any other failure. `type_name` is a human label, not a real reflected
    /// type name, since Rust has no `Any`-free way to recover one generically.
    Other { type_name: String, message: String },
}

impl HandlerError {
    /// Construct an `Application`-kind handler error.
    pub fn application<S: Into<String>>(message: S) -> HandlerError {
        HandlerError::Application(message.into())
    }

    /// Construct an `Other`-kind handler error.
    pub fn other<S1: Into<String>, S2: Into<String>>(type_name: S1, message: S2) -> HandlerError {
        HandlerError::Other {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

impl From<Error> for HandlerError {
    fn from(e: Error) -> HandlerError {
        match e {
            Error::Application(msg) => HandlerError::Application(msg),
            other => HandlerError::other("Error", other.to_string()),
        }
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(e: std::io::Error) -> HandlerError {
        HandlerError::other("io::Error", e.to_string())
    }
}

impl From<HandlerError> for Error {
    fn from(e: HandlerError) -> Error {
        match e {
            HandlerError::Application(message) => Error::Application(message),
            HandlerError::Other { type_name, message } => Error::Unhandled { type_name, message },
        }
    }
}

/// The `Result` alias used by handler command and filter closures.
pub type HandlerResult = std::result::Result<(), HandlerError>;
