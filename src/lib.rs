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

//! A reflection-style interactive command interpreter.
//!
//! Application code builds a [`registry::Registry`] describing the options,
//! commands, and filters a handler type exposes, registers it on an
//! [`interpreter::Interpreter`], and then either calls
//! [`interpreter::Interpreter::execute_line`] directly or hands the
//! interpreter to [`repl::run`] for an interactive loop. Input is tokenized
//! shell-style (see [`token`]), split into named/positional arguments (see
//! [`arglist`]), and coerced to Rust types on demand (see [`coerce`]).

pub mod arglist;
pub mod builtins;
pub mod coerce;
pub mod dispatch;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod macros;
pub mod pipeline;
pub mod registry;
pub mod repl;
pub mod stdio;
pub mod term;
pub mod token;

pub use crate::coerce::CommandArgs;
pub use crate::error::{Error, HandlerError, HandlerResult, Result};
pub use crate::interpreter::Interpreter;
pub use crate::registry::{ArgumentSpec, Handler, Registry};
pub use crate::stdio::StdIo;
