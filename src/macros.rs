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

//! Macro expansion: before a line of input is tokenized, `$(Name)` is
//! replaced with the current string value of the option named `Name`, and a
//! literal `$` is written as `$$`. A reference to an option which doesn't
//! exist is an error, surfaced the same way any other dispatch error is.

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;

/// Expand every `$(Name)` and `$$` occurrence in `line`.
pub fn expand_macros(interpreter: &Interpreter, line: &str) -> Result<String> {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('(') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ')' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(Error::InvalidInput(
                        "unterminated macro reference: missing ')'".to_owned(),
                    ));
                }
                let value = interpreter.get_option(&name)?;
                out.push_str(&crate::token::join(&[value]));
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[derive(Default)]
    struct Counter {
        count: i64,
    }

    fn interpreter_with_count_option() -> Interpreter {
        let interpreter = Interpreter::with_suppressed_builtins(&[
            "help", "get", "set", "echo", "more", "find", "prompt", "exit",
        ])
        .unwrap();
        let registry: Registry<Counter> = Registry::new().option(
            "count",
            "",
            "0",
            |h: &Counter| h.count.to_string(),
            |h: &mut Counter, v: &str| {
                h.count = v.parse().unwrap_or(0);
                Ok(())
            },
        );
        interpreter.add_handler(Counter::default(), registry).unwrap();
        interpreter
    }

    #[test]
    fn test_expands_known_option() {
        let interpreter = interpreter_with_count_option();
        assert_eq!(expand_macros(&interpreter, "value is $(count)").unwrap(), "value is 0");
    }

    #[test]
    fn test_expands_value_containing_whitespace_with_quoting() {
        let interpreter = Interpreter::with_suppressed_builtins(&[
            "help", "get", "set", "echo", "more", "find", "prompt", "exit",
        ])
        .unwrap();
        let registry: Registry<Counter> = Registry::new().option(
            "somedata",
            "",
            "TEST Data",
            |_: &Counter| "TEST Data".to_owned(),
            |_: &mut Counter, _: &str| Ok(()),
        );
        interpreter.add_handler(Counter::default(), registry).unwrap();
        assert_eq!(
            expand_macros(&interpreter, "ECHO $(somedata)").unwrap(),
            "ECHO \"TEST Data\""
        );
    }

    #[test]
    fn test_literal_dollar() {
        let interpreter = interpreter_with_count_option();
        assert_eq!(expand_macros(&interpreter, "cost: $$5").unwrap(), "cost: $5");
    }

    #[test]
    fn test_unknown_option_is_an_error() {
        let interpreter = interpreter_with_count_option();
        assert!(matches!(
            expand_macros(&interpreter, "$(nope)"),
            Err(Error::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_unterminated_reference_is_an_error() {
        let interpreter = interpreter_with_count_option();
        assert!(expand_macros(&interpreter, "$(count").is_err());
    }
}
