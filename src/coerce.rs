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

use crate::error::{Error, Result};
use crate::registry::ArgumentSpec;
use std::collections::HashMap;

/// The raw values bound to a single formal parameter: one entry per
/// occurrence in the token stream, each either a value (`Some`) or a
/// presence-only occurrence with no delimiter (`None`).
pub type RawValues = Vec<Option<String>>;

/// CommandArgs is built by the dispatcher for a single command invocation. It
/// holds the command's argument metadata plus whatever raw values were bound
/// to each one, and exposes typed accessors which perform the §4.3 coercion
/// rules on demand.
pub struct CommandArgs {
    specs: HashMap<String, ArgumentSpec>,
    resolved: HashMap<String, RawValues>,
    raw_tokens: Vec<String>,
}

impl CommandArgs {
    pub(crate) fn new(
        specs: Vec<ArgumentSpec>,
        resolved: HashMap<String, RawValues>,
        raw_tokens: Vec<String>,
    ) -> CommandArgs {
        CommandArgs {
            specs: specs.into_iter().map(|s| (s.name.clone(), s)).collect(),
            resolved,
            raw_tokens,
        }
    }

    fn spec(&self, name: &str) -> &ArgumentSpec {
        self.specs
            .get(name)
            .unwrap_or_else(|| panic!("no argument named '{}' was declared on this command", name))
    }

    /// The full, unmodified token vector the current command was invoked
    /// with (excluding the command name itself). Used for parameters flagged
    /// as "captures all arguments".
    pub fn all_arguments(&self) -> &[String] {
        &self.raw_tokens
    }

    fn values(&self, name: &str) -> Result<Option<&RawValues>> {
        match self.resolved.get(name) {
            Some(v) => Ok(Some(v)),
            None => {
                let spec = self.spec(name);
                if spec.default.is_none() && !spec.captures_all {
                    return Err(Error::MissingRequiredArgument {
                        name: spec.name.clone(),
                    });
                }
                Ok(None)
            }
        }
    }

    fn default_strings(&self, name: &str) -> Vec<String> {
        self.spec(name).default.clone().unwrap_or_default()
    }

    /// Coerce this argument to a single required string. Fails with
    /// `missing-required-argument` if it was never bound and has no default.
    pub fn string(&self, name: &str) -> Result<String> {
        match self.values(name)? {
            Some(values) => Ok(values
                .first()
                .and_then(|v| v.clone())
                .unwrap_or_default()),
            None => Ok(self.default_strings(name).into_iter().next().unwrap_or_default()),
        }
    }

    /// Coerce this argument to an optional string: `None` if it was neither
    /// bound nor given a default.
    pub fn opt_string(&self, name: &str) -> Result<Option<String>> {
        match self.values(name)? {
            Some(values) => Ok(values.first().and_then(|v| v.clone())),
            None => Ok(self.default_strings(name).into_iter().next()),
        }
    }

    /// Coerce this argument to a boolean. Accepts (case-insensitively)
    /// `true`/`false`/`yes`/`no`/`1`/`0`; a bound occurrence with no explicit
    /// value (a bare flag-like presence) is treated as `true`.
    pub fn bool(&self, name: &str) -> Result<bool> {
        let literal = match self.values(name)? {
            Some(values) => match values.first() {
                Some(Some(v)) => v.clone(),
                Some(None) => return Ok(true),
                None => return Ok(true),
            },
            None => match self.default_strings(name).into_iter().next() {
                Some(v) => v,
                None => return Ok(false),
            },
        };
        parse_bool(name, &literal)
    }

    /// Coerce this argument to a 64-bit signed integer.
    pub fn i64(&self, name: &str) -> Result<i64> {
        let literal = self.string(name)?;
        literal
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidArgumentValue {
                name: name.to_owned(),
                value: literal,
            })
    }

    /// Coerce this argument to a 64-bit float.
    pub fn f64(&self, name: &str) -> Result<f64> {
        let literal = self.string(name)?;
        literal
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidArgumentValue {
                name: name.to_owned(),
                value: literal,
            })
    }

    /// Coerce this argument to an array of strings: every value bound to
    /// this name, in order of appearance. An unbound argument yields its
    /// declared default (often empty).
    pub fn array(&self, name: &str) -> Result<Vec<String>> {
        match self.values(name)? {
            Some(values) => Ok(values.iter().filter_map(|v| v.clone()).collect()),
            None => Ok(self.default_strings(name)),
        }
    }

    /// Coerce this argument via a caller-supplied, case-insensitive enum
    /// parser. Rust has no reflection over enum variant names, so the
    /// handler supplies the mapping from lowercase name to variant.
    pub fn enum_value<E, F>(&self, name: &str, parse: F) -> Result<E>
    where
        F: Fn(&str) -> Option<E>,
    {
        let literal = self.string(name)?;
        parse(&literal.to_lowercase()).ok_or_else(|| Error::InvalidArgumentValue {
            name: name.to_owned(),
            value: literal,
        })
    }
}

fn parse_bool(name: &str, literal: &str) -> Result<bool> {
    match literal.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::InvalidArgumentValue {
            name: name.to_owned(),
            value: literal.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, default: Option<Vec<&str>>, captures_all: bool) -> ArgumentSpec {
        ArgumentSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: String::new(),
            default: default.map(|d| d.into_iter().map(|s| s.to_owned()).collect()),
            visible: true,
            position: 0,
            captures_all,
        }
    }

    #[test]
    fn test_missing_required_fails() {
        let args = CommandArgs::new(vec![spec("n", None, false)], HashMap::new(), Vec::new());
        assert!(matches!(
            args.string("n"),
            Err(Error::MissingRequiredArgument { .. })
        ));
    }

    #[test]
    fn test_missing_optional_uses_default() {
        let args = CommandArgs::new(
            vec![spec("n", Some(vec!["7"]), false)],
            HashMap::new(),
            Vec::new(),
        );
        assert_eq!(args.i64("n").unwrap(), 7);
    }

    #[test]
    fn test_bool_variants() {
        let mut resolved = HashMap::new();
        resolved.insert("b".to_owned(), vec![Some("yes".to_owned())]);
        let args = CommandArgs::new(vec![spec("b", None, false)], resolved, Vec::new());
        assert_eq!(args.bool("b").unwrap(), true);
    }

    #[test]
    fn test_bool_presence_without_value_is_true() {
        let mut resolved = HashMap::new();
        resolved.insert("backwards".to_owned(), vec![None]);
        let args = CommandArgs::new(vec![spec("backwards", None, false)], resolved, Vec::new());
        assert_eq!(args.bool("backwards").unwrap(), true);
    }

    #[test]
    fn test_array_accumulates_in_order() {
        let mut resolved = HashMap::new();
        resolved.insert(
            "t".to_owned(),
            vec![Some("a".to_owned()), Some("b".to_owned())],
        );
        let args = CommandArgs::new(vec![spec("t", Some(vec![]), false)], resolved, Vec::new());
        assert_eq!(args.array("t").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_numeric_value() {
        let mut resolved = HashMap::new();
        resolved.insert("n".to_owned(), vec![Some("not-a-number".to_owned())]);
        let args = CommandArgs::new(vec![spec("n", None, false)], resolved, Vec::new());
        assert!(matches!(
            args.i64("n"),
            Err(Error::InvalidArgumentValue { .. })
        ));
    }
}
