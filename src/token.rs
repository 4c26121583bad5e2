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

/// Whether name lookups (options, commands, aliases) are case-sensitive.
/// Defaults to case-insensitive, matching the source's default comparer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Comparer {
    /// Names match only when identical byte-for-byte.
    CaseSensitive,
    /// Names match regardless of ASCII case.
    CaseInsensitive,
}

impl Comparer {
    /// Returns whether `a` and `b` are equal under this comparer.
    pub fn eq(&self, a: &str, b: &str) -> bool {
        match *self {
            Comparer::CaseSensitive => a == b,
            Comparer::CaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }

    /// Returns a canonical form of `s` suitable for use as a hash map key
    /// under this comparer.
    pub fn canonicalize(&self, s: &str) -> String {
        match *self {
            Comparer::CaseSensitive => s.to_owned(),
            Comparer::CaseInsensitive => s.to_lowercase(),
        }
    }
}

impl Default for Comparer {
    fn default() -> Self {
        Comparer::CaseInsensitive
    }
}

/// TokenizerConfig holds the process-wide-by-default, but explicitly
/// constructed and passed around, knobs which govern how a line of input is
/// split into tokens and how named tokens are recognized. Per the design
/// notes, this is a plain value rather than global mutable state.
#[derive(Clone, Debug)]
pub struct TokenizerConfig {
    /// Characters which, when leading a token, mark it as a named argument
    /// (e.g. `/` or `-`).
    pub prefix_chars: Vec<char>,
    /// Characters which separate a named argument's name from its value
    /// (e.g. `=` or `:`).
    pub delimiter_chars: Vec<char>,
    /// The default comparer used for name lookups.
    pub comparer: Comparer,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            prefix_chars: vec!['/', '-'],
            delimiter_chars: vec!['=', ':'],
            comparer: Comparer::CaseInsensitive,
        }
    }
}

impl TokenizerConfig {
    /// Replace the set of prefix characters. Fails if `chars` is empty.
    pub fn set_prefix_chars(&mut self, chars: Vec<char>) -> Result<()> {
        if chars.is_empty() {
            return Err(Error::EmptyCharacterSet);
        }
        self.prefix_chars = chars;
        Ok(())
    }

    /// Replace the set of name/value delimiter characters. Fails if `chars`
    /// is empty.
    pub fn set_delimiter_chars(&mut self, chars: Vec<char>) -> Result<()> {
        if chars.is_empty() {
            return Err(Error::EmptyCharacterSet);
        }
        self.delimiter_chars = chars;
        Ok(())
    }

    /// Returns true if `c` is one of the configured prefix characters.
    pub fn is_prefix(&self, c: char) -> bool {
        self.prefix_chars.contains(&c)
    }

    /// Returns true if `c` is one of the configured delimiter characters.
    pub fn is_delimiter(&self, c: char) -> bool {
        self.delimiter_chars.contains(&c)
    }

    /// Strip a single leading prefix character from `token`, if present.
    pub fn strip_prefix<'a>(&self, token: &'a str) -> Option<&'a str> {
        let mut chars = token.chars();
        match chars.next() {
            Some(c) if self.is_prefix(c) => Some(chars.as_str()),
            _ => None,
        }
    }

    /// Split `stripped` (a token with its prefix already removed) on the
    /// first configured delimiter character, returning `(name, value)`. If no
    /// delimiter is present, `value` is `None`.
    pub fn split_name_value<'a>(&self, stripped: &'a str) -> (&'a str, Option<&'a str>) {
        match stripped.find(|c| self.is_delimiter(c)) {
            Some(idx) => {
                let delim_len = stripped[idx..].chars().next().unwrap().len_utf8();
                (&stripped[..idx], Some(&stripped[idx + delim_len..]))
            }
            None => (stripped, None),
        }
    }
}

const QUOTE: char = '"';

/// Tokenize a single line of input into a vector of tokens.
///
/// Tokens are separated by unquoted whitespace. Inside a double-quoted run, a
/// doubled quote (`""`) is a literal quote, and the run ends at the first
/// unescaped quote. `line` being `None` is itself an error (mirrors the
/// source's `Parse(null)` failing).
pub fn parse(line: Option<&str>) -> Result<Vec<String>> {
    let line = line.ok_or_else(|| Error::InvalidInput("input was null".to_owned()))?;

    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    // Doubled quote: a literal embedded quote.
                    current.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }

        if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
            continue;
        }

        if c == QUOTE {
            in_quotes = true;
            in_token = true;
            continue;
        }

        current.push(c);
        in_token = true;
    }

    if in_quotes {
        return Err(Error::InvalidInput(
            "unterminated quoted string".to_owned(),
        ));
    }
    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

fn needs_quoting(token: &str) -> bool {
    token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == QUOTE)
}

/// The inverse of `parse`: joins a vector of tokens back into a single
/// string, quoting (and doubling internal quotes of) any token which contains
/// whitespace or a quote character. Tokens with no whitespace and no quotes
/// are emitted bare, even if the original input had redundant quotes around
/// them — this is what makes `Join(Parse(...))` normalize away redundant
/// quoting while still round-tripping well-formed token vectors.
pub fn join(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| {
            if needs_quoting(t) {
                let mut quoted = String::with_capacity(t.len() + 2);
                quoted.push(QUOTE);
                for c in t.chars() {
                    if c == QUOTE {
                        quoted.push(QUOTE);
                        quoted.push(QUOTE);
                    } else {
                        quoted.push(c);
                    }
                }
                quoted.push(QUOTE);
                quoted
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scan `tokens` linearly for the first token whose stripped name equals
/// `name` under `config`'s comparer. On a match, remove it (splicing the
/// vector) and return its value (`None` if no delimiter was present in that
/// token). Returns `None` if no token matched. Matching is exact, including
/// embedded whitespace, since it compares the *stripped* token text rather
/// than a further-tokenized form.
pub fn remove(tokens: &mut Vec<String>, name: &str, config: &TokenizerConfig) -> Option<Option<String>> {
    let mut found_index = None;
    let mut found_value = None;

    for (idx, token) in tokens.iter().enumerate() {
        if let Some(stripped) = config.strip_prefix(token) {
            let (tok_name, tok_value) = config.split_name_value(stripped);
            if config.comparer.eq(tok_name, name) {
                found_index = Some(idx);
                found_value = Some(tok_value.map(|v| v.to_owned()));
                break;
            }
        }
    }

    if let Some(idx) = found_index {
        tokens.remove(idx);
    }
    found_value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_null_fails() {
        assert!(parse(None).is_err());
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse(Some("a b c")).unwrap(), owned(&["a", "b", "c"]));
    }

    #[test]
    fn test_parse_quoted_with_space() {
        assert_eq!(
            parse(Some("a b \"c c\"")).unwrap(),
            owned(&["a", "b", "c c"])
        );
    }

    #[test]
    fn test_parse_quoted_leading_trailing_space() {
        assert_eq!(
            parse(Some("a b \" c \"")).unwrap(),
            owned(&["a", "b", " c "])
        );
    }

    #[test]
    fn test_parse_embedded_doubled_quote() {
        assert_eq!(
            parse(Some("a \"b\"\"b\" c")).unwrap(),
            owned(&["a", "b\"b", "c"])
        );
    }

    #[test]
    fn test_parse_triple_doubled_quote() {
        assert_eq!(
            parse(Some("a \"\"\"b\"\"\" c")).unwrap(),
            owned(&["a", "\"b\"", "c"])
        );
    }

    #[test]
    fn test_parse_unterminated_quote_fails() {
        assert!(parse(Some("a \"b")).is_err());
    }

    #[test]
    fn test_round_trip_canonical_forms() {
        let forms = [
            "a b c",
            "a b \"c c\"",
            "a b \" c \"",
            "a \"b\"\"b\" c",
            "a \"\"\"b\"\"\" c",
        ];
        for form in &forms {
            let tokens = parse(Some(form)).unwrap();
            assert_eq!(tokens.len(), 3);
            assert_eq!(join(&tokens), form.to_string());
            assert_eq!(parse(Some(&join(&tokens))).unwrap(), tokens);
        }
    }

    #[test]
    fn test_join_drops_redundant_quotes() {
        let tokens = parse(Some("a \"b\" c")).unwrap();
        assert_eq!(join(&tokens), "a b c");
    }

    #[test]
    fn test_remove_basic() {
        let mut tokens = owned(&["/foo=bar", "baz"]);
        let value = remove(&mut tokens, "foo", &TokenizerConfig::default());
        assert_eq!(value, Some(Some("bar".to_owned())));
        assert_eq!(tokens, owned(&["baz"]));
    }

    #[test]
    fn test_remove_no_value() {
        let mut tokens = owned(&["/flag", "baz"]);
        let value = remove(&mut tokens, "flag", &TokenizerConfig::default());
        assert_eq!(value, Some(None));
        assert_eq!(tokens, owned(&["baz"]));
    }

    #[test]
    fn test_remove_repeated_calls_remove_successive_occurrences() {
        let mut tokens = owned(&["/x=1", "/x=2"]);
        let config = TokenizerConfig::default();
        assert_eq!(remove(&mut tokens, "x", &config), Some(Some("1".to_owned())));
        assert_eq!(remove(&mut tokens, "x", &config), Some(Some("2".to_owned())));
        assert_eq!(remove(&mut tokens, "x", &config), None);
    }

    #[test]
    fn test_remove_is_exact_including_embedded_whitespace() {
        let mut tokens = owned(&["/four ", "/four"]);
        let config = TokenizerConfig::default();
        assert_eq!(remove(&mut tokens, "four", &config), Some(None));
        assert_eq!(tokens, owned(&["/four "]));
    }

    #[test]
    fn test_set_prefix_chars_empty_fails() {
        let mut config = TokenizerConfig::default();
        assert!(config.set_prefix_chars(Vec::new()).is_err());
    }

    #[test]
    fn test_set_delimiter_chars_empty_fails() {
        let mut config = TokenizerConfig::default();
        assert!(config.set_delimiter_chars(Vec::new()).is_err());
    }
}
