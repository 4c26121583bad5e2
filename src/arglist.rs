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

use crate::token::TokenizerConfig;
use std::collections::HashMap;

/// An Item is a single named entry in an ArgumentList: a name plus zero or
/// more values. A name may appear multiple times in the source token stream
/// (e.g. `/t:a /t:b`), in which case its values accumulate in order of
/// appearance. A value-less occurrence (no delimiter present) records `None`.
#[derive(Clone, Debug)]
pub struct Item {
    name: String,
    values: Vec<Option<String>>,
}

impl Item {
    fn new(name: String) -> Item {
        Item {
            name,
            values: Vec::new(),
        }
    }

    /// The canonical display name for this item (the case it was first seen
    /// in, not the lookup key).
    pub fn name(&self) -> &str {
        &self.name
    }

    fn push(&mut self, value: Option<String>) {
        self.values.push(value);
    }

    /// Read this item as a single string: the first recorded value, or `None`
    /// if it was never given a value (e.g. a bare flag).
    pub fn as_string(&self) -> Option<&str> {
        self.values.first().and_then(|v| v.as_deref())
    }

    /// Read this item as an array: every recorded value in order of
    /// appearance. A value-less occurrence is skipped.
    pub fn as_array(&self) -> Vec<&str> {
        self.values.iter().filter_map(|v| v.as_deref()).collect()
    }

    /// The number of times this name occurred in the source tokens.
    pub fn occurrence_count(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn clone_values(&self) -> Vec<Option<String>> {
        self.values.clone()
    }
}

/// ArgumentList is a structured view over a token stream: a mapping from
/// canonical name to `Item`, plus an ordered list of unnamed (positional)
/// values.
#[derive(Clone, Debug)]
pub struct ArgumentList {
    named: HashMap<String, Item>,
    unnamed: Vec<String>,
    comparer_is_case_insensitive: bool,
}

impl ArgumentList {
    /// Build an ArgumentList by classifying each of `tokens` as either named
    /// (it begins with a configured prefix character, optionally followed by
    /// `name<delim>value`) or unnamed. An empty name after stripping the
    /// prefix falls through to being treated as unnamed.
    pub fn from_tokens(tokens: &[String], config: &TokenizerConfig) -> ArgumentList {
        let mut named: HashMap<String, Item> = HashMap::new();
        let mut unnamed = Vec::new();
        let case_insensitive = config.comparer == crate::token::Comparer::CaseInsensitive;

        for token in tokens {
            if let Some(stripped) = config.strip_prefix(token) {
                let (name, value) = config.split_name_value(stripped);
                if name.is_empty() {
                    unnamed.push(token.clone());
                    continue;
                }
                let key = config.comparer.canonicalize(name);
                let entry = named
                    .entry(key)
                    .or_insert_with(|| Item::new(name.to_owned()));
                entry.push(value.map(|v| v.to_owned()));
            } else {
                unnamed.push(token.clone());
            }
        }

        ArgumentList {
            named,
            unnamed,
            comparer_is_case_insensitive: case_insensitive,
        }
    }

    /// Look up a named item. The comparer configured when this list was
    /// built governs case sensitivity of `name`.
    pub fn get(&self, name: &str) -> Option<&Item> {
        let key = if self.comparer_is_case_insensitive {
            name.to_lowercase()
        } else {
            name.to_owned()
        };
        self.named.get(&key)
    }

    /// Returns true if an item with this name was present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The ordered list of values which did not belong to a named item.
    pub fn unnamed(&self) -> &[String] {
        &self.unnamed
    }

    /// An iterator over every named item in this list, in unspecified order.
    pub fn named_items(&self) -> impl Iterator<Item = &Item> {
        self.named.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_named_and_unnamed_split() {
        let config = TokenizerConfig::default();
        let list = ArgumentList::from_tokens(&owned(&["/foo=bar", "baz"]), &config);
        assert_eq!(list.get("foo").unwrap().as_string(), Some("bar"));
        assert_eq!(list.unnamed(), &["baz".to_owned()]);
    }

    #[test]
    fn test_case_insensitive_lookup_by_default() {
        let config = TokenizerConfig::default();
        let list = ArgumentList::from_tokens(&owned(&["/Foo=bar"]), &config);
        assert_eq!(list.get("foo").unwrap().as_string(), Some("bar"));
        assert_eq!(list.get("FOO").unwrap().as_string(), Some("bar"));
    }

    #[test]
    fn test_repeated_name_accumulates_values() {
        let config = TokenizerConfig::default();
        let list = ArgumentList::from_tokens(&owned(&["/t:a", "/t:b"]), &config);
        assert_eq!(list.get("t").unwrap().as_array(), vec!["a", "b"]);
    }

    #[test]
    fn test_bare_flag_has_no_value() {
        let config = TokenizerConfig::default();
        let list = ArgumentList::from_tokens(&owned(&["/flag"]), &config);
        assert_eq!(list.get("flag").unwrap().as_string(), None);
        assert_eq!(list.get("flag").unwrap().occurrence_count(), 1);
    }

    #[test]
    fn test_empty_name_after_strip_falls_through_to_unnamed() {
        let config = TokenizerConfig::default();
        let list = ArgumentList::from_tokens(&owned(&["/", "value"]), &config);
        assert_eq!(list.unnamed(), &["/".to_owned(), "value".to_owned()]);
    }
}
