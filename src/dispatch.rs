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

//! The dispatcher: given one pipeline stage's tokens, resolve top-level
//! options, resolve the command, bind its arguments, thread the result
//! through the registered filter chain, and invoke the command itself.

use crate::arglist::ArgumentList;
use crate::coerce::CommandArgs;
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::registry::BoundFilter;
use std::collections::HashMap;

/// A position in the filter chain for a single dispatch. Each filter calls
/// `next` to continue the chain; once every filter has run, `next` invokes
/// the resolved command itself. This mirrors linked-filter-delegate designs
/// without literally allocating nested closures per call.
pub struct Chain<'a> {
    filters: &'a [&'a BoundFilter],
    index: usize,
    interpreter: &'a Interpreter,
    terminal: &'a dyn Fn(&Interpreter, &[String]) -> Result<()>,
}

impl<'a> Chain<'a> {
    fn new(
        filters: &'a [&'a BoundFilter],
        interpreter: &'a Interpreter,
        terminal: &'a dyn Fn(&Interpreter, &[String]) -> Result<()>,
    ) -> Chain<'a> {
        Chain {
            filters,
            index: 0,
            interpreter,
            terminal,
        }
    }

    /// Continue to the next filter in the chain (or the terminal command, if
    /// this was the last filter), passing along `tokens`.
    pub fn next(&mut self, tokens: &[String]) -> crate::error::HandlerResult {
        if self.index < self.filters.len() {
            let filter = self.filters[self.index];
            self.index += 1;
            let interpreter = self.interpreter;
            filter.invoke(interpreter, tokens, self)
        } else {
            (self.terminal)(self.interpreter, tokens).map_err(crate::error::HandlerError::from)
        }
    }
}

/// Resolve and run one pipeline stage's tokens against `interpreter`.
pub fn dispatch(interpreter: &Interpreter, tokens: &[String]) -> Result<()> {
    let config = interpreter.tokenizer_config();
    let mut tokens = tokens.to_vec();

    // Top-level options are applied before command resolution and may appear
    // anywhere in the stage's tokens.
    apply_top_level_options(interpreter, &mut tokens)?;

    if tokens.is_empty() {
        return Ok(());
    }
    let command_name = tokens.remove(0);

    let precedence = interpreter.filter_precedence();
    let all_filters = interpreter.filters();
    let mut ordered: Vec<&BoundFilter> = Vec::new();
    for name in &precedence {
        if let Some(f) = all_filters.iter().find(|f| config.comparer.eq(&f.name, name)) {
            ordered.push(f);
        }
    }
    for f in &all_filters {
        if !ordered.iter().any(|o| std::ptr::eq(*o, f)) {
            ordered.push(f);
        }
    }

    let terminal = move |interpreter: &Interpreter, tokens: &[String]| -> Result<()> {
        run_command(interpreter, &command_name, tokens)
    };
    let mut chain = Chain::new(&ordered, interpreter, &terminal);
    chain.next(&tokens).map_err(Error::from)
}

fn apply_top_level_options(interpreter: &Interpreter, tokens: &mut Vec<String>) -> Result<()> {
    let config = interpreter.tokenizer_config();
    let options = interpreter.options();
    let mut i = 0;
    while i < tokens.len() {
        let stripped = match config.strip_prefix(&tokens[i]) {
            Some(s) => s,
            None => {
                i += 1;
                continue;
            }
        };
        let (name, value) = config.split_name_value(stripped);
        let matched = options
            .iter()
            .find(|o| config.comparer.eq(&o.name, name) || o.aliases.iter().any(|a| config.comparer.eq(a, name)));
        match matched {
            // `/Name=value` — the value is packed into this one token.
            Some(opt) if value.is_some() => {
                opt.set(value.unwrap())?;
                tokens.remove(i);
            }
            // `/Name value` — the next token is the value, if one follows.
            Some(opt) if i + 1 < tokens.len() => {
                let value = tokens.remove(i + 1);
                opt.set(&value)?;
                tokens.remove(i);
            }
            Some(opt) => {
                opt.set("")?;
                tokens.remove(i);
            }
            None => i += 1,
        }
    }
    Ok(())
}

fn run_command(interpreter: &Interpreter, name: &str, tokens: &[String]) -> Result<()> {
    let config = interpreter.tokenizer_config();
    let commands = interpreter.commands();
    let command = commands
        .iter()
        .find(|c| config.comparer.eq(&c.name, name) || c.aliases.iter().any(|a| config.comparer.eq(a, name)))
        .ok_or_else(|| Error::UnknownCommand {
            name: name.to_owned(),
        })?;

    let list = ArgumentList::from_tokens(tokens, &config);
    let mut resolved: HashMap<String, Vec<Option<String>>> = HashMap::new();
    let mut consumed_positions: Vec<bool> = vec![false; list.unnamed().len()];

    let mut specs = command.arguments.clone();
    specs.sort_by_key(|a| a.position);

    for spec in &specs {
        if spec.captures_all {
            continue;
        }
        let mut candidates = vec![spec.name.clone()];
        candidates.extend(spec.aliases.iter().cloned());

        let mut found = None;
        for candidate in &candidates {
            if let Some(item) = list.get(candidate) {
                found = Some(item.clone_values());
                break;
            }
        }
        if found.is_none() {
            if let Some(slot) = consumed_positions.iter().position(|c| !c) {
                consumed_positions[slot] = true;
                found = Some(vec![Some(list.unnamed()[slot].clone())]);
            }
        }
        if let Some(values) = found {
            resolved.insert(spec.name.clone(), values);
        }
    }

    let args = CommandArgs::new(specs, resolved, tokens.to_vec());
    command.invoke(interpreter, &args).map_err(Error::from)
}
