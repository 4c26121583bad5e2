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

//! The `Interpreter` ties the registry, dispatcher, macro expander, and
//! pipeline/redirection layer together into the single object a program
//! constructs, registers handlers on, and feeds lines of input into.
//!
//! It is deliberately `!Sync`: handler state lives behind `Rc<RefCell<_>>`,
//! not `Arc<Mutex<_>>`, because the source's interpreter is a single-threaded,
//! cooperative object and there is no reason to pay for synchronization that
//! nothing in this crate needs.

use crate::builtins::Builtins;
use crate::dispatch;
use crate::error::{Error, Result};
use crate::macros::expand_macros;
use crate::pipeline;
use crate::registry::{BoundCommand, BoundFilter, BoundOption, Handler, Registry};
use crate::stdio::StdIo;
use crate::token::TokenizerConfig;
use log::debug;
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

/// The interactive command interpreter. Construct one with `Interpreter::new`,
/// register application handlers with `add_handler`/`add_handler_type`, then
/// drive it a line at a time with `execute_line` (or hand it to
/// `crate::repl::run`).
pub struct Interpreter {
    config: RefCell<TokenizerConfig>,
    options: RefCell<Vec<BoundOption>>,
    commands: RefCell<Vec<BoundCommand>>,
    filters: RefCell<Vec<BoundFilter>>,
    filter_precedence: RefCell<Vec<String>>,
    redirect_precedence: RefCell<String>,
    stdio: RefCell<StdIo>,
    prompt: RefCell<String>,
    exit_requested: Cell<bool>,
    exit_code: Cell<i32>,
    /// Lowercased names/aliases contributed by the built-in handler. Used
    /// only to let a later user registration silently evict a same-named
    /// built-in rather than collide with it.
    builtin_names: RefCell<HashSet<String>>,
    next_key_reader: RefCell<Option<Box<dyn FnMut() -> std::io::Result<u8>>>>,
}

impl Interpreter {
    /// A new interpreter with every built-in command registered.
    pub fn new() -> Result<Interpreter> {
        Interpreter::with_suppressed_builtins(&[])
    }

    /// A new interpreter with the named built-ins (`"help"`, `"get"`,
    /// `"set"`, `"echo"`, `"more"`, `"find"`, `"prompt"`, `"exit"`) left
    /// unregistered.
    pub fn with_suppressed_builtins(suppressed: &[&str]) -> Result<Interpreter> {
        let interpreter = Interpreter {
            config: RefCell::new(TokenizerConfig::default()),
            options: RefCell::new(Vec::new()),
            commands: RefCell::new(Vec::new()),
            filters: RefCell::new(Vec::new()),
            filter_precedence: RefCell::new(Vec::new()),
            redirect_precedence: RefCell::new("<>".to_owned()),
            stdio: RefCell::new(StdIo::real()),
            prompt: RefCell::new("> ".to_owned()),
            exit_requested: Cell::new(false),
            exit_code: Cell::new(0),
            builtin_names: RefCell::new(HashSet::new()),
            next_key_reader: RefCell::new(None),
        };

        let suppressed: HashSet<&str> = suppressed.iter().copied().collect();
        let registry = crate::builtins::registry(&suppressed);
        interpreter.add_handler(Builtins::default(), registry)?;
        interpreter.mark_registered_as_builtin();
        Ok(interpreter)
    }

    /// Record every currently-registered name/alias as a built-in, so a
    /// later user registration is allowed to override it instead of
    /// colliding with it. Only meant to run once, right after the built-in
    /// handler is registered.
    fn mark_registered_as_builtin(&self) {
        let mut names = self.builtin_names.borrow_mut();
        for o in self.options.borrow().iter() {
            names.insert(o.name.to_lowercase());
            names.extend(o.aliases.iter().map(|a| a.to_lowercase()));
        }
        for c in self.commands.borrow().iter() {
            names.insert(c.name.to_lowercase());
            names.extend(c.aliases.iter().map(|a| a.to_lowercase()));
        }
        for f in self.filters.borrow().iter() {
            names.insert(f.name.to_lowercase());
        }
    }

    /// Register a handler instance plus its builder-described options,
    /// commands, and filters. A name or alias colliding with a built-in
    /// evicts the built-in in favor of this registration; colliding with
    /// another user-registered handler is an error.
    pub fn add_handler<H: Handler>(&self, handler: H, registry: Registry<H>) -> Result<()> {
        let handler = Rc::new(RefCell::new(handler));
        let (mut options, mut commands, mut filters) = registry.bind(handler)?;

        let builtin_names = self.builtin_names.borrow();
        {
            let mut existing = self.options.borrow_mut();
            resolve_collisions(&mut existing, &options, &builtin_names, |o| &o.name, |o| &o.aliases)?;
        }
        {
            let mut existing = self.commands.borrow_mut();
            resolve_collisions(&mut existing, &commands, &builtin_names, |c| &c.name, |c| &c.aliases)?;
        }
        {
            let mut existing = self.filters.borrow_mut();
            resolve_collisions_names(&mut existing, &filters, &builtin_names, |f| &f.name)?;
        }
        drop(builtin_names);

        self.options.borrow_mut().append(&mut options);
        self.commands.borrow_mut().append(&mut commands);
        self.filters.borrow_mut().append(&mut filters);
        Ok(())
    }

    /// Register a `Default`-constructed handler. Stands in for binding a
    /// reflected type's static members only, since Rust has no notion of an
    /// implicit instance the way a reflected method call does.
    pub fn add_handler_type<H: Handler + Default>(&self, registry: Registry<H>) -> Result<()> {
        self.add_handler(H::default(), registry)
    }

    pub(crate) fn tokenizer_config(&self) -> TokenizerConfig {
        self.config.borrow().clone()
    }

    /// Replace the tokenizer configuration (prefix/delimiter characters and
    /// comparer) used for all future parsing and dispatch.
    pub fn set_tokenizer_config(&self, config: TokenizerConfig) {
        *self.config.borrow_mut() = config;
    }

    pub(crate) fn options(&self) -> Ref<'_, Vec<BoundOption>> {
        self.options.borrow()
    }

    pub(crate) fn commands(&self) -> Ref<'_, Vec<BoundCommand>> {
        self.commands.borrow()
    }

    pub(crate) fn filters(&self) -> Ref<'_, Vec<BoundFilter>> {
        self.filters.borrow()
    }

    pub(crate) fn filter_precedence(&self) -> Vec<String> {
        self.filter_precedence.borrow().clone()
    }

    /// Replace the order filters run in. Filters not named here run after
    /// the named ones, in registration order.
    pub fn set_filter_precedence(&self, precedence: Vec<String>) {
        *self.filter_precedence.borrow_mut() = precedence;
    }

    pub(crate) fn redirect_precedence(&self) -> String {
        self.redirect_precedence.borrow().clone()
    }

    /// Controls which of `<`/`>` are recognized as pipeline redirection
    /// operators when a line is split into stages. The default, `"<>"`,
    /// recognizes both anywhere on the line before it is split on `|`.
    /// Removing a character from this string makes that operator lose its
    /// special meaning entirely (it becomes literal text within whichever
    /// stage it falls in), changing how a mixed redirection/pipe line
    /// groups into stages.
    pub fn set_redirect_precedence(&self, precedence: String) {
        *self.redirect_precedence.borrow_mut() = precedence;
    }

    /// The prompt string shown before each line of interactive input.
    pub fn prompt(&self) -> String {
        self.prompt.borrow().clone()
    }

    /// Set the prompt string (the `prompt` built-in's underlying state).
    pub fn set_prompt(&self, prompt: String) {
        *self.prompt.borrow_mut() = prompt;
    }

    /// Replace the streams commands read from and write to, returning the
    /// previous set so a redirection can restore it.
    pub fn swap_stdio(&self, stdio: StdIo) -> StdIo {
        self.stdio.replace(stdio)
    }

    /// Run `f` against the interpreter's currently active streams. Handler
    /// command and filter closures use this to read/write stdin/stdout/
    /// stderr rather than touching the real process streams directly, so
    /// pipelines and redirection can transparently swap them out.
    pub fn with_stdio<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut StdIo) -> R,
    {
        f(&mut self.stdio.borrow_mut())
    }

    /// Request that the REPL loop stop after the current line, with the
    /// given process exit code.
    pub fn request_exit(&self, code: i32) {
        self.exit_requested.set(true);
        self.exit_code.set(code);
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested.get()
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.get()
    }

    /// Install the reader `more` uses to wait for a keypress between pages.
    /// Real interactive use (`crate::repl::run_on_stdio`) wires the real
    /// keyboard here; tests can inject a canned sequence of bytes.
    pub fn set_next_key_reader<F>(&self, reader: F)
    where
        F: FnMut() -> std::io::Result<u8> + 'static,
    {
        *self.next_key_reader.borrow_mut() = Some(Box::new(reader));
    }

    /// Read one key via the configured reader. Fails with
    /// `Error::ConsoleIoUnavailable` if none has been installed.
    pub(crate) fn read_next_key(&self) -> Result<u8> {
        let mut reader = self.next_key_reader.borrow_mut();
        match reader.as_mut() {
            Some(r) => r().map_err(Error::from),
            None => Err(Error::ConsoleIoUnavailable),
        }
    }

    /// Look up an option's value by name, coercing to string as stored.
    pub fn get_option(&self, name: &str) -> Result<String> {
        let config = self.tokenizer_config();
        self.options
            .borrow()
            .iter()
            .find(|o| config.comparer.eq(&o.name, name))
            .map(|o| o.get())
            .ok_or_else(|| Error::UnknownOption {
                name: name.to_owned(),
            })
    }

    /// Expand macros, split on pipelines/redirection, and dispatch every
    /// resulting stage in order. This is the single entry point a REPL loop
    /// or a one-shot invocation should call.
    pub fn execute_line(&self, line: &str) -> Result<()> {
        let expanded = expand_macros(self, line)?;
        debug!("executing: {}", expanded);
        pipeline::execute(self, &expanded)
    }

    /// Run one already-tokenized stage (no macro expansion, no pipeline
    /// splitting). Exposed for pipeline stages and for callers who have
    /// already tokenized their input.
    pub(crate) fn dispatch_tokens(&self, tokens: &[String]) -> Result<()> {
        dispatch::dispatch(self, tokens)
    }
}

/// Check `incoming` against `existing` for name/alias collisions. Any
/// colliding `existing` entry whose own name/alias set is entirely
/// contained in `builtin_names` is removed in favor of `incoming`; any
/// other collision is an error.
fn resolve_collisions<T, N, A>(
    existing: &mut Vec<T>,
    incoming: &[T],
    builtin_names: &HashSet<String>,
    name_of: N,
    aliases_of: A,
) -> Result<()>
where
    N: Fn(&T) -> &String,
    A: Fn(&T) -> &Vec<String>,
{
    for item in incoming {
        let candidates: Vec<String> = std::iter::once(name_of(item).clone())
            .chain(aliases_of(item).iter().cloned())
            .collect();

        let mut colliding = Vec::new();
        for (idx, existing_item) in existing.iter().enumerate() {
            let existing_candidates: Vec<String> = std::iter::once(name_of(existing_item).clone())
                .chain(aliases_of(existing_item).iter().cloned())
                .collect();
            if candidates
                .iter()
                .any(|c| existing_candidates.iter().any(|e| e.eq_ignore_ascii_case(c)))
            {
                colliding.push(idx);
            }
        }

        for &idx in &colliding {
            let existing_item = &existing[idx];
            let existing_candidates: Vec<String> = std::iter::once(name_of(existing_item).clone())
                .chain(aliases_of(existing_item).iter().cloned())
                .collect();
            let is_builtin = existing_candidates
                .iter()
                .any(|c| builtin_names.contains(&c.to_lowercase()));
            if !is_builtin {
                return Err(Error::DuplicateName {
                    name: name_of(item).clone(),
                });
            }
        }

        for &idx in colliding.iter().rev() {
            existing.remove(idx);
        }
    }
    Ok(())
}

fn resolve_collisions_names<T, N>(
    existing: &mut Vec<T>,
    incoming: &[T],
    builtin_names: &HashSet<String>,
    name_of: N,
) -> Result<()>
where
    N: Fn(&T) -> &String,
{
    for item in incoming {
        let name = name_of(item);
        let colliding: Vec<usize> = existing
            .iter()
            .enumerate()
            .filter(|(_, e)| name_of(e).eq_ignore_ascii_case(name))
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &colliding {
            if !builtin_names.contains(&name_of(&existing[idx]).to_lowercase()) {
                return Err(Error::DuplicateName { name: name.clone() });
            }
        }

        for &idx in colliding.iter().rev() {
            existing.remove(idx);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[derive(Default)]
    struct Greeter;

    #[test]
    fn test_user_command_overrides_builtin_of_the_same_name() {
        let interpreter = Interpreter::new().unwrap();
        let registry: Registry<Greeter> = Registry::new().command("help", "overridden", Vec::new(), |_, _, _| Ok(()));
        interpreter.add_handler(Greeter::default(), registry).unwrap();

        let commands = interpreter.commands();
        let matches: Vec<&BoundCommand> = commands.iter().filter(|c| c.name == "help").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].help, "overridden");
    }

    #[test]
    fn test_two_user_handlers_colliding_on_the_same_name_is_an_error() {
        let interpreter = Interpreter::new().unwrap();
        let registry: Registry<Greeter> = Registry::new().command("hello", "first", Vec::new(), |_, _, _| Ok(()));
        interpreter.add_handler(Greeter::default(), registry).unwrap();

        let registry: Registry<Greeter> = Registry::new().command("hello", "second", Vec::new(), |_, _, _| Ok(()));
        assert!(matches!(
            interpreter.add_handler(Greeter::default(), registry),
            Err(Error::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_read_next_key_fails_without_an_installed_reader() {
        let interpreter = Interpreter::new().unwrap();
        assert!(matches!(interpreter.read_next_key(), Err(Error::ConsoleIoUnavailable)));
    }

    #[test]
    fn test_read_next_key_uses_the_installed_reader() {
        let interpreter = Interpreter::new().unwrap();
        interpreter.set_next_key_reader(|| Ok(b'q'));
        assert_eq!(interpreter.read_next_key().unwrap(), b'q');
    }
}
