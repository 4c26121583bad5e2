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

//! Rust has no runtime reflection over arbitrary types, so there is no
//! equivalent of scanning a handler instance's methods for attributes. This
//! module is the registration builder DSL that stands in for it: a handler
//! type builds a `Registry<H>` describing its options, commands, and
//! filters, and `Registry::bind` closes each registration over a shared,
//! reference-counted handler instance to produce type-erased `Bound*`
//! records the `Interpreter` can store uniformly alongside every other
//! handler's.

use crate::coerce::CommandArgs;
use crate::dispatch::Chain;
use crate::error::{Error, HandlerResult, Result};
use crate::interpreter::Interpreter;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Any `'static` type can be registered as a handler. There is nothing to
/// implement; this trait exists purely to name the bound `Registry<H>`
/// requires.
pub trait Handler: 'static {}
impl<T: 'static> Handler for T {}

/// Declares one formal parameter of a command: its name, aliases used to
/// bind it by name, help text, optional default (absence means required),
/// and whether it instead captures every raw token verbatim.
#[derive(Clone, Debug)]
pub struct ArgumentSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub default: Option<Vec<String>>,
    pub visible: bool,
    pub position: usize,
    pub captures_all: bool,
}

impl ArgumentSpec {
    /// A required, positionally-or-by-name bound argument.
    pub fn required(name: &str, help: &str, position: usize) -> ArgumentSpec {
        ArgumentSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: help.to_owned(),
            default: None,
            visible: true,
            position,
            captures_all: false,
        }
    }

    /// An optional argument with a default value used when unbound.
    pub fn optional(name: &str, help: &str, position: usize, default: &str) -> ArgumentSpec {
        ArgumentSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: help.to_owned(),
            default: Some(vec![default.to_owned()]),
            visible: true,
            position,
            captures_all: false,
        }
    }

    /// An optional array argument, accumulating every occurrence.
    pub fn array(name: &str, help: &str, position: usize) -> ArgumentSpec {
        ArgumentSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: help.to_owned(),
            default: Some(Vec::new()),
            visible: true,
            position,
            captures_all: false,
        }
    }

    /// A parameter which captures every raw token the command was invoked
    /// with, rather than being bound to a single name or position.
    pub fn captures_all(name: &str, help: &str) -> ArgumentSpec {
        ArgumentSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: help.to_owned(),
            default: Some(Vec::new()),
            visible: true,
            position: 0,
            captures_all: true,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> ArgumentSpec {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn hidden(mut self) -> ArgumentSpec {
        self.visible = false;
        self
    }
}

struct OptionSpec<H> {
    name: String,
    aliases: Vec<String>,
    help: String,
    default: String,
    get: Box<dyn Fn(&H) -> String>,
    set: Box<dyn Fn(&mut H, &str) -> Result<()>>,
}

struct CommandSpec<H> {
    name: String,
    aliases: Vec<String>,
    help: String,
    category: Option<String>,
    visible: bool,
    arguments: Vec<ArgumentSpec>,
    invoke: Box<dyn Fn(&mut H, &Interpreter, &CommandArgs) -> HandlerResult>,
}

struct FilterSpec<H> {
    name: String,
    help: String,
    invoke: Box<dyn Fn(&mut H, &Interpreter, &[String], &mut Chain<'_>) -> HandlerResult>,
}

/// An erased, invocable option: a single named piece of persistent state on
/// some handler, readable and writable as a string.
pub struct BoundOption {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub default: String,
    get: Box<dyn Fn() -> String>,
    set: Box<dyn Fn(&str) -> Result<()>>,
}

impl BoundOption {
    pub fn get(&self) -> String {
        (self.get)()
    }

    pub fn set(&self, value: &str) -> Result<()> {
        (self.set)(value)
    }
}

/// An erased, invocable command.
pub struct BoundCommand {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub category: Option<String>,
    pub visible: bool,
    pub arguments: Vec<ArgumentSpec>,
    invoke: Box<dyn Fn(&Interpreter, &CommandArgs) -> HandlerResult>,
}

impl BoundCommand {
    pub fn invoke(&self, interpreter: &Interpreter, args: &CommandArgs) -> HandlerResult {
        (self.invoke)(interpreter, args)
    }
}

/// An erased, invocable pipeline filter.
pub struct BoundFilter {
    pub name: String,
    pub help: String,
    invoke: Box<dyn Fn(&Interpreter, &[String], &mut Chain<'_>) -> HandlerResult>,
}

impl BoundFilter {
    pub fn invoke(&self, interpreter: &Interpreter, tokens: &[String], chain: &mut Chain<'_>) -> HandlerResult {
        (self.invoke)(interpreter, tokens, chain)
    }
}

/// A builder collecting the options, commands, and filters exposed by a
/// single handler type `H`. Call `Registry::new`, chain `option`/`command`/
/// `filter` registrations, then hand the finished registry plus a shared
/// handler instance to `Interpreter::add_handler`.
pub struct Registry<H: Handler> {
    options: Vec<OptionSpec<H>>,
    commands: Vec<CommandSpec<H>>,
    filters: Vec<FilterSpec<H>>,
}

impl<H: Handler> Default for Registry<H> {
    fn default() -> Self {
        Registry {
            options: Vec::new(),
            commands: Vec::new(),
            filters: Vec::new(),
        }
    }
}

impl<H: Handler> Registry<H> {
    pub fn new() -> Registry<H> {
        Registry::default()
    }

    /// Register a named, gettable/settable piece of handler state.
    pub fn option(
        mut self,
        name: &str,
        help: &str,
        default: &str,
        get: impl Fn(&H) -> String + 'static,
        set: impl Fn(&mut H, &str) -> Result<()> + 'static,
    ) -> Self {
        self.options.push(OptionSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: help.to_owned(),
            default: default.to_owned(),
            get: Box::new(get),
            set: Box::new(set),
        });
        self
    }

    /// Add an alias to the most recently registered option.
    pub fn option_alias(mut self, alias: &str) -> Self {
        if let Some(last) = self.options.last_mut() {
            last.aliases.push(alias.to_owned());
        }
        self
    }

    /// Register a command: a name, its formal arguments (in declaration
    /// order, which is also binding precedence for positional values), and
    /// the closure invoked once arguments are resolved.
    pub fn command(
        mut self,
        name: &str,
        help: &str,
        arguments: Vec<ArgumentSpec>,
        invoke: impl Fn(&mut H, &Interpreter, &CommandArgs) -> HandlerResult + 'static,
    ) -> Self {
        self.commands.push(CommandSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            help: help.to_owned(),
            category: None,
            visible: true,
            arguments,
            invoke: Box::new(invoke),
        });
        self
    }

    /// Add an alias to the most recently registered command.
    pub fn command_alias(mut self, alias: &str) -> Self {
        if let Some(last) = self.commands.last_mut() {
            last.aliases.push(alias.to_owned());
        }
        self
    }

    /// Place the most recently registered command under a help category.
    pub fn command_category(mut self, category: &str) -> Self {
        if let Some(last) = self.commands.last_mut() {
            last.category = Some(category.to_owned());
        }
        self
    }

    /// Hide the most recently registered command from generated help text.
    pub fn command_hidden(mut self) -> Self {
        if let Some(last) = self.commands.last_mut() {
            last.visible = false;
        }
        self
    }

    /// Register a pipeline filter. The closure's signature — taking a
    /// `&mut Chain` in place of a `&CommandArgs` — is what distinguishes a
    /// filter registration from a command registration; there is no
    /// separate marker type.
    pub fn filter(
        mut self,
        name: &str,
        help: &str,
        invoke: impl Fn(&mut H, &Interpreter, &[String], &mut Chain<'_>) -> HandlerResult + 'static,
    ) -> Self {
        self.filters.push(FilterSpec {
            name: name.to_owned(),
            help: help.to_owned(),
            invoke: Box::new(invoke),
        });
        self
    }

    /// Close every registration over `handler`, producing the type-erased
    /// records an `Interpreter` stores. Fails if two options, two commands,
    /// or two filters in this single registry share a name or alias.
    pub(crate) fn bind(
        self,
        handler: Rc<RefCell<H>>,
    ) -> Result<(Vec<BoundOption>, Vec<BoundCommand>, Vec<BoundFilter>)> {
        check_unique(self.options.iter().map(|o| (&o.name, &o.aliases)))?;
        check_unique(self.commands.iter().map(|c| (&c.name, &c.aliases)))?;
        check_unique(self.filters.iter().map(|f| (&f.name, &NO_ALIASES)))?;

        let options = self
            .options
            .into_iter()
            .map(|spec| {
                let get_handler = Rc::clone(&handler);
                let set_handler = Rc::clone(&handler);
                let get_fn = spec.get;
                let set_fn = spec.set;
                BoundOption {
                    name: spec.name,
                    aliases: spec.aliases,
                    help: spec.help,
                    default: spec.default,
                    get: Box::new(move || get_fn(&get_handler.borrow())),
                    set: Box::new(move |value: &str| set_fn(&mut set_handler.borrow_mut(), value)),
                }
            })
            .collect();

        let commands = self
            .commands
            .into_iter()
            .map(|spec| {
                let handler = Rc::clone(&handler);
                let invoke_fn = spec.invoke;
                BoundCommand {
                    name: spec.name,
                    aliases: spec.aliases,
                    help: spec.help,
                    category: spec.category,
                    visible: spec.visible,
                    arguments: spec.arguments,
                    invoke: Box::new(move |interpreter: &Interpreter, args: &CommandArgs| {
                        invoke_fn(&mut handler.borrow_mut(), interpreter, args)
                    }),
                }
            })
            .collect();

        let filters = self
            .filters
            .into_iter()
            .map(|spec| {
                let handler = Rc::clone(&handler);
                let invoke_fn = spec.invoke;
                BoundFilter {
                    name: spec.name,
                    help: spec.help,
                    invoke: Box::new(
                        move |interpreter: &Interpreter, tokens: &[String], chain: &mut Chain<'_>| {
                            invoke_fn(&mut handler.borrow_mut(), interpreter, tokens, chain)
                        },
                    ),
                }
            })
            .collect();

        Ok((options, commands, filters))
    }
}

const NO_ALIASES: Vec<String> = Vec::new();

fn check_unique<'a, I>(entries: I) -> Result<()>
where
    I: Iterator<Item = (&'a String, &'a Vec<String>)>,
{
    let mut seen: HashSet<String> = HashSet::new();
    for (name, aliases) in entries {
        for candidate in std::iter::once(name).chain(aliases.iter()) {
            let key = candidate.to_lowercase();
            if !seen.insert(key) {
                return Err(Error::DuplicateName {
                    name: candidate.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        count: i64,
    }

    #[test]
    fn test_bind_wires_option_get_set_through_shared_state() {
        let registry: Registry<Counter> = Registry::new().option(
            "count",
            "the current count",
            "0",
            |h: &Counter| h.count.to_string(),
            |h: &mut Counter, v: &str| {
                h.count = v.parse().map_err(|_| Error::InvalidArgumentValue {
                    name: "count".to_owned(),
                    value: v.to_owned(),
                })?;
                Ok(())
            },
        );
        let handler = Rc::new(RefCell::new(Counter::default()));
        let (options, _, _) = registry.bind(Rc::clone(&handler)).unwrap();
        assert_eq!(options[0].get(), "0");
        options[0].set("5").unwrap();
        assert_eq!(handler.borrow().count, 5);
        assert_eq!(options[0].get(), "5");
    }

    #[test]
    fn test_bind_rejects_duplicate_command_names() {
        let registry: Registry<Counter> = Registry::new()
            .command("go", "", Vec::new(), |_, _, _| Ok(()))
            .command("go", "", Vec::new(), |_, _, _| Ok(()));
        let handler = Rc::new(RefCell::new(Counter::default()));
        assert!(matches!(
            registry.bind(handler),
            Err(Error::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_bind_rejects_alias_colliding_with_another_names_alias() {
        let registry: Registry<Counter> = Registry::new()
            .command("go", "", Vec::new(), |_, _, _| Ok(()))
            .command_alias("run")
            .command("start", "", Vec::new(), |_, _, _| Ok(()))
            .command_alias("run");
        let handler = Rc::new(RefCell::new(Counter::default()));
        assert!(matches!(
            registry.bind(handler),
            Err(Error::DuplicateName { .. })
        ));
    }
}
