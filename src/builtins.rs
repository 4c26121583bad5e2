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

//! The built-in commands every `Interpreter` registers unless suppressed:
//! `help`, `get`/`set` (option inspection), `echo`, `more` and `find`
//! (stdin-driven pagination and filtering), `prompt`, and `exit`.

use crate::error::{Error, HandlerError, HandlerResult};
use crate::interpreter::Interpreter;
use crate::registry::{ArgumentSpec, BoundCommand, Registry};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// The handler type backing every built-in command. It carries no state of
/// its own; all state it touches (options, the prompt, stdio) lives on the
/// `Interpreter` it's given at invocation time.
#[derive(Default)]
pub struct Builtins;

/// Default number of lines `more` shows before pausing for a keypress.
const PAGE_SIZE: usize = 24;

pub(crate) fn registry(suppressed: &HashSet<&str>) -> Registry<Builtins> {
    let mut registry = Registry::new();
    if !suppressed.contains("help") {
        registry = registry.command(
            "help",
            "List registered commands, or describe one in detail.",
            vec![
                ArgumentSpec::optional("command", "a command name to describe", 0, ""),
                ArgumentSpec::optional("html", "render as HTML instead of plain text", 1, "false"),
            ],
            help,
        );
    }
    if !suppressed.contains("get") {
        registry = registry.command(
            "get",
            "Print the current value of an option.",
            vec![ArgumentSpec::required("name", "the option name", 0)],
            get,
        );
    }
    if !suppressed.contains("set") {
        registry = registry.command(
            "set",
            "List options, print one's value, assign it, or /readInput a batch of name=value lines.",
            vec![
                ArgumentSpec::optional("name", "the option name", 0, ""),
                ArgumentSpec::optional("value", "the new value", 1, ""),
                ArgumentSpec::optional(
                    "readInput",
                    "read name=value lines from standard input and apply each",
                    2,
                    "false",
                ),
            ],
            set,
        );
    }
    if !suppressed.contains("echo") {
        registry = registry.command(
            "echo",
            "Write the given text to standard output.",
            vec![ArgumentSpec::captures_all("text", "the text to print")],
            echo,
        );
    }
    if !suppressed.contains("more") {
        registry = registry.command(
            "more",
            "Page standard input, pausing every few lines for a keypress.",
            Vec::new(),
            more,
        );
    }
    if !suppressed.contains("find") {
        registry = registry.command(
            "find",
            "Write lines containing a substring, from standard input or a file.",
            vec![
                ArgumentSpec::required("pattern", "a substring to search for", 0),
                ArgumentSpec::optional("V", "invert the match: write lines that don't contain it", 1, "false"),
                ArgumentSpec::optional("I", "match case-insensitively", 2, "false"),
                ArgumentSpec::optional("f", "read from this file instead of standard input", 3, ""),
            ],
            find,
        );
    }
    if !suppressed.contains("prompt") {
        registry = registry.command(
            "prompt",
            "Change the text shown before each line of input.",
            vec![ArgumentSpec::captures_all("text", "the new prompt text")],
            set_prompt,
        );
    }
    if !suppressed.contains("exit") {
        registry = registry.command(
            "exit",
            "Stop reading input and return the given exit code (default 0).",
            vec![ArgumentSpec::optional("code", "the process exit code", 0, "0")],
            exit,
        );
    }
    registry
}

fn help(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    let requested = args.opt_string("command")?.filter(|s| !s.is_empty());
    let html = args.bool("html")?;
    interpreter.with_stdio(|stdio| -> HandlerResult {
        let commands = interpreter.commands();
        let selected: Vec<&BoundCommand> = match &requested {
            Some(name) => {
                let found = commands
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| Error::UnknownCommand { name: name.clone() })?;
                vec![found]
            }
            None => {
                let mut visible: Vec<&BoundCommand> = commands.iter().filter(|c| c.visible).collect();
                visible.sort_by(|a, b| a.name.cmp(&b.name));
                visible
            }
        };

        if html {
            write!(stdio.stdout, "{}", render_help_html(&selected))?;
        } else if requested.is_some() {
            for command in &selected {
                writeln!(stdio.stdout, "{}", command.name)?;
                writeln!(stdio.stdout, "  {}", command.help)?;
                for arg in &command.arguments {
                    if arg.visible {
                        writeln!(stdio.stdout, "    {} - {}", arg.name, arg.help)?;
                    }
                }
            }
        } else {
            for command in &selected {
                writeln!(stdio.stdout, "{:<16} {}", command.name, command.help)?;
            }
        }
        Ok(())
    })
}

/// Content-only HTML: an `<html>` root with one section per command, its
/// name upper-cased. No styling or script is emitted.
fn render_help_html(commands: &[&BoundCommand]) -> String {
    let mut out = String::from("<html>\n");
    for command in commands {
        out.push_str("<section>\n");
        out.push_str(&format!("<h2>{}</h2>\n", command.name.to_uppercase()));
        out.push_str(&format!("<p>{}</p>\n", command.help));
        let visible_args: Vec<&ArgumentSpec> = command.arguments.iter().filter(|a| a.visible).collect();
        if !visible_args.is_empty() {
            out.push_str("<ul>\n");
            for arg in visible_args {
                out.push_str(&format!("<li>{} - {}</li>\n", arg.name, arg.help));
            }
            out.push_str("</ul>\n");
        }
        out.push_str("</section>\n");
    }
    out.push_str("</html>\n");
    out
}

fn get(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    let name = args.string("name")?;
    let value = interpreter.get_option(&name)?;
    interpreter.with_stdio(|stdio| writeln!(stdio.stdout, "{}", value))?;
    Ok(())
}

fn set(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    if args.bool("readInput")? {
        return set_read_input(interpreter);
    }

    let name = args.opt_string("name")?.filter(|s| !s.is_empty());
    let value = args.opt_string("value")?.filter(|s| !s.is_empty());

    match name {
        None => set_list_all(interpreter),
        Some(name) => match value {
            None => {
                let current = interpreter.get_option(&name)?;
                interpreter.with_stdio(|stdio| writeln!(stdio.stdout, "{}", current))?;
                Ok(())
            }
            Some(value) => {
                let config = interpreter.tokenizer_config();
                let options = interpreter.options();
                let option = options
                    .iter()
                    .find(|o| config.comparer.eq(&o.name, &name))
                    .ok_or_else(|| Error::UnknownOption { name: name.clone() })?;
                option.set(&value)?;
                Ok(())
            }
        },
    }
}

fn set_list_all(interpreter: &Interpreter) -> HandlerResult {
    interpreter.with_stdio(|stdio| -> HandlerResult {
        let options = interpreter.options();
        let mut names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
        names.sort_unstable();
        for name in names {
            let option = options.iter().find(|o| o.name == name).unwrap();
            writeln!(stdio.stdout, "{:<16} {}", option.name, option.get())?;
        }
        Ok(())
    })
}

fn set_read_input(interpreter: &Interpreter) -> HandlerResult {
    let config = interpreter.tokenizer_config();
    let lines: Vec<String> = interpreter.with_stdio(|stdio| -> std::io::Result<Vec<String>> {
        std::io::BufReader::new(&mut stdio.stdin).lines().collect()
    })?;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (name, value) = config.split_name_value(&line);
        let options = interpreter.options();
        let option = options
            .iter()
            .find(|o| config.comparer.eq(&o.name, name))
            .ok_or_else(|| Error::UnknownOption { name: name.to_owned() })?;
        option.set(value.unwrap_or(""))?;
    }
    Ok(())
}

fn echo(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    let text = crate::token::join(args.all_arguments());
    interpreter.with_stdio(|stdio| writeln!(stdio.stdout, "{}", text))?;
    Ok(())
}

fn more(_h: &mut Builtins, interpreter: &Interpreter, _args: &crate::coerce::CommandArgs) -> HandlerResult {
    interpreter.with_stdio(|stdio| -> HandlerResult {
        let lines: Vec<String> = {
            let reader = std::io::BufReader::new(&mut stdio.stdin);
            reader
                .lines()
                .collect::<std::io::Result<Vec<String>>>()
                .map_err(HandlerError::from)?
        };

        let interactive = crate::term::stdout_is_terminal();
        for (i, chunk) in lines.chunks(PAGE_SIZE).enumerate() {
            for line in chunk {
                writeln!(stdio.stdout, "{}", line)?;
            }
            let is_last = (i + 1) * PAGE_SIZE >= lines.len();
            if !is_last && interactive {
                write!(stdio.stdout, "-- More --")?;
                stdio.stdout.flush()?;
                interpreter.read_next_key()?;
                writeln!(stdio.stdout)?;
            }
        }
        Ok(())
    })
}

fn find(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    let pattern = args.string("pattern")?;
    let invert = args.bool("V")?;
    let ignore_case = args.bool("I")?;
    let file = args.opt_string("f")?.filter(|s| !s.is_empty());

    let needle = if ignore_case { pattern.to_lowercase() } else { pattern };

    interpreter.with_stdio(|stdio| -> HandlerResult {
        let lines: Vec<String> = match &file {
            Some(path) => {
                let f = std::fs::File::open(path)?;
                std::io::BufReader::new(f).lines().collect::<std::io::Result<Vec<String>>>()?
            }
            None => std::io::BufReader::new(&mut stdio.stdin)
                .lines()
                .collect::<std::io::Result<Vec<String>>>()?,
        };

        for line in lines {
            let haystack = if ignore_case { line.to_lowercase() } else { line.clone() };
            if haystack.contains(&needle) != invert {
                writeln!(stdio.stdout, "{}", line)?;
            }
        }
        Ok(())
    })
}

fn set_prompt(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    let text = args.all_arguments().join(" ");
    interpreter.set_prompt(text);
    Ok(())
}

fn exit(_h: &mut Builtins, interpreter: &Interpreter, args: &crate::coerce::CommandArgs) -> HandlerResult {
    let code = args.i64("code")?;
    interpreter.request_exit(code as i32);
    Ok(())
}
