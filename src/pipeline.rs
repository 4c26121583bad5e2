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

//! Splits a macro-expanded line on the top-level (outside any quoted run)
//! `|`, `<`, and `>` characters into pipeline stages plus an optional input
//! and output file, then dispatches each stage in turn, wiring one stage's
//! standard output to the next's standard input.
//!
//! Only standard input and standard output are redirected; standard error
//! always goes to the real process stderr, since nothing in this crate
//! needs to capture it.

use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::stdio::{SharedBuffer, StdIo};
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

/// Splits `line` into top-level (outside any quoted run) operator-delimited
/// parts. `|` always splits a new stage. `<`/`>` only split out a
/// redirection file when their character is present in `redirect_precedence`
/// — when absent, the character loses its special meaning and stays part of
/// whatever stage it falls within. This is the configurable toggle described
/// by `Interpreter::set_redirect_precedence`.
fn split(line: &str, redirect_precedence: &str) -> Vec<(Option<char>, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut op: Option<char> = None;
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            current.push(c);
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            '|' => {
                parts.push((op, std::mem::take(&mut current)));
                op = Some(c);
            }
            '<' | '>' if redirect_precedence.contains(c) => {
                parts.push((op, std::mem::take(&mut current)));
                op = Some(c);
            }
            _ => current.push(c),
        }
    }
    parts.push((op, current));
    parts
}

/// Expand a macro-expanded line into its pipeline stages and any file
/// redirection, then run every stage in order.
pub fn execute(interpreter: &Interpreter, line: &str) -> Result<()> {
    let parts = split(line, &interpreter.redirect_precedence());

    let mut stages = Vec::new();
    let mut input_file = None;
    let mut output_file = None;
    for (op, text) in parts {
        let text = text.trim().to_string();
        match op {
            None | Some('|') => stages.push(text),
            Some('<') => {
                if input_file.is_none() {
                    input_file = Some(text);
                }
            }
            Some('>') => {
                if output_file.is_none() {
                    output_file = Some(text);
                }
            }
            Some(_) => unreachable!("split only ever emits '|', '<', or '>' as an operator"),
        }
    }

    if stages.iter().all(|s| s.is_empty()) {
        return Ok(());
    }

    let base = interpreter.swap_stdio(StdIo::real());
    let result = run_stages(
        interpreter,
        &stages,
        input_file.as_deref(),
        output_file.as_deref(),
        base,
    );
    interpreter.swap_stdio(StdIo::real());
    result
}

fn run_stages(
    interpreter: &Interpreter,
    stages: &[String],
    input_file: Option<&str>,
    output_file: Option<&str>,
    base: StdIo,
) -> Result<()> {
    let StdIo {
        stdin: base_stdin,
        stdout: base_stdout,
        ..
    } = base;
    let mut base_stdin = Some(base_stdin);
    let mut base_stdout = Some(base_stdout);
    let mut carry: Vec<u8> = Vec::new();
    let last = stages.len() - 1;

    for (i, stage) in stages.iter().enumerate() {
        let tokens = crate::token::parse(Some(stage))?;

        let stdin: Box<dyn Read> = if i == 0 {
            match input_file {
                Some(path) => Box::new(File::open(path)?),
                None => base_stdin.take().unwrap(),
            }
        } else {
            Box::new(Cursor::new(std::mem::take(&mut carry)))
        };

        let (stdout, capture): (Box<dyn Write>, Option<Rc<RefCell<Vec<u8>>>>) = if i == last {
            match output_file {
                Some(path) => (Box::new(File::create(path)?), None),
                None => (base_stdout.take().unwrap(), None),
            }
        } else {
            let buf = Rc::new(RefCell::new(Vec::new()));
            (Box::new(SharedBuffer(Rc::clone(&buf))), Some(buf))
        };

        interpreter.swap_stdio(StdIo {
            stdin,
            stdout,
            stderr: Box::new(io::stderr()),
        });
        let outcome = interpreter.dispatch_tokens(&tokens);
        interpreter.swap_stdio(StdIo::real());

        if let Some(buf) = capture {
            carry = Rc::try_unwrap(buf)
                .map(|cell| cell.into_inner())
                .unwrap_or_default();
        }
        outcome?;
    }
    Ok(())
}
