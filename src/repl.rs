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

//! The interactive loop: print a prompt, read a line, execute it, report
//! any error to standard error, and repeat until a command requests exit or
//! input is exhausted.

use crate::interpreter::Interpreter;
use log::error;
use std::io::{self, BufRead, Write};

/// Drive `interpreter` interactively, reading lines from `input` and writing
/// prompts to `output`, until `Interpreter::request_exit` is called or
/// `input` reaches EOF. Returns the process exit code to use.
pub fn run<R: BufRead, W: Write>(interpreter: &Interpreter, mut input: R, mut output: W) -> io::Result<i32> {
    loop {
        if interpreter.exit_requested() {
            break;
        }

        write!(output, "{}", interpreter.prompt())?;
        output.flush()?;

        let mut line = String::new();
        let bytes_read = input.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        let line = if line.trim().is_empty() { "help" } else { line };

        if let Err(e) = interpreter.execute_line(line) {
            error!("{}", e);
            writeln!(output, "{}", e)?;
        }
    }

    Ok(interpreter.exit_code())
}

/// Drive `interpreter` interactively over the real process stdin/stdout.
/// Wires the real keyboard as the `more` pagination key reader, since a
/// real interactive session needs one even though `Interpreter::new` leaves
/// it unset.
pub fn run_on_stdio(interpreter: &Interpreter) -> io::Result<i32> {
    interpreter.set_next_key_reader(crate::term::read_single_key);
    let stdin = io::stdin();
    run(interpreter, stdin.lock(), io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_stops_on_exit_command() {
        let interpreter = Interpreter::new().unwrap();
        let input = io::Cursor::new(b"exit 7\nshould not run\n".to_vec());
        let mut output = Vec::new();
        let code = run(&interpreter, input, &mut output).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn test_run_stops_at_eof() {
        let interpreter = Interpreter::new().unwrap();
        let input = io::Cursor::new(b"".to_vec());
        let mut output = Vec::new();
        let code = run(&interpreter, input, &mut output).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_empty_line_runs_help_instead_of_being_skipped() {
        use crate::stdio::StdIo;

        let interpreter = Interpreter::new().unwrap();
        let (stdio, stdout, _) = StdIo::buffered(Vec::new());
        interpreter.swap_stdio(stdio);

        let input = io::Cursor::new(b"\nexit 0\n".to_vec());
        let mut output = Vec::new();
        let code = run(&interpreter, input, &mut output).unwrap();
        assert_eq!(code, 0);

        let rendered = String::from_utf8(stdout.borrow().clone()).unwrap();
        assert!(rendered.contains("help"));
    }

    #[test]
    fn test_run_reports_unknown_command_and_continues() {
        let interpreter = Interpreter::new().unwrap();
        let input = io::Cursor::new(b"bogus\nexit 0\n".to_vec());
        let mut output = Vec::new();
        let code = run(&interpreter, input, &mut output).unwrap();
        assert_eq!(code, 0);
        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("Invalid command"));
    }
}
