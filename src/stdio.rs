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

//! `StdIo` is an explicit record of the three streams a dispatch should
//! read from and write to. Rather than mutate global `stdin`/`stdout`, a
//! redirection scopes a replacement `StdIo` for the duration of one
//! pipeline stage and restores the previous one on every exit path,
//! including an error return.

use std::io::{self, Read, Write};

/// The standard input stream a dispatch reads from.
pub type Stdin = Box<dyn Read>;
/// A standard output or error stream a dispatch writes to.
pub type Stdout = Box<dyn Write>;

/// A bundle of the three streams available to a running command: standard
/// input, standard output, and standard error. Redirection (`>`, `<`) and
/// pipelines swap these out per stage rather than touching any process-wide
/// state.
pub struct StdIo {
    pub stdin: Stdin,
    pub stdout: Stdout,
    pub stderr: Stdout,
}

impl StdIo {
    /// The real process streams.
    pub fn real() -> StdIo {
        StdIo {
            stdin: Box::new(io::stdin()),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            // Note: io::Stdin/Stdout/Stderr all internally lock per call;
            // for a single-threaded interpreter this is an acceptable cost
            // in exchange for not having to thread lock guards through.
        }
    }

    /// Streams backed entirely by in-memory buffers, useful for tests and
    /// for piping a command's output into another in-process consumer.
    pub fn buffered(input: Vec<u8>) -> (StdIo, std::rc::Rc<std::cell::RefCell<Vec<u8>>>, std::rc::Rc<std::cell::RefCell<Vec<u8>>>) {
        let stdout_buf = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let stderr_buf = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let stdio = StdIo {
            stdin: Box::new(io::Cursor::new(input)),
            stdout: Box::new(SharedBuffer(stdout_buf.clone())),
            stderr: Box::new(SharedBuffer(stderr_buf.clone())),
        };
        (stdio, stdout_buf, stderr_buf)
    }
}

pub(crate) struct SharedBuffer(pub(crate) std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_buffered_stdio_captures_writes() {
        let (mut stdio, stdout_buf, _) = StdIo::buffered(Vec::new());
        write!(stdio.stdout, "hello").unwrap();
        assert_eq!(&*stdout_buf.borrow(), b"hello");
    }

    #[test]
    fn test_buffered_stdio_reads_input() {
        let (mut stdio, _, _) = StdIo::buffered(b"hi there".to_vec());
        let mut s = String::new();
        stdio.stdin.read_to_string(&mut s).unwrap();
        assert_eq!(s, "hi there");
    }
}
