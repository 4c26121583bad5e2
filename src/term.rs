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

//! Small terminal helpers used by the `more` built-in: whether stdout is a
//! real terminal (so pagination prompts make sense at all), and reading a
//! single keypress without waiting for Enter.

/// Returns true if standard output is attached to an interactive terminal.
/// When it isn't (output is redirected to a file or into a pipe), `more`
/// should just dump every line rather than pausing for input nobody can see.
pub fn stdout_is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}

#[cfg(unix)]
mod unix {
    use std::io::{self, Read};
    use std::mem;
    use std::os::unix::io::AsRawFd;

    /// Read a single byte from stdin with canonical mode and echo disabled,
    /// so the caller doesn't have to wait for the user to press Enter.
    /// Restores the previous terminal settings before returning, on every
    /// path.
    pub fn read_single_key() -> io::Result<u8> {
        let stdin = io::stdin();
        let fd = stdin.as_raw_fd();

        let mut original: libc::termios = unsafe { mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut original) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut raw = original;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut buf = [0u8; 1];
        let result = stdin.lock().read_exact(&mut buf);

        unsafe {
            libc::tcsetattr(fd, libc::TCSANOW, &original);
        }

        result.map(|_| buf[0])
    }
}

#[cfg(unix)]
pub use unix::read_single_key;

/// Non-Unix fallback: just reads (and discards) a full line, requiring
/// Enter. Kept separate so platform-specific raw-mode code stays isolated.
#[cfg(not(unix))]
pub fn read_single_key() -> std::io::Result<u8> {
    use std::io::Read;
    let mut buf = [0u8; 1];
    std::io::stdin().read_exact(&mut buf)?;
    Ok(buf[0])
}
