//! Terminal setup and teardown for the dashboard.

use crate::error::{Error, Result};
use crossterm::{
    cursor::{Hide, RestorePosition, Show},
    execute, queue,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;

/// Source of keystrokes for the dashboard loop.
pub trait InputSource {
    /// Whatever bytes are available right now, possibly none. Never blocks.
    fn read_available(&mut self) -> io::Result<Vec<u8>>;
}

/// Reads stdin, which [`TerminalSession`] has switched to non-blocking.
pub struct StdinInput;

impl InputSource for StdinInput {
    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        // An arrow key is three bytes; anything longer is not a keystroke we know
        let mut buf = [0u8; 3];
        match io::stdin().lock().read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

/// Exclusive hold on the terminal for the dashboard's lifetime.
///
/// Entering hides the cursor, switches to raw mode and makes stdin
/// non-blocking. [`TerminalSession::restore`] undoes all of it and is safe
/// to call more than once; `Drop` calls it as a last resort so error and
/// unwind paths leave a usable terminal.
pub struct TerminalSession {
    original_stdin_flags: Option<OFlag>,
    active: bool,
    position_saved: bool,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        let mut session = TerminalSession {
            original_stdin_flags: None,
            active: true,
            position_saved: false,
        };

        execute!(io::stdout(), Hide)?;
        enable_raw_mode()
            .map_err(|e| Error::Terminal(format!("Failed to enable raw mode: {}", e)))?;

        let fd = io::stdin().as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL)
            .map(OFlag::from_bits_truncate)
            .map_err(|e| Error::Terminal(format!("Failed to read stdin flags: {}", e)))?;
        fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))
            .map_err(|e| Error::Terminal(format!("Failed to make stdin non-blocking: {}", e)))?;
        session.original_stdin_flags = Some(flags);

        Ok(session)
    }

    /// Record that a frame has saved the cursor position, so restoring
    /// returns below the last frame instead of to the home position.
    pub fn mark_position_saved(&mut self) {
        self.position_saved = true;
    }

    /// Put the terminal back the way it was. Errors are ignored: there is
    /// nothing useful left to do with them on the way out.
    pub fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(flags) = self.original_stdin_flags.take() {
            let _ = fcntl(io::stdin().as_raw_fd(), FcntlArg::F_SETFL(flags));
        }
        let _ = disable_raw_mode();

        let _ = write_restore(&mut io::stdout(), self.position_saved);
    }
}

fn write_restore<W: Write>(out: &mut W, position_saved: bool) -> io::Result<()> {
    if position_saved {
        queue!(out, RestorePosition)?;
    }
    queue!(out, Show)?;
    writeln!(out)?;
    out.flush()
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_frame_keeps_cursor_in_place() {
        let mut out = Vec::new();
        write_restore(&mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("\x1b8"));
        assert!(text.contains("\x1b[?25h"));
    }

    #[test]
    fn test_restore_after_frame_returns_below_it() {
        let mut out = Vec::new();
        write_restore(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b8\x1b[?25h"));
        assert!(text.ends_with('\n'));
    }
}
