//! Raw terminal bytes to dashboard commands.

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;

/// Logical navigation command decoded from a keystroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Jump inside the current block of ten pages
    Digit(u8),
    First,
    Last,
    Next,
    Prev,
    Next10,
    Prev10,
    Quit,
    None,
}

/// Decode one read from the terminal.
///
/// Arrow keys arrive as `ESC [ <dir>`: right/left step one page, up/down
/// step ten. Single bytes cover digits, `,` (first), `.` (last) and `q`.
pub fn decode(raw: &[u8]) -> Command {
    match raw {
        [ESC, b'[', dir] => match *dir {
            b'C' => Command::Next,
            b'D' => Command::Prev,
            b'A' => Command::Next10,
            b'B' => Command::Prev10,
            _ => Command::None,
        },
        [byte] => match *byte {
            b'0'..=b'9' => Command::Digit(byte - b'0'),
            b',' => Command::First,
            b'.' => Command::Last,
            // Raw mode delivers Ctrl-C as a byte rather than SIGINT
            b'q' | CTRL_C => Command::Quit,
            _ => Command::None,
        },
        _ => Command::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrows() {
        assert_eq!(decode(b"\x1b[C"), Command::Next);
        assert_eq!(decode(b"\x1b[D"), Command::Prev);
        assert_eq!(decode(b"\x1b[A"), Command::Next10);
        assert_eq!(decode(b"\x1b[B"), Command::Prev10);
        assert_eq!(decode(b"\x1b[Z"), Command::None);
        assert_eq!(decode(b"\x1bOC"), Command::None);
    }

    #[test]
    fn test_literal_keys() {
        assert_eq!(decode(b"0"), Command::Digit(0));
        assert_eq!(decode(b"7"), Command::Digit(7));
        assert_eq!(decode(b","), Command::First);
        assert_eq!(decode(b"."), Command::Last);
        assert_eq!(decode(b"q"), Command::Quit);
        assert_eq!(decode(&[0x03]), Command::Quit);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(decode(b""), Command::None);
        assert_eq!(decode(b"x"), Command::None);
        assert_eq!(decode(b"Q"), Command::None);
        assert_eq!(decode(b"12"), Command::None);
        assert_eq!(decode(b"abcd"), Command::None);
    }
}
