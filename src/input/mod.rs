//! Single-key local commands.

use std::collections::VecDeque;
use std::io;

const KEY_ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand{
    Exit,
    Recenter,
}

impl LocalCommand{
    pub fn from_key(key: u8) -> Option<Self>{
        match key{
            KEY_ESC | b'q' => Some(LocalCommand::Exit),
            b'c' => Some(LocalCommand::Recenter),
            _ => None,
        }
    }
}

/// Non-blocking source of local commands, polled once per cycle.
pub trait CommandSource{
    fn poll_command(&mut self) -> Option<LocalCommand>;
}

/// No local input (stdin is not a terminal, or input disabled).
pub struct NoInput;

impl CommandSource for NoInput{
    fn poll_command(&mut self) -> Option<LocalCommand>{
        None
    }
}

/// Pre-recorded commands, one per poll. `None` entries are idle polls.
#[derive(Debug, Default)]
pub struct ScriptedCommands{
    script: VecDeque<Option<LocalCommand>>,
}

impl ScriptedCommands{
    pub fn new(script: impl IntoIterator<Item = Option<LocalCommand>>) -> Self{
        ScriptedCommands{
            script: script.into_iter().collect(),
        }
    }
}

impl CommandSource for ScriptedCommands{
    fn poll_command(&mut self) -> Option<LocalCommand>{
        self.script.pop_front().flatten()
    }
}

/// Controlling terminal in non-canonical, no-echo mode. The previous
/// terminal settings are restored on drop.
pub struct TerminalInput{
    fd: libc::c_int,
    saved: libc::termios,
}

impl TerminalInput{
    pub fn new() -> io::Result<Self>{
        let fd = libc::STDIN_FILENO;
        unsafe{
            if libc::isatty(fd) != 1{
                return Err(io::Error::new(io::ErrorKind::Other, "stdin is not a terminal"));
            }

            let mut saved: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut saved) != 0{
                return Err(io::Error::last_os_error());
            }

            let mut raw = saved;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);
            raw.c_cc[libc::VMIN] = 0;
            raw.c_cc[libc::VTIME] = 0;
            if libc::tcsetattr(fd, libc::TCSANOW, &raw) != 0{
                return Err(io::Error::last_os_error());
            }

            Ok(TerminalInput { fd, saved })
        }
    }

    fn read_key(&mut self) -> Option<u8>{
        let mut pfd = libc::pollfd{
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let mut key = 0u8;
        unsafe{
            //zero timeout: never block the cycle
            if libc::poll(&mut pfd, 1, 0) <= 0 || pfd.revents & libc::POLLIN == 0{
                return None;
            }
            let n = libc::read(self.fd, &mut key as *mut u8 as *mut libc::c_void, 1);
            if n != 1{
                return None;
            }
        }
        Some(key)
    }
}

impl CommandSource for TerminalInput{
    fn poll_command(&mut self) -> Option<LocalCommand>{
        while let Some(key) = self.read_key(){
            if let Some(command) = LocalCommand::from_key(key){
                return Some(command);
            }
        }
        None
    }
}

impl Drop for TerminalInput{
    fn drop(&mut self){
        unsafe{
            libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(LocalCommand::from_key(0x1b), Some(LocalCommand::Exit));
        assert_eq!(LocalCommand::from_key(b'q'), Some(LocalCommand::Exit));
        assert_eq!(LocalCommand::from_key(b'c'), Some(LocalCommand::Recenter));
        assert_eq!(LocalCommand::from_key(b'x'), None);
        assert_eq!(LocalCommand::from_key(b'C'), None);
    }

    #[test]
    fn test_scripted_commands_drain_in_order() {
        let mut source = ScriptedCommands::new([None, Some(LocalCommand::Recenter), Some(LocalCommand::Exit)]);
        assert_eq!(source.poll_command(), None);
        assert_eq!(source.poll_command(), Some(LocalCommand::Recenter));
        assert_eq!(source.poll_command(), Some(LocalCommand::Exit));
        assert_eq!(source.poll_command(), None);
    }
}
