//! Switching the controlling terminal between cooked and raw input.

use crate::error::{ShellError, ShellResult};
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use std::os::fd::AsFd;
use tracing::{debug, warn};

/// Scoped raw mode on a terminal descriptor.
///
/// Entering captures the current attributes and turns off canonical buffering,
/// echo and signal generation. The captured attributes are reapplied by
/// [`RawMode::restore`] or, on any other exit path, when the guard is dropped.
pub struct RawMode<F: AsFd> {
    fd: F,
    original: Option<Termios>,
}

impl<F: AsFd> RawMode<F> {
    pub fn enter(fd: F) -> ShellResult<Self> {
        let original = termios::tcgetattr(&fd).map_err(ShellError::TerminalModeFailure)?;

        let mut raw = original.clone();
        raw.local_flags
            .remove(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ISIG);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&fd, SetArg::TCSANOW, &raw).map_err(ShellError::TerminalModeFailure)?;

        debug!("terminal switched to raw mode");
        Ok(Self {
            fd,
            original: Some(original),
        })
    }

    /// Reapply the captured attributes, reporting failure to the caller.
    pub fn restore(mut self) -> ShellResult<()> {
        self.reapply()
    }

    fn reapply(&mut self) -> ShellResult<()> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };
        termios::tcsetattr(&self.fd, SetArg::TCSANOW, &original)
            .map_err(ShellError::TerminalModeFailure)?;
        debug!("terminal attributes restored");
        Ok(())
    }
}

impl<F: AsFd> Drop for RawMode<F> {
    fn drop(&mut self) {
        if let Err(err) = self.reapply() {
            warn!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::pty::openpty;

    const RAW_CLEARED: LocalFlags = LocalFlags::ICANON
        .union(LocalFlags::ECHO)
        .union(LocalFlags::ISIG);

    fn local_flags(fd: impl AsFd) -> LocalFlags {
        termios::tcgetattr(fd).unwrap().local_flags
    }

    #[test]
    fn drop_restores_original_attributes() {
        let pty = openpty(None, None).unwrap();
        let before = local_flags(&pty.slave);
        assert!(before.contains(LocalFlags::ICANON));

        {
            let _raw = RawMode::enter(&pty.slave).unwrap();
            assert!(!local_flags(&pty.slave).intersects(RAW_CLEARED));
            let raw = termios::tcgetattr(&pty.slave).unwrap();
            assert_eq!(raw.control_chars[SpecialCharacterIndices::VMIN as usize], 1);
        }

        assert_eq!(local_flags(&pty.slave), before);
    }

    #[test]
    fn restore_reapplies_original_attributes() {
        let pty = openpty(None, None).unwrap();
        let before = local_flags(&pty.slave);

        let raw = RawMode::enter(&pty.slave).unwrap();
        assert!(!local_flags(&pty.slave).intersects(RAW_CLEARED));
        raw.restore().unwrap();

        assert_eq!(local_flags(&pty.slave), before);
    }

    #[test]
    fn entering_on_a_regular_file_fails() {
        let file = tempfile::tempfile().unwrap();
        match RawMode::enter(&file) {
            Err(err) => assert!(err.is_fatal()),
            Ok(_) => panic!("a regular file has no terminal attributes"),
        }
    }
}
