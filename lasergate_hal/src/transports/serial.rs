//! Serial tty transport.
//!
//! The controller firmware sits behind a USB CDC-ACM or UART tty. The port
//! is put in raw mode at the configured baud rate; replies are awaited with
//! `poll(2)` so a silent device surfaces as [`HalError::Timeout`] instead of
//! blocking the control loop.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lasergate_common::config::DeviceConfig;
use lasergate_common::hal::{HalError, Transport};
use lasergate_common::protocol::LINE_END;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::termios::{self, BaudRate, ControlFlags, FlushArg, SetArg, SpecialCharacterIndices};
use tracing::{debug, trace};

/// Upper bound on bytes drained after the first reply line.
const MAX_DRAIN_BYTES: usize = 4096;

/// tty link to the controller firmware.
pub struct SerialTransport {
    file: File,
    path: PathBuf,
    reply_timeout: Duration,
}

impl SerialTransport {
    /// Open and configure the device described by `config`.
    pub fn open(config: &DeviceConfig) -> Result<Self, HalError> {
        let baud = baud_rate(config.baud_rate)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(&config.path)
            .map_err(|e| HalError::InitFailed(format!("{}: {e}", config.path.display())))?;

        configure_raw(&file, baud)
            .map_err(|e| HalError::InitFailed(format!("{}: {e}", config.path.display())))?;

        debug!(
            "Serial port {} configured (raw, {} baud)",
            config.path.display(),
            config.baud_rate
        );

        Ok(Self {
            file,
            path: config.path.clone(),
            reply_timeout: config.reply_timeout(),
        })
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait until the port is readable or `timeout` elapses.
    fn wait_readable(&self, timeout: Duration) -> Result<bool, HalError> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(ready) => Ok(ready > 0),
            Err(Errno::EINTR) => Ok(false),
            Err(errno) => Err(HalError::Io(errno.into())),
        }
    }

    fn read_chunk(&mut self, buffer: &mut Vec<u8>) -> Result<usize, HalError> {
        let mut chunk = [0u8; 64];
        let n = self.file.read(&mut chunk)?;
        if n == 0 {
            return Err(HalError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "serial device closed",
            )));
        }
        buffer.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn send(&mut self, request: &[u8]) -> Result<(), HalError> {
        trace!("-> {:?}", String::from_utf8_lossy(request));
        self.file.write_all(request)?;
        self.file.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<String, HalError> {
        let deadline = Instant::now() + self.reply_timeout;
        let mut buffer = Vec::with_capacity(32);

        while !buffer.contains(&LINE_END) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(HalError::Timeout(self.reply_timeout));
            }
            if self.wait_readable(remaining)? {
                self.read_chunk(&mut buffer)?;
            }
        }

        // Anything already queued behind the first line belongs to this
        // exchange; the caller keeps only the last line.
        while buffer.len() < MAX_DRAIN_BYTES && self.wait_readable(Duration::ZERO)? {
            self.read_chunk(&mut buffer)?;
        }

        let reply = String::from_utf8_lossy(&buffer).into_owned();
        trace!("<- {reply:?}");
        Ok(reply)
    }

    fn discard_input(&mut self) -> Result<(), HalError> {
        termios::tcflush(&self.file, FlushArg::TCIFLUSH)
            .map_err(|errno| HalError::Io(errno.into()))
    }
}

fn configure_raw(file: &File, baud: BaudRate) -> nix::Result<()> {
    let mut tio = termios::tcgetattr(file)?;
    termios::cfmakeraw(&mut tio);
    termios::cfsetspeed(&mut tio, baud)?;
    tio.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcsetattr(file, SetArg::TCSANOW, &tio)?;
    termios::tcflush(file, FlushArg::TCIOFLUSH)
}

/// Map a numeric baud rate onto the termios constant.
pub fn baud_rate(rate: u32) -> Result<BaudRate, HalError> {
    Ok(match rate {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        other => {
            return Err(HalError::ConfigError(format!(
                "unsupported baud rate {other}"
            )));
        }
    })
}
