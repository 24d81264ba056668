//! Native configure-and-open bindings.
//!
//! A binding either hands back a fully configured descriptor or nothing at
//! all. `Ok(None)` means the binding produced no handle, `Err` means the OS
//! refused the open or the line settings.

use std::fs::OpenOptions;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::error;
use nix::sys::termios::{
    self, BaudRate, ControlFlags, InputFlags, SetArg, cfmakeraw, cfsetispeed, cfsetospeed,
    tcgetattr, tcsetattr,
};

use super::config::{FLOW_HARDWARE, FLOW_NONE, FLOW_SOFTWARE, LineConfig};
use super::config::{PARITY_EVEN, PARITY_NONE, PARITY_ODD};

/// Opens and configures a serial line in one step.
#[cfg_attr(test, mockall::automock)]
pub trait NativeOpen {
    fn open(&self, path: &Path, config: &LineConfig) -> io::Result<Option<OwnedFd>>;
}

/// `open(2)` followed by termios setup.
///
/// Opens with `O_RDWR | flags`, puts the line in raw mode and applies speed,
/// character size, parity, stop bits and flow control. The descriptor is
/// closed again if any step after the open fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct TermiosOpener;

impl NativeOpen for TermiosOpener {
    fn open(&self, path: &Path, config: &LineConfig) -> io::Result<Option<OwnedFd>> {
        let Some(speed) = baud_rate(config.baud_rate) else {
            error!("Invalid baud rate {}", config.baud_rate);
            return Ok(None);
        };
        let mut cflag = ControlFlags::empty();
        let mut iflag = InputFlags::empty();
        if !encode_line(&mut cflag, &mut iflag, config) {
            return Ok(None);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(config.flags)
            .open(path)?;

        let mut termios = tcgetattr(&file)?;
        cfmakeraw(&mut termios);
        cfsetispeed(&mut termios, speed)?;
        cfsetospeed(&mut termios, speed)?;
        termios.control_flags &= !(ControlFlags::CSIZE
            | ControlFlags::PARENB
            | ControlFlags::PARODD
            | ControlFlags::CSTOPB
            | ControlFlags::CRTSCTS);
        termios.input_flags &= !(InputFlags::IXON | InputFlags::IXOFF | InputFlags::IXANY);
        termios.control_flags |= cflag;
        termios.input_flags |= iflag;
        tcsetattr(&file, SetArg::TCSANOW, &termios)?;

        Ok(Some(OwnedFd::from(file)))
    }
}

/// Set the termios bits for data, parity, stop and flow in `cflag`/`iflag`.
///
/// Returns false, after logging, for a value termios cannot express.
fn encode_line(cflag: &mut ControlFlags, iflag: &mut InputFlags, config: &LineConfig) -> bool {
    *cflag |= match config.data_bits {
        5 => ControlFlags::CS5,
        6 => ControlFlags::CS6,
        7 => ControlFlags::CS7,
        8 => ControlFlags::CS8,
        other => {
            error!("Invalid data bits {other}");
            return false;
        }
    };
    *cflag |= match config.parity {
        PARITY_NONE => ControlFlags::empty(),
        PARITY_ODD => ControlFlags::PARENB | ControlFlags::PARODD,
        PARITY_EVEN => ControlFlags::PARENB,
        other => {
            error!("Invalid parity {other}");
            return false;
        }
    };
    *cflag |= match config.stop_bits {
        1 => ControlFlags::empty(),
        2 => ControlFlags::CSTOPB,
        other => {
            error!("Invalid stop bits {other}");
            return false;
        }
    };
    match config.flow_control {
        FLOW_NONE => {}
        FLOW_HARDWARE => *cflag |= ControlFlags::CRTSCTS,
        FLOW_SOFTWARE => *iflag |= InputFlags::IXON | InputFlags::IXOFF | InputFlags::IXANY,
        other => {
            error!("Invalid flow control {other}");
            return false;
        }
    }
    true
}

/// termios speed constant for `baud`
pub fn baud_rate(baud: u32) -> Option<BaudRate> {
    use termios::BaudRate::*;
    let speed = match baud {
        0 => B0,
        50 => B50,
        75 => B75,
        110 => B110,
        134 => B134,
        150 => B150,
        200 => B200,
        300 => B300,
        600 => B600,
        1200 => B1200,
        1800 => B1800,
        2400 => B2400,
        4800 => B4800,
        9600 => B9600,
        19200 => B19200,
        38400 => B38400,
        57600 => B57600,
        115200 => B115200,
        230400 => B230400,
        460800 => B460800,
        500000 => B500000,
        576000 => B576000,
        921600 => B921600,
        1000000 => B1000000,
        1152000 => B1152000,
        1500000 => B1500000,
        2000000 => B2000000,
        2500000 => B2500000,
        3000000 => B3000000,
        3500000 => B3500000,
        4000000 => B4000000,
        _ => return None,
    };
    Some(speed)
}
