//! # Serial Device
//!
//! Managed access to a serial (UART/tty) device node.
//!
//! Opening a device runs in two steps:
//!
//! - **Permission negotiation**: if the process cannot read and write the
//!   node, a superuser helper is asked to `chmod 666` it.
//! - **Native open**: the node is opened and its line settings (baud rate,
//!   stop bits, data bits, parity, flow control, extra open flags) are applied
//!   through termios in one step.
//!
//! The result is a [`SerialDevice`](serial::SerialDevice) exposing an
//! unbuffered reader and writer over the same handle, plus an explicit close.
//!
//! ## Architecture
//!
//! - [`serial`]: device acquisition, line settings and byte streams
//! - [`error`]: custom error types
//!
//! ```no_run
//! use std::io::Write;
//! use serial_device::prelude::*;
//!
//! let device = SerialDevice::open("/dev/ttyS1", LineConfig::default())?;
//! device.output_stream().write_all(b"AT\r\n")?;
//! device.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod serial;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::error::*;
    pub use crate::serial::config::*;
    pub use crate::serial::{
        AccessCheck, DeviceReader, DeviceWriter, Escalation, NativeOpen, OsAccess,
        PermissionNegotiator, SerialDevice, SuEscalation, TermiosOpener,
    };
}
