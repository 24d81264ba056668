//! Byte streams over an open device handle.
//!
//! [`DeviceReader`] and [`DeviceWriter`] share one [`PortHandle`]. Reads and
//! writes go straight to the descriptor with no buffering. Once the handle is
//! closed every operation fails with `EBADF`.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nix::errno::Errno;

/// Owned descriptor that can be closed while streams still refer to it.
///
/// Each operation clones the inner `Arc<File>` and runs outside the lock, so
/// the descriptor is only released once no operation is using it. Its number
/// cannot be handed to another `open` while a stream still writes to it.
#[derive(Debug)]
pub struct PortHandle {
    file: Mutex<Option<Arc<File>>>,
}

impl PortHandle {
    pub fn new(fd: OwnedFd) -> Self {
        PortHandle {
            file: Mutex::new(Some(Arc::new(File::from(fd)))),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<File>>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// raw descriptor, or None once closed
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.slot().as_ref().map(|file| file.as_raw_fd())
    }

    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// Release the descriptor. Later calls do nothing.
    ///
    /// When an operation is still in flight on another thread the descriptor
    /// is closed as soon as that operation returns, and no close error can be
    /// reported.
    pub fn close(&self) -> io::Result<()> {
        let Some(file) = self.slot().take() else {
            return Ok(());
        };
        match Arc::try_unwrap(file) {
            Ok(file) => nix::unistd::close(file.into_raw_fd()).map_err(io::Error::from),
            Err(_in_flight) => Ok(()),
        }
    }

    fn file(&self) -> io::Result<Arc<File>> {
        self.slot()
            .clone()
            .ok_or_else(|| io::Error::from(Errno::EBADF))
    }
}

impl Drop for PortHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Closing serial handle on drop failed: {e}");
        }
    }
}

/// Read half of a serial device.
#[derive(Clone, Debug)]
pub struct DeviceReader {
    handle: Arc<PortHandle>,
}

/// Write half of a serial device.
#[derive(Clone, Debug)]
pub struct DeviceWriter {
    handle: Arc<PortHandle>,
}

impl DeviceReader {
    pub fn new(handle: Arc<PortHandle>) -> Self {
        DeviceReader { handle }
    }
}

impl DeviceWriter {
    pub fn new(handle: Arc<PortHandle>) -> Self {
        DeviceWriter { handle }
    }
}

impl Read for &DeviceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self.handle.file()?).read(buf)
    }
}

impl Read for DeviceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for &DeviceWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.handle.file()?).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.handle.file()?).flush()
    }
}

impl Write for DeviceWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}
