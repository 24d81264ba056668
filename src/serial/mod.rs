pub mod config;
pub mod native;
pub mod permission;
pub mod stream;

use std::io;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};

use crate::error::{Result, SerialDeviceError};
pub use config::LineConfig;
pub use native::{NativeOpen, TermiosOpener};
pub use permission::{AccessCheck, Escalation, OsAccess, PermissionNegotiator, SuEscalation};
pub use stream::{DeviceReader, DeviceWriter, PortHandle};

/// An open, configured serial device.
///
/// Construction either yields a device with both streams ready or fails
/// before any descriptor is kept. The streams share the device's handle;
/// after [`close`](SerialDevice::close) they fail with `EBADF`.
#[derive(Debug)]
pub struct SerialDevice {
    path: PathBuf,
    config: LineConfig,
    handle: Arc<PortHandle>,
    input: DeviceReader,
    output: DeviceWriter,
}

impl SerialDevice {
    /// Open `path` with the OS access check, the `su` helper and termios.
    pub fn open(path: impl AsRef<Path>, config: LineConfig) -> Result<Self> {
        Self::open_with(
            path,
            config,
            &PermissionNegotiator::<OsAccess, SuEscalation>::default(),
            &TermiosOpener,
        )
    }

    /// Open `path` with an explicit negotiator and native binding.
    pub fn open_with<A, E, N>(
        path: impl AsRef<Path>,
        config: LineConfig,
        negotiator: &PermissionNegotiator<A, E>,
        opener: &N,
    ) -> Result<Self>
    where
        A: AccessCheck,
        E: Escalation,
        N: NativeOpen + ?Sized,
    {
        let path = path.as_ref();
        negotiator.ensure_accessible(path)?;

        let fd = match opener.open(path, &config) {
            Ok(Some(fd)) => fd,
            Ok(None) => {
                error!("native open returned no handle for {}", path.display());
                return Err(SerialDeviceError::no_handle(path));
            }
            Err(e) => {
                error!("OS rejected open of {}: {e}", path.display());
                return Err(SerialDeviceError::rejected(path, e));
            }
        };

        let handle = Arc::new(PortHandle::new(fd));
        info!("Opened serial device {} at {config}", path.display());
        Ok(SerialDevice {
            path: path.to_path_buf(),
            config,
            input: DeviceReader::new(handle.clone()),
            output: DeviceWriter::new(handle.clone()),
            handle,
        })
    }

    /// get input stream
    pub fn input_stream(&self) -> &DeviceReader {
        &self.input
    }

    /// get output stream
    pub fn output_stream(&self) -> &DeviceWriter {
        &self.output
    }

    /// get device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// get line settings
    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// is device open
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// raw descriptor, None after close
    pub fn as_raw_fd(&self) -> Option<RawFd> {
        self.handle.raw_fd()
    }

    /// Release the device handle.
    ///
    /// Closing twice is a no-op. Streams obtained from this device, including
    /// clones, fail from here on.
    pub fn close(&self) -> io::Result<()> {
        if self.handle.is_open() {
            info!("Closing serial device {}", self.path.display());
        }
        self.handle.close()
    }
}
