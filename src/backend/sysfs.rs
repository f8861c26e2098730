use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::unistd::pipe2;
use parking_lot::Mutex;

use crate::error::PanelError;
use crate::gpio::{Access, Direction, EdgeDetect, GpioBackend, Level, Wake};

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

// The gpioN node appears asynchronously after export and udev still has to
// adjust its permissions; touching the attribute files too early fails with
// EACCES.
const EXPORT_SETTLE: Duration = Duration::from_millis(50);

pub struct SysfsBackend {
    values: Mutex<HashMap<u32, File>>, // long-lived value handles, keyed by pin
    wake_rx: File,
    wake_tx: File,
}

impl SysfsBackend {
    pub fn new() -> Result<Self, PanelError> {
        let (rx, tx) = pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK)
            .map_err(|e| PanelError::Gpio(format!("cancellation pipe: {e}")))?;
        Ok(SysfsBackend {
            values: Mutex::new(HashMap::new()),
            wake_rx: File::from(rx),
            wake_tx: File::from(tx),
        })
    }

    fn control_path(name: &str) -> PathBuf {
        Path::new(SYSFS_GPIO_ROOT).join(name)
    }

    fn pin_path(pin: u32, attr: &str) -> PathBuf {
        Path::new(SYSFS_GPIO_ROOT)
            .join(format!("gpio{pin}"))
            .join(attr)
    }

    fn write_attr(path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;
        file.write_all(contents)
    }

    fn with_value<T>(
        &self,
        pin: u32,
        op: impl FnOnce(&mut File) -> io::Result<T>,
    ) -> Result<T, PanelError> {
        let mut values = self.values.lock();
        let file = values
            .get_mut(&pin)
            .ok_or_else(|| PanelError::Gpio(format!("value file for pin {pin} is not open")))?;
        op(file).map_err(|source| PanelError::Value { pin, source })
    }
}

impl GpioBackend for SysfsBackend {
    fn export(&self, pin: u32) -> Result<(), PanelError> {
        Self::write_attr(&Self::control_path("export"), pin.to_string().as_bytes())
            .map_err(|source| PanelError::Export { pin, source })?;
        thread::sleep(EXPORT_SETTLE);
        Ok(())
    }

    fn unexport(&self, pin: u32) -> Result<(), PanelError> {
        Self::write_attr(&Self::control_path("unexport"), pin.to_string().as_bytes())
            .map_err(|source| PanelError::Unexport { pin, source })
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), PanelError> {
        Self::write_attr(
            &Self::pin_path(pin, "direction"),
            direction.as_str().as_bytes(),
        )
        .map_err(|source| PanelError::Direction { pin, source })
    }

    fn set_edge(&self, pin: u32, edge: EdgeDetect) -> Result<(), PanelError> {
        Self::write_attr(&Self::pin_path(pin, "edge"), edge.as_str().as_bytes())
            .map_err(|source| PanelError::Edge { pin, source })
    }

    fn open_value(&self, pin: u32, access: Access) -> Result<(), PanelError> {
        let file = OpenOptions::new()
            .read(access == Access::Read)
            .write(access == Access::Write)
            .open(Self::pin_path(pin, "value"))
            .map_err(|source| PanelError::Open { pin, source })?;
        self.values.lock().insert(pin, file);
        Ok(())
    }

    fn close_value(&self, pin: u32) {
        self.values.lock().remove(&pin);
    }

    fn rewind(&self, pin: u32) -> Result<(), PanelError> {
        self.with_value(pin, |file| file.seek(SeekFrom::Start(0)).map(|_| ()))
    }

    fn read_value(&self, pin: u32) -> Result<Level, PanelError> {
        let byte = self.with_value(pin, |file| {
            let mut buf = [0u8; 3];
            let n = file.read(&mut buf)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "empty read from value file",
                ));
            }
            Ok(buf[0])
        })?;
        Level::from_ascii(byte)
            .ok_or_else(|| PanelError::Gpio(format!("pin {pin}: unexpected value byte {byte:#04x}")))
    }

    fn write_value(&self, pin: u32, level: Level) -> Result<(), PanelError> {
        self.with_value(pin, |file| {
            file.seek(SeekFrom::Start(0))?;
            let n = file.write(level.as_bytes())?;
            if n != 1 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short value write"));
            }
            Ok(())
        })
    }

    fn wait_ready(&self, pins: &[u32]) -> Result<Wake, PanelError> {
        let values = self.values.lock();
        let mut fds = Vec::with_capacity(pins.len() + 1);
        fds.push(PollFd::new(self.wake_rx.as_fd(), PollFlags::POLLIN));
        for pin in pins {
            let file = values
                .get(pin)
                .ok_or_else(|| PanelError::Gpio(format!("value file for pin {pin} is not open")))?;
            fds.push(PollFd::new(file.as_fd(), PollFlags::POLLPRI));
        }

        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(PanelError::Wait { source: e.into() }),
            }
        }

        if fds[0]
            .revents()
            .is_some_and(|r| r.contains(PollFlags::POLLIN))
        {
            // drain so an already-queued request cannot wake the next wait
            let mut buf = [0u8; 8];
            while (&self.wake_rx).read(&mut buf).is_ok_and(|n| n > 0) {}
            return Ok(Wake::Shutdown);
        }

        let ready = pins
            .iter()
            .zip(fds[1..].iter())
            .filter(|(_, fd)| {
                fd.revents()
                    .is_some_and(|r| r.contains(PollFlags::POLLPRI))
            })
            .map(|(pin, _)| *pin)
            .collect();
        Ok(Wake::Ready(ready))
    }

    fn request_shutdown(&self) {
        // best effort: a full pipe already guarantees a pending wake
        let _ = (&self.wake_tx).write(&[1]);
    }
}
