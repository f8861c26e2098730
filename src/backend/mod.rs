#[cfg(feature = "hardware-gpio")]
pub mod sysfs;
pub mod mock;

#[cfg(feature = "hardware-gpio")]
pub use sysfs::SysfsBackend;
pub use mock::{MockGpioBackend, MockOp};
