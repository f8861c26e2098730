use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::PanelError;
use crate::gpio::{Access, Direction, EdgeDetect, GpioBackend, Level, Wake};

/// One recorded backend call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Export(u32),
    Unexport(u32),
    Direction(u32, Direction),
    Edge(u32, EdgeDetect),
    Open(u32, Access),
    Close(u32),
    Rewind(u32),
    Read(u32),
    Write(u32, Level),
    Wait(Vec<u32>),
}

struct MockPin {
    exported: bool,
    direction: Option<Direction>,
    edge: EdgeDetect,
    open: Option<Access>,
    level: Level,
    at_start: bool, // cursor repositioned since the last read
}

impl MockPin {
    fn new() -> Self {
        MockPin {
            exported: false,
            direction: None,
            edge: EdgeDetect::None,
            open: None,
            level: Level::Low,
            at_start: false,
        }
    }
}

#[derive(Default)]
struct FailurePlan {
    export: HashSet<u32>,
    direction: HashSet<u32>,
    edge: HashSet<u32>,
    open: HashSet<u32>,
    rewind: HashSet<u32>,
    read: HashSet<u32>,
    write: HashSet<u32>,
    wait: bool, // consumed by the next wait
}

/// In-memory stand-in for the sysfs pin table. It enforces the same ordering
/// rules the kernel does (configure only exported pins, read only open
/// handles, rewind before every read) and journals every call so tests can
/// assert on sequences, not just end states.
#[derive(Default)]
pub struct MockGpioBackend {
    pins: Mutex<HashMap<u32, MockPin>>,
    wakes: Mutex<VecDeque<Wake>>,
    ops: Mutex<Vec<MockOp>>,
    fail: Mutex<FailurePlan>,
    shutdown: AtomicBool,
}

impl MockGpioBackend {
    /// Queue one wait wake reporting the given pins as ready. When the queue
    /// runs dry the next wait reports shutdown, so event loops driven by this
    /// mock always terminate.
    pub fn push_ready(&self, pins: &[u32]) {
        self.wakes
            .lock()
            .expect("mock wakes lock poisoned")
            .push_back(Wake::Ready(pins.to_vec()));
    }

    /// Force the hardware-side level of a pin.
    pub fn set_level(&self, pin: u32, level: Level) {
        let mut pins = self.pins.lock().expect("mock pins lock poisoned");
        pins.entry(pin).or_insert_with(MockPin::new).level = level;
    }

    pub fn level(&self, pin: u32) -> Option<Level> {
        self.pins
            .lock()
            .expect("mock pins lock poisoned")
            .get(&pin)
            .map(|p| p.level)
    }

    pub fn exported(&self, pin: u32) -> bool {
        self.pins
            .lock()
            .expect("mock pins lock poisoned")
            .get(&pin)
            .is_some_and(|p| p.exported)
    }

    pub fn ops(&self) -> Vec<MockOp> {
        self.ops.lock().expect("mock ops lock poisoned").clone()
    }

    pub fn unexport_count(&self, pin: u32) -> usize {
        self.ops()
            .iter()
            .filter(|op| **op == MockOp::Unexport(pin))
            .count()
    }

    pub fn fail_export(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .export
            .insert(pin);
    }

    pub fn fail_direction(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .direction
            .insert(pin);
    }

    pub fn fail_edge(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .edge
            .insert(pin);
    }

    pub fn fail_open(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .open
            .insert(pin);
    }

    pub fn fail_rewinds(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .rewind
            .insert(pin);
    }

    pub fn fail_reads(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .read
            .insert(pin);
    }

    pub fn fail_writes(&self, pin: u32) {
        self.fail
            .lock()
            .expect("mock fail lock poisoned")
            .write
            .insert(pin);
    }

    /// Make the next wait fail once; later waits behave normally, so a loop
    /// that retries after a failed wait still terminates under the script.
    pub fn fail_next_wait(&self) {
        self.fail.lock().expect("mock fail lock poisoned").wait = true;
    }

    fn injected() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "injected failure")
    }

    fn record(&self, op: MockOp) -> Result<(), PanelError> {
        self.ops
            .lock()
            .map_err(|e| PanelError::Gpio(format!("lock poisoned: {e}")))?
            .push(op);
        Ok(())
    }

    fn pins_locked(&self) -> Result<MutexGuard<'_, HashMap<u32, MockPin>>, PanelError> {
        self.pins
            .lock()
            .map_err(|e| PanelError::Gpio(format!("lock poisoned: {e}")))
    }

    fn failure(&self) -> Result<MutexGuard<'_, FailurePlan>, PanelError> {
        self.fail
            .lock()
            .map_err(|e| PanelError::Gpio(format!("lock poisoned: {e}")))
    }
}

fn exported_entry(pins: &mut HashMap<u32, MockPin>, pin: u32) -> Result<&mut MockPin, PanelError> {
    pins.get_mut(&pin)
        .filter(|p| p.exported)
        .ok_or_else(|| PanelError::Gpio(format!("pin {pin} is not exported")))
}

fn open_entry(
    pins: &mut HashMap<u32, MockPin>,
    pin: u32,
    access: Access,
) -> Result<&mut MockPin, PanelError> {
    let entry = exported_entry(pins, pin)?;
    if entry.open != Some(access) {
        return Err(PanelError::Gpio(format!(
            "pin {pin} has no open {access:?} handle"
        )));
    }
    Ok(entry)
}

impl GpioBackend for MockGpioBackend {
    fn export(&self, pin: u32) -> Result<(), PanelError> {
        self.record(MockOp::Export(pin))?;
        if self.failure()?.export.contains(&pin) {
            return Err(PanelError::Export {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        let entry = pins.entry(pin).or_insert_with(MockPin::new);
        if entry.exported {
            return Err(PanelError::Export {
                pin,
                source: io::Error::new(io::ErrorKind::ResourceBusy, "already exported"),
            });
        }
        entry.exported = true;
        Ok(())
    }

    fn unexport(&self, pin: u32) -> Result<(), PanelError> {
        self.record(MockOp::Unexport(pin))?;
        let mut pins = self.pins_locked()?;
        let entry = pins.get_mut(&pin).filter(|p| p.exported).ok_or_else(|| {
            PanelError::Unexport {
                pin,
                source: io::Error::new(io::ErrorKind::InvalidInput, "pin is not exported"),
            }
        })?;
        entry.exported = false;
        entry.direction = None;
        entry.edge = EdgeDetect::None;
        entry.open = None;
        Ok(())
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<(), PanelError> {
        self.record(MockOp::Direction(pin, direction))?;
        if self.failure()?.direction.contains(&pin) {
            return Err(PanelError::Direction {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        exported_entry(&mut pins, pin)?.direction = Some(direction);
        Ok(())
    }

    fn set_edge(&self, pin: u32, edge: EdgeDetect) -> Result<(), PanelError> {
        self.record(MockOp::Edge(pin, edge))?;
        if self.failure()?.edge.contains(&pin) {
            return Err(PanelError::Edge {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        let entry = exported_entry(&mut pins, pin)?;
        if entry.direction != Some(Direction::In) {
            return Err(PanelError::Gpio(format!(
                "pin {pin}: edge detection requires an input line"
            )));
        }
        entry.edge = edge;
        Ok(())
    }

    fn open_value(&self, pin: u32, access: Access) -> Result<(), PanelError> {
        self.record(MockOp::Open(pin, access))?;
        if self.failure()?.open.contains(&pin) {
            return Err(PanelError::Open {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        let entry = exported_entry(&mut pins, pin)?;
        match (access, entry.direction) {
            (Access::Read, Some(Direction::In)) | (Access::Write, Some(Direction::Out)) => {}
            _ => {
                return Err(PanelError::Gpio(format!(
                    "pin {pin}: {access:?} access does not match line direction"
                )));
            }
        }
        entry.open = Some(access);
        entry.at_start = false;
        Ok(())
    }

    fn close_value(&self, pin: u32) {
        let _ = self.record(MockOp::Close(pin));
        if let Ok(mut pins) = self.pins.lock()
            && let Some(entry) = pins.get_mut(&pin)
        {
            entry.open = None;
        }
    }

    fn rewind(&self, pin: u32) -> Result<(), PanelError> {
        self.record(MockOp::Rewind(pin))?;
        if self.failure()?.rewind.contains(&pin) {
            return Err(PanelError::Value {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        open_entry(&mut pins, pin, Access::Read)?.at_start = true;
        Ok(())
    }

    fn read_value(&self, pin: u32) -> Result<Level, PanelError> {
        self.record(MockOp::Read(pin))?;
        if self.failure()?.read.contains(&pin) {
            return Err(PanelError::Value {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        let entry = open_entry(&mut pins, pin, Access::Read)?;
        if !entry.at_start {
            // mirrors sysfs: a second read without a rewind sits at EOF
            return Err(PanelError::Gpio(format!("pin {pin}: read at stale cursor")));
        }
        entry.at_start = false;
        Ok(entry.level)
    }

    fn write_value(&self, pin: u32, level: Level) -> Result<(), PanelError> {
        self.record(MockOp::Write(pin, level))?;
        if self.failure()?.write.contains(&pin) {
            return Err(PanelError::Value {
                pin,
                source: Self::injected(),
            });
        }
        let mut pins = self.pins_locked()?;
        open_entry(&mut pins, pin, Access::Write)?.level = level;
        Ok(())
    }

    fn wait_ready(&self, pins: &[u32]) -> Result<Wake, PanelError> {
        self.record(MockOp::Wait(pins.to_vec()))?;
        if self.shutdown.load(Ordering::Relaxed) {
            return Ok(Wake::Shutdown);
        }
        {
            let mut fail = self.failure()?;
            if fail.wait {
                fail.wait = false;
                return Err(PanelError::Wait {
                    source: Self::injected(),
                });
            }
        }
        let next = self
            .wakes
            .lock()
            .map_err(|e| PanelError::Gpio(format!("lock poisoned: {e}")))?
            .pop_front();
        match next {
            Some(Wake::Ready(ready)) => {
                let ordered: Vec<u32> = pins
                    .iter()
                    .copied()
                    .filter(|pin| ready.contains(pin))
                    .collect();
                Ok(Wake::Ready(ordered))
            }
            Some(Wake::Shutdown) | None => Ok(Wake::Shutdown),
        }
    }

    fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
