//! In-memory device host for tests
//!
//! Replies are stored as the raw byte layouts the OS returns, so the decoders
//! run against the same bytes they see on a live system.

use crate::disk::geometry::DiskGeometry;
use crate::disk::handle::{DeviceHost, DevicePath};
use crate::disk::ioctl::{
    control_name, DeviceControl, IOCTL_DISK_GET_DRIVE_GEOMETRY, IOCTL_DISK_PERFORMANCE,
    IOCTL_STORAGE_GET_DEVICE_NUMBER, IOCTL_STORAGE_GET_HOTPLUG_INFO,
    IOCTL_STORAGE_PREDICT_FAILURE, IOCTL_STORAGE_QUERY_PROPERTY,
};
use crate::disk::number::DeviceType;
use crate::disk::performance::PerformanceSnapshot;
use crate::error::{Error, Result, UnavailableReason};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// How a scripted control query fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Unsupported,
    Failed,
    AccessDenied,
}

type Reply = std::result::Result<Vec<u8>, MockFailure>;

/// Scripted replies for one device, keyed by control code
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    replies: HashMap<u32, Reply>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, code: u32, bytes: Vec<u8>) -> Self {
        self.replies.insert(code, Ok(bytes));
        self
    }

    pub fn with_failure(mut self, code: u32, failure: MockFailure) -> Self {
        self.replies.insert(code, Err(failure));
        self
    }

    pub fn with_device_number(self, device_type: DeviceType, index: u32, partition: Option<u32>) -> Self {
        let mut buf = Vec::with_capacity(12);
        buf.extend_from_slice(&device_type.raw().to_le_bytes());
        buf.extend_from_slice(&index.to_le_bytes());
        buf.extend_from_slice(&partition.unwrap_or(u32::MAX).to_le_bytes());
        self.with_reply(IOCTL_STORAGE_GET_DEVICE_NUMBER, buf)
    }

    pub fn with_descriptor(
        self,
        vendor: Option<&str>,
        model: Option<&str>,
        revision: Option<&str>,
        serial: Option<&str>,
        bus_type: u32,
    ) -> Self {
        let buf = encode_descriptor(vendor, model, revision, serial, bus_type, false);
        self.with_reply(IOCTL_STORAGE_QUERY_PROPERTY, buf)
    }

    pub fn with_geometry(self, geometry: DiskGeometry) -> Self {
        let mut buf = Vec::with_capacity(24);
        buf.extend_from_slice(&geometry.cylinders.to_le_bytes());
        buf.extend_from_slice(&geometry.media_type.to_le_bytes());
        buf.extend_from_slice(&geometry.tracks_per_cylinder.to_le_bytes());
        buf.extend_from_slice(&geometry.sectors_per_track.to_le_bytes());
        buf.extend_from_slice(&geometry.bytes_per_sector.to_le_bytes());
        self.with_reply(IOCTL_DISK_GET_DRIVE_GEOMETRY, buf)
    }

    pub fn with_performance(self, snapshot: &PerformanceSnapshot) -> Self {
        let mut buf = Vec::with_capacity(88);
        for value in [
            snapshot.bytes_read,
            snapshot.bytes_written,
            snapshot.read_time,
            snapshot.write_time,
            snapshot.idle_time,
        ] {
            buf.extend_from_slice(&(value as i64).to_le_bytes());
        }
        for value in [
            snapshot.read_count,
            snapshot.write_count,
            snapshot.queue_depth,
            snapshot.split_count,
        ] {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&(snapshot.query_time as i64).to_le_bytes());
        buf.extend_from_slice(&snapshot.storage_device_number.to_le_bytes());

        let mut name = [0u16; 8];
        for (slot, unit) in name.iter_mut().zip(snapshot.storage_manager.encode_utf16()) {
            *slot = unit;
        }
        for unit in name {
            buf.extend_from_slice(&unit.to_le_bytes());
        }
        buf.resize(88, 0);
        self.with_reply(IOCTL_DISK_PERFORMANCE, buf)
    }

    pub fn with_hotplug(self, media_removable: bool, device_hotplug: bool) -> Self {
        let buf = vec![8, 0, 0, 0, media_removable as u8, 0, device_hotplug as u8, 0];
        self.with_reply(IOCTL_STORAGE_GET_HOTPLUG_INFO, buf)
    }

    pub fn with_predict_failure(self, predict_failure: bool) -> Self {
        let mut buf = vec![0u8; 516];
        buf[0] = predict_failure as u8;
        self.with_reply(IOCTL_STORAGE_PREDICT_FAILURE, buf)
    }

    /// Standalone handle with its own call log
    pub fn into_handle(self) -> MockHandle {
        MockHandle {
            replies: Rc::new(self.replies),
            calls: Rc::default(),
            live: Rc::new(Cell::new(1)),
        }
    }
}

/// Build a STORAGE_DEVICE_DESCRIPTOR with the strings appended after the
/// 40-byte fixed part
pub fn encode_descriptor(
    vendor: Option<&str>,
    model: Option<&str>,
    revision: Option<&str>,
    serial: Option<&str>,
    bus_type: u32,
    removable: bool,
) -> Vec<u8> {
    let mut buf = vec![0u8; 40];
    buf[0..4].copy_from_slice(&40u32.to_le_bytes());
    buf[10] = removable as u8;
    buf[28..32].copy_from_slice(&bus_type.to_le_bytes());

    for (slot, text) in [(12, vendor), (16, model), (20, revision), (24, serial)] {
        if let Some(text) = text {
            let offset = buf.len() as u32;
            buf[slot..slot + 4].copy_from_slice(&offset.to_le_bytes());
            buf.extend_from_slice(text.as_bytes());
            buf.push(0);
        }
    }

    let size = buf.len() as u32;
    buf[4..8].copy_from_slice(&size.to_le_bytes());
    buf
}

/// Open mock handle; decrements the owner's live count when dropped
pub struct MockHandle {
    replies: Rc<HashMap<u32, Reply>>,
    calls: Rc<RefCell<Vec<u32>>>,
    live: Rc<Cell<usize>>,
}

impl MockHandle {
    /// Control codes issued on this handle (and its host's other handles)
    pub fn calls(&self) -> Vec<u32> {
        self.calls.borrow().clone()
    }
}

impl DeviceControl for MockHandle {
    fn control(&self, code: u32, _input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.calls.borrow_mut().push(code);

        match self.replies.get(&code) {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(output.len());
                output[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(MockFailure::Failed)) => Err(Error::query_failed(
                control_name(code),
                "the device is not ready",
            )),
            Some(Err(MockFailure::AccessDenied)) => {
                Err(Error::query_failed(control_name(code), "access is denied"))
            }
            Some(Err(MockFailure::Unsupported)) | None => Err(Error::QueryUnsupported {
                control: control_name(code),
            }),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// Scripted OS state: drive masks and the devices behind each path
pub struct MockHost {
    drive_map: Option<u32>,
    logical_drives: u32,
    devices: HashMap<DevicePath, Rc<HashMap<u32, Reply>>>,
    denied: HashSet<DevicePath>,
    opened: RefCell<Vec<DevicePath>>,
    calls: Rc<RefCell<Vec<u32>>>,
    live: Rc<Cell<usize>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            drive_map: Some(0),
            logical_drives: 0,
            devices: HashMap::new(),
            denied: HashSet::new(),
            opened: RefCell::default(),
            calls: Rc::default(),
            live: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_drive_map(mut self, mask: u32) -> Self {
        self.drive_map = Some(mask);
        self
    }

    /// Make the process device map query fail
    pub fn without_drive_map(mut self) -> Self {
        self.drive_map = None;
        self
    }

    pub fn with_logical_drives(mut self, mask: u32) -> Self {
        self.logical_drives = mask;
        self
    }

    pub fn with_physical_drive(mut self, index: u32, device: MockDevice) -> Self {
        self.devices
            .insert(DevicePath::PhysicalDrive(index), Rc::new(device.replies));
        self
    }

    pub fn with_letter(mut self, letter: char, device: MockDevice) -> Self {
        self.devices.insert(
            DevicePath::DriveLetter(letter.to_ascii_uppercase()),
            Rc::new(device.replies),
        );
        self
    }

    /// Opening `path` fails with access denied
    pub fn deny(mut self, path: DevicePath) -> Self {
        self.denied.insert(path);
        self
    }

    pub fn live_handles(&self) -> usize {
        self.live.get()
    }

    pub fn opened(&self) -> Vec<DevicePath> {
        self.opened.borrow().clone()
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.borrow().clone()
    }
}

impl DeviceHost for MockHost {
    type Handle = MockHandle;

    fn open(&self, path: &DevicePath) -> Result<MockHandle> {
        self.opened.borrow_mut().push(*path);

        if self.denied.contains(path) {
            return Err(Error::DeviceUnavailable {
                path: path.to_string(),
                reason: UnavailableReason::AccessDenied,
            });
        }

        let replies = self.devices.get(path).ok_or_else(|| Error::DeviceUnavailable {
            path: path.to_string(),
            reason: UnavailableReason::NotFound,
        })?;

        self.live.set(self.live.get() + 1);
        Ok(MockHandle {
            replies: Rc::clone(replies),
            calls: Rc::clone(&self.calls),
            live: Rc::clone(&self.live),
        })
    }

    fn process_drive_map(&self) -> Result<u32> {
        self.drive_map
            .ok_or_else(|| Error::NotSupported("process device map".to_string()))
    }

    fn logical_drives(&self) -> u32 {
        self.logical_drives
    }
}
