//! Physical disk queries
//!
//! Enumerates physical disks and reads per-device identity, geometry,
//! performance counters and health-prediction support:
//! - Device handles for `\\.\PhysicalDriveN` and `\\.\X:`
//! - Physical device numbers and the drive-letter reverse map
//! - STORAGE_DEVICE_DESCRIPTOR (vendor, model, revision, serial)
//! - DISK_GEOMETRY capacity and DISK_PERFORMANCE counters
//! - Hot-plug and failure-prediction probes
//!
//! The OS is reached only through [`DeviceHost`] and [`DeviceControl`].
//! Structure decoding is portable; the live implementation is Windows only.

pub mod capability;
pub mod descriptor;
pub mod drive;
pub mod geometry;
pub mod handle;
pub mod ioctl;
pub mod letters;
pub mod number;
pub mod performance;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used types
pub use capability::{
    query_failure_prediction, query_hotplug_info, query_supports_failure_prediction,
    query_supports_hotplug, FailurePrediction, HotplugInfo,
};
pub use descriptor::{
    query_device_identity, query_storage_descriptor, BusType, DeviceIdentity, StorageDescriptor,
};
pub use drive::{enumerate_disks, DiskDrive, DiskSummary};
pub use geometry::{query_geometry, query_geometry_summary, DiskGeometry};
pub use handle::{open_drive_letter_device, open_physical_drive, DeviceHost, DevicePath};
pub use ioctl::DeviceControl;
pub use letters::{map_drive_letters, query_drive_letters_for_device, DriveLetterSet};
pub use number::{query_device_number, DeviceNumber, DeviceType};
pub use performance::{
    query_performance_snapshot, PerformanceDelta, PerformanceRates, PerformanceSnapshot,
};

/// The live device host for this platform
#[cfg(target_os = "windows")]
pub fn system_host() -> crate::Result<windows::WindowsHost> {
    Ok(windows::WindowsHost::new())
}

/// The live device host for this platform
#[cfg(not(target_os = "windows"))]
pub fn system_host() -> crate::Result<UnsupportedHost> {
    Err(crate::Error::NotSupported(
        "Physical disk queries are only available on Windows".to_string(),
    ))
}

/// Placeholder host type on platforms without a live implementation
#[cfg(not(target_os = "windows"))]
#[derive(Debug, Clone, Copy)]
pub enum UnsupportedHost {}

#[cfg(not(target_os = "windows"))]
impl DeviceHost for UnsupportedHost {
    type Handle = UnsupportedDevice;

    fn open(&self, _path: &DevicePath) -> crate::Result<UnsupportedDevice> {
        match *self {}
    }

    fn process_drive_map(&self) -> crate::Result<u32> {
        match *self {}
    }

    fn logical_drives(&self) -> u32 {
        match *self {}
    }
}

/// Placeholder handle type on platforms without a live implementation
#[cfg(not(target_os = "windows"))]
#[derive(Debug)]
pub enum UnsupportedDevice {}

#[cfg(not(target_os = "windows"))]
impl DeviceControl for UnsupportedDevice {
    fn control(&self, _code: u32, _input: &[u8], _output: &mut [u8]) -> crate::Result<usize> {
        match *self {}
    }
}

#[cfg(all(test, not(target_os = "windows")))]
mod tests {
    use super::*;

    #[test]
    fn test_system_host_unsupported() {
        assert!(matches!(system_host(), Err(crate::Error::NotSupported(_))));
    }
}
