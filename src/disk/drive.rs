//! Physical disk view used by the device panel
//!
//! Bundles one open `\\.\PhysicalDriveN` handle with the queries a device
//! list needs. Every query goes to the device; nothing is remembered between
//! calls.

use crate::disk::capability::{query_supports_failure_prediction, query_supports_hotplug};
use crate::disk::descriptor::{query_storage_descriptor, BusType, DeviceIdentity};
use crate::disk::geometry::query_geometry_summary;
use crate::disk::handle::{open_physical_drive, DeviceHost, DevicePath};
use crate::disk::ioctl::DeviceControl;
use crate::disk::letters::{map_drive_letters, query_drive_letters_for_device, DriveLetterSet};
use crate::disk::performance::{query_performance_snapshot, PerformanceSnapshot};
use crate::error::Result;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// One row of the device list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSummary {
    pub index: u32,
    pub path: String,
    pub identity: DeviceIdentity,
    pub bus_type: Option<BusType>,
    pub removable_media: Option<bool>,
    pub drive_letters: DriveLetterSet,
    /// Human-readable capacity, empty when the geometry is unavailable
    pub capacity: String,
    pub supports_hotplug: bool,
    pub supports_failure_prediction: bool,
}

/// An open physical disk
pub struct DiskDrive<D: DeviceControl> {
    index: u32,
    handle: D,
}

impl<D: DeviceControl> DiskDrive<D> {
    /// Open `\\.\PhysicalDrive{index}`
    pub fn open<H>(host: &H, index: u32) -> Result<Self>
    where
        H: DeviceHost<Handle = D> + ?Sized,
    {
        let handle = open_physical_drive(host, index)?;
        Ok(Self { index, handle })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> DevicePath {
        DevicePath::PhysicalDrive(self.index)
    }

    pub fn handle(&self) -> &D {
        &self.handle
    }

    /// Current performance counters
    pub fn statistics(&self) -> Result<PerformanceSnapshot> {
        query_performance_snapshot(&self.handle)
    }

    /// Build the device-list row, scanning drive letters when asked to
    pub fn summary<H: DeviceHost + ?Sized>(&self, host: &H, include_letters: bool) -> DiskSummary {
        let letters = if include_letters {
            query_drive_letters_for_device(host, self.index)
        } else {
            DriveLetterSet::new()
        };
        self.summary_with_letters(letters)
    }

    fn summary_with_letters(&self, drive_letters: DriveLetterSet) -> DiskSummary {
        let descriptor = match query_storage_descriptor(&self.handle) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                debug!("{}: no device descriptor: {}", self.path(), e);
                None
            }
        };

        DiskSummary {
            index: self.index,
            path: self.path().to_string(),
            identity: descriptor
                .as_ref()
                .map(|d| d.identity.clone())
                .unwrap_or_default(),
            bus_type: descriptor.as_ref().map(|d| d.bus_type),
            removable_media: descriptor.as_ref().map(|d| d.removable_media),
            drive_letters,
            capacity: query_geometry_summary(&self.handle),
            supports_hotplug: query_supports_hotplug(&self.handle),
            supports_failure_prediction: query_supports_failure_prediction(&self.handle),
        }
    }
}

/// Summaries for every physical disk `0..max_index` that can be opened.
///
/// Indices that fail to open are skipped. Drive letters come from a single
/// scan shared by all disks.
pub fn enumerate_disks<H: DeviceHost + ?Sized>(
    host: &H,
    max_index: u32,
    include_letters: bool,
) -> Vec<DiskSummary> {
    let mut letters = if include_letters {
        map_drive_letters(host)
    } else {
        Default::default()
    };

    let mut disks = Vec::new();
    for index in 0..max_index {
        let drive = match DiskDrive::open(host, index) {
            Ok(drive) => drive,
            Err(e) => {
                trace!("skipping disk {}: {}", index, e);
                continue;
            }
        };
        let drive_letters = letters.remove(&index).unwrap_or_default();
        disks.push(drive.summary_with_letters(drive_letters));
    }

    debug!("found {} disk(s) below index {}", disks.len(), max_index);
    disks
}
