//! Disk geometry and capacity

use crate::disk::ioctl::{
    control_name, le_i64, le_u32, query_fixed, DeviceControl, IOCTL_DISK_GET_DRIVE_GEOMETRY,
};
use crate::error::{Error, Result};
use crate::units::format_size;
use log::debug;
use serde::{Deserialize, Serialize};

const DISK_GEOMETRY_SIZE: usize = 24;

/// DISK_GEOMETRY as reported by the disk driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskGeometry {
    pub cylinders: i64,
    /// MEDIA_TYPE (12 = fixed hard disk, 11 = removable)
    pub media_type: u32,
    pub tracks_per_cylinder: u32,
    pub sectors_per_track: u32,
    pub bytes_per_sector: u32,
}

impl DiskGeometry {
    pub fn decode(buf: &[u8]) -> Option<Self> {
        Some(Self {
            cylinders: le_i64(buf, 0)?,
            media_type: le_u32(buf, 8)?,
            tracks_per_cylinder: le_u32(buf, 12)?,
            sectors_per_track: le_u32(buf, 16)?,
            bytes_per_sector: le_u32(buf, 20)?,
        })
    }

    /// cylinders x tracks/cylinder x sectors/track x bytes/sector.
    ///
    /// This is the CHS-addressable size and is usually a little smaller than
    /// the capacity the OS reports for the disk (the last partial cylinder and
    /// reserved sectors are not counted). Negative cylinder counts are treated
    /// as zero and the product saturates at `u64::MAX`.
    pub fn capacity(&self) -> u64 {
        let cylinders = u64::try_from(self.cylinders).unwrap_or(0);
        cylinders
            .saturating_mul(self.tracks_per_cylinder as u64)
            .saturating_mul(self.sectors_per_track as u64)
            .saturating_mul(self.bytes_per_sector as u64)
    }
}

/// Query the raw disk geometry
pub fn query_geometry<H: DeviceControl + ?Sized>(handle: &H) -> Result<DiskGeometry> {
    let raw = query_fixed::<DISK_GEOMETRY_SIZE, _>(
        handle,
        IOCTL_DISK_GET_DRIVE_GEOMETRY,
        DISK_GEOMETRY_SIZE,
    )?;
    DiskGeometry::decode(&raw).ok_or_else(|| {
        Error::query_failed(
            control_name(IOCTL_DISK_GET_DRIVE_GEOMETRY),
            "malformed DISK_GEOMETRY",
        )
    })
}

/// Capacity as a human-readable size, or an empty string when the geometry
/// query fails
pub fn query_geometry_summary<H: DeviceControl + ?Sized>(handle: &H) -> String {
    match query_geometry(handle) {
        Ok(geometry) => format_size(geometry.capacity()),
        Err(e) => {
            debug!("geometry unavailable: {}", e);
            String::new()
        }
    }
}
