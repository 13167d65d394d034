//! Device number resolver
//!
//! Reads STORAGE_DEVICE_NUMBER from an open handle. The device index is the
//! correlation key between physical disks and the volumes mounted on them.

use crate::disk::ioctl::{
    control_name, le_u32, query_fixed, DeviceControl, IOCTL_STORAGE_GET_DEVICE_NUMBER,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const STORAGE_DEVICE_NUMBER_SIZE: usize = 12;

/// Device type tag reported alongside the device number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    CdRom,
    Disk,
    DiskFileSystem,
    VirtualDisk,
    MassStorage,
    Dvd,
    Other(u32),
}

impl DeviceType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0x02 => DeviceType::CdRom,
            0x07 => DeviceType::Disk,
            0x08 => DeviceType::DiskFileSystem,
            0x24 => DeviceType::VirtualDisk,
            0x2d => DeviceType::MassStorage,
            0x33 => DeviceType::Dvd,
            other => DeviceType::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            DeviceType::CdRom => 0x02,
            DeviceType::Disk => 0x07,
            DeviceType::DiskFileSystem => 0x08,
            DeviceType::VirtualDisk => 0x24,
            DeviceType::MassStorage => 0x2d,
            DeviceType::Dvd => 0x33,
            DeviceType::Other(raw) => raw,
        }
    }
}

/// Physical device number of an open handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceNumber {
    /// Physical device index (the N in `PhysicalDriveN` for disks)
    pub index: u32,
    /// Device type tag
    pub device_type: DeviceType,
    /// Partition number, `None` for devices that cannot be partitioned
    pub partition: Option<u32>,
}

impl DeviceNumber {
    /// Decode STORAGE_DEVICE_NUMBER
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let device_type = le_u32(buf, 0)?;
        let index = le_u32(buf, 4)?;
        let partition = le_u32(buf, 8)?;

        Some(Self {
            index,
            device_type: DeviceType::from_raw(device_type),
            partition: (partition != u32::MAX).then_some(partition),
        })
    }
}

/// Query the physical device number and type of `handle`.
///
/// On failure the underlying error is returned unchanged.
pub fn query_device_number<H: DeviceControl + ?Sized>(handle: &H) -> Result<DeviceNumber> {
    let raw = query_fixed::<STORAGE_DEVICE_NUMBER_SIZE, _>(
        handle,
        IOCTL_STORAGE_GET_DEVICE_NUMBER,
        STORAGE_DEVICE_NUMBER_SIZE,
    )?;

    DeviceNumber::decode(&raw).ok_or_else(|| {
        Error::query_failed(
            control_name(IOCTL_STORAGE_GET_DEVICE_NUMBER),
            "malformed STORAGE_DEVICE_NUMBER",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::mock::{MockDevice, MockFailure};

    #[test]
    fn test_decode_device_number() {
        let mut buf = [0u8; 12];
        buf[0..4].copy_from_slice(&0x07u32.to_le_bytes());
        buf[4..8].copy_from_slice(&2u32.to_le_bytes());
        buf[8..12].copy_from_slice(&1u32.to_le_bytes());

        let number = DeviceNumber::decode(&buf).unwrap();
        assert_eq!(number.index, 2);
        assert_eq!(number.device_type, DeviceType::Disk);
        assert_eq!(number.partition, Some(1));
    }

    #[test]
    fn test_unpartitioned_device() {
        let mut buf = [0u8; 12];
        buf[0..4].copy_from_slice(&0x02u32.to_le_bytes());
        buf[8..12].copy_from_slice(&u32::MAX.to_le_bytes());

        let number = DeviceNumber::decode(&buf).unwrap();
        assert_eq!(number.device_type, DeviceType::CdRom);
        assert_eq!(number.partition, None);
        assert!(DeviceNumber::decode(&buf[..8]).is_none());
    }

    #[test]
    fn test_device_type_raw() {
        for raw in [0x02, 0x07, 0x08, 0x24, 0x2d, 0x33, 0x99] {
            assert_eq!(DeviceType::from_raw(raw).raw(), raw);
        }
        assert_eq!(DeviceType::from_raw(0x99), DeviceType::Other(0x99));
    }

    #[test]
    fn test_query_device_number() {
        let handle = MockDevice::new()
            .with_device_number(DeviceType::Disk, 4, Some(0))
            .into_handle();
        let number = query_device_number(&handle).unwrap();
        assert_eq!(number.index, 4);
        assert_eq!(number.device_type, DeviceType::Disk);
    }

    #[test]
    fn test_query_device_number_propagates_failure() {
        let handle = MockDevice::new()
            .with_failure(IOCTL_STORAGE_GET_DEVICE_NUMBER, MockFailure::Unsupported)
            .into_handle();
        let err = query_device_number(&handle).unwrap_err();
        assert!(err.is_unsupported());
    }
}
