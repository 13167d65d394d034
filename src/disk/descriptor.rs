//! Storage device descriptor (vendor, model, revision, serial)
//!
//! STORAGE_DEVICE_DESCRIPTOR is variable length: the fixed part holds byte
//! offsets to NUL-terminated narrow strings embedded later in the same
//! buffer. An offset of zero means the device did not report that field.

use crate::disk::ioctl::{
    le_u32, le_u8, query_variable_length, DeviceControl, IOCTL_STORAGE_QUERY_PROPERTY,
};
use crate::error::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// StorageDeviceProperty
const STORAGE_DEVICE_PROPERTY: u32 = 0;
/// PropertyStandardQuery
const PROPERTY_STANDARD_QUERY: u32 = 0;
/// Fixed part of STORAGE_DEVICE_DESCRIPTOR up to and including BusType
const DEVICE_DESCRIPTOR_FIXED_SIZE: usize = 32;

/// Bus the device is attached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusType {
    Scsi,
    Atapi,
    Ata,
    Ieee1394,
    Ssa,
    Fibre,
    Usb,
    Raid,
    Iscsi,
    Sas,
    Sata,
    Sd,
    Mmc,
    Virtual,
    FileBackedVirtual,
    Spaces,
    Nvme,
    Scm,
    Ufs,
    Unknown(u32),
}

impl BusType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0x01 => BusType::Scsi,
            0x02 => BusType::Atapi,
            0x03 => BusType::Ata,
            0x04 => BusType::Ieee1394,
            0x05 => BusType::Ssa,
            0x06 => BusType::Fibre,
            0x07 => BusType::Usb,
            0x08 => BusType::Raid,
            0x09 => BusType::Iscsi,
            0x0A => BusType::Sas,
            0x0B => BusType::Sata,
            0x0C => BusType::Sd,
            0x0D => BusType::Mmc,
            0x0E => BusType::Virtual,
            0x0F => BusType::FileBackedVirtual,
            0x10 => BusType::Spaces,
            0x11 => BusType::Nvme,
            0x12 => BusType::Scm,
            0x13 => BusType::Ufs,
            other => BusType::Unknown(other),
        }
    }
}

/// Identity text reported by the device.
///
/// Each field is independent; a device may report any subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub revision: Option<String>,
    pub serial: Option<String>,
}

impl DeviceIdentity {
    /// "Vendor Model" for display, skipping whatever is missing or blank
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.vendor.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Decoded STORAGE_DEVICE_DESCRIPTOR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDescriptor {
    /// SCSI peripheral device type byte
    pub scsi_device_type: u8,
    pub removable_media: bool,
    pub command_queueing: bool,
    pub bus_type: BusType,
    pub identity: DeviceIdentity,
}

impl StorageDescriptor {
    /// Decode a complete descriptor buffer
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < DEVICE_DESCRIPTOR_FIXED_SIZE {
            return None;
        }

        let identity = DeviceIdentity {
            vendor: text_at(buf, le_u32(buf, 12)?),
            model: text_at(buf, le_u32(buf, 16)?),
            revision: text_at(buf, le_u32(buf, 20)?),
            serial: text_at(buf, le_u32(buf, 24)?),
        };

        Some(Self {
            scsi_device_type: le_u8(buf, 8)?,
            removable_media: le_u8(buf, 10)? != 0,
            command_queueing: le_u8(buf, 11)? != 0,
            bus_type: BusType::from_raw(le_u32(buf, 28)?),
            identity,
        })
    }
}

/// Read the text at `offset`, `None` when the offset is zero or out of range
fn text_at(buf: &[u8], offset: u32) -> Option<String> {
    if offset == 0 {
        return None;
    }
    let Some(tail) = buf.get(offset as usize..) else {
        debug!("descriptor text offset {} beyond {} bytes", offset, buf.len());
        return None;
    };
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(trim_text(&narrow_to_string(&tail[..end])))
}

/// Convert narrow descriptor text into a `String`.
///
/// Devices report ASCII in practice; bytes that are not valid UTF-8 are taken
/// as Latin-1 so no byte is ever lost or replaced.
pub fn narrow_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Strip leading and trailing whitespace. Idempotent.
pub fn trim_text(text: &str) -> String {
    text.trim().to_string()
}

/// STORAGE_PROPERTY_QUERY for the standard device descriptor
fn device_property_query() -> [u8; 12] {
    let mut query = [0u8; 12];
    query[0..4].copy_from_slice(&STORAGE_DEVICE_PROPERTY.to_le_bytes());
    query[4..8].copy_from_slice(&PROPERTY_STANDARD_QUERY.to_le_bytes());
    query
}

/// Fetch and decode the full storage device descriptor
pub fn query_storage_descriptor<H: DeviceControl + ?Sized>(handle: &H) -> Result<StorageDescriptor> {
    let buffer = query_variable_length(handle, IOCTL_STORAGE_QUERY_PROPERTY, &device_property_query())?;

    StorageDescriptor::decode(&buffer).ok_or_else(|| {
        Error::query_failed(
            "IOCTL_STORAGE_QUERY_PROPERTY",
            format!("device descriptor too short: {} bytes", buffer.len()),
        )
    })
}

/// Vendor, model, revision and serial of the device.
///
/// Fails only when the descriptor itself cannot be retrieved; success says
/// nothing about how many fields were present.
pub fn query_device_identity<H: DeviceControl + ?Sized>(handle: &H) -> Result<DeviceIdentity> {
    query_storage_descriptor(handle).map(|descriptor| descriptor.identity)
}
