//! Hot-plug and failure-prediction probes

use crate::disk::ioctl::{
    control_name, le_u32, le_u8, query_fixed, DeviceControl, IOCTL_STORAGE_GET_HOTPLUG_INFO,
    IOCTL_STORAGE_PREDICT_FAILURE,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const STORAGE_HOTPLUG_INFO_SIZE: usize = 8;
const STORAGE_PREDICT_FAILURE_SIZE: usize = 516;
const VENDOR_SPECIFIC_SIZE: usize = 512;

/// STORAGE_HOTPLUG_INFO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotplugInfo {
    pub media_removable: bool,
    pub media_hotplug: bool,
    pub device_hotplug: bool,
    pub write_cache_enable_override: bool,
}

impl HotplugInfo {
    pub fn decode(buf: &[u8]) -> Option<Self> {
        Some(Self {
            media_removable: le_u8(buf, 4)? != 0,
            media_hotplug: le_u8(buf, 5)? != 0,
            device_hotplug: le_u8(buf, 6)? != 0,
            write_cache_enable_override: le_u8(buf, 7)? != 0,
        })
    }
}

/// STORAGE_PREDICT_FAILURE.
///
/// The vendor block is kept opaque; attribute decoding is left to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailurePrediction {
    /// The device predicts an imminent failure
    pub predict_failure: bool,
    pub vendor_specific: Box<[u8; VENDOR_SPECIFIC_SIZE]>,
}

impl FailurePrediction {
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let flag = le_u32(buf, 0)?;
        let vendor = buf.get(4..4 + VENDOR_SPECIFIC_SIZE)?;

        let mut vendor_specific = Box::new([0u8; VENDOR_SPECIFIC_SIZE]);
        vendor_specific.copy_from_slice(vendor);

        Some(Self {
            predict_failure: flag != 0,
            vendor_specific,
        })
    }
}

/// Query hot-plug information
pub fn query_hotplug_info<H: DeviceControl + ?Sized>(handle: &H) -> Result<HotplugInfo> {
    let raw = query_fixed::<STORAGE_HOTPLUG_INFO_SIZE, _>(
        handle,
        IOCTL_STORAGE_GET_HOTPLUG_INFO,
        STORAGE_HOTPLUG_INFO_SIZE,
    )?;
    HotplugInfo::decode(&raw).ok_or_else(|| {
        Error::query_failed(
            control_name(IOCTL_STORAGE_GET_HOTPLUG_INFO),
            "malformed STORAGE_HOTPLUG_INFO",
        )
    })
}

/// Query the device's failure prediction status
pub fn query_failure_prediction<H: DeviceControl + ?Sized>(handle: &H) -> Result<FailurePrediction> {
    let raw = query_fixed::<STORAGE_PREDICT_FAILURE_SIZE, _>(
        handle,
        IOCTL_STORAGE_PREDICT_FAILURE,
        STORAGE_PREDICT_FAILURE_SIZE,
    )?;
    FailurePrediction::decode(&raw).ok_or_else(|| {
        Error::query_failed(
            control_name(IOCTL_STORAGE_PREDICT_FAILURE),
            "malformed STORAGE_PREDICT_FAILURE",
        )
    })
}

/// True iff the hot-plug query succeeds. Any failure reads as unsupported.
pub fn query_supports_hotplug<H: DeviceControl + ?Sized>(handle: &H) -> bool {
    query_hotplug_info(handle).is_ok()
}

/// True iff the failure-prediction query succeeds. Any failure reads as
/// unsupported.
pub fn query_supports_failure_prediction<H: DeviceControl + ?Sized>(handle: &H) -> bool {
    query_failure_prediction(handle).is_ok()
}
