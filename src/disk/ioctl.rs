//! Device control plumbing
//!
//! Control codes, the handle trait every query goes through, and little-endian
//! readers for the fixed structures the storage stack returns. Nothing here
//! touches the OS directly, so every decoder runs on any host.

use crate::error::{Error, Result};

/// Build a device I/O control code from its four parts
pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

const FILE_DEVICE_DISK: u32 = 0x0000_0007;
const FILE_DEVICE_MASS_STORAGE: u32 = 0x0000_002d;
const METHOD_BUFFERED: u32 = 0;
const FILE_ANY_ACCESS: u32 = 0;

pub const IOCTL_STORAGE_GET_HOTPLUG_INFO: u32 =
    ctl_code(FILE_DEVICE_MASS_STORAGE, 0x0305, METHOD_BUFFERED, FILE_ANY_ACCESS);
pub const IOCTL_STORAGE_GET_DEVICE_NUMBER: u32 =
    ctl_code(FILE_DEVICE_MASS_STORAGE, 0x0420, METHOD_BUFFERED, FILE_ANY_ACCESS);
pub const IOCTL_STORAGE_PREDICT_FAILURE: u32 =
    ctl_code(FILE_DEVICE_MASS_STORAGE, 0x0440, METHOD_BUFFERED, FILE_ANY_ACCESS);
pub const IOCTL_STORAGE_QUERY_PROPERTY: u32 =
    ctl_code(FILE_DEVICE_MASS_STORAGE, 0x0500, METHOD_BUFFERED, FILE_ANY_ACCESS);
pub const IOCTL_DISK_GET_DRIVE_GEOMETRY: u32 =
    ctl_code(FILE_DEVICE_DISK, 0x0000, METHOD_BUFFERED, FILE_ANY_ACCESS);
pub const IOCTL_DISK_PERFORMANCE: u32 =
    ctl_code(FILE_DEVICE_DISK, 0x0008, METHOD_BUFFERED, FILE_ANY_ACCESS);

/// Size of STORAGE_DESCRIPTOR_HEADER (Version + Size)
pub const DESCRIPTOR_HEADER_SIZE: usize = 8;

/// Upper bound on a variable-length reply we are willing to allocate
const MAX_VARIABLE_REPLY: usize = 64 * 1024;

/// Name of a control code for error messages and logs
pub fn control_name(code: u32) -> &'static str {
    match code {
        IOCTL_STORAGE_GET_HOTPLUG_INFO => "IOCTL_STORAGE_GET_HOTPLUG_INFO",
        IOCTL_STORAGE_GET_DEVICE_NUMBER => "IOCTL_STORAGE_GET_DEVICE_NUMBER",
        IOCTL_STORAGE_PREDICT_FAILURE => "IOCTL_STORAGE_PREDICT_FAILURE",
        IOCTL_STORAGE_QUERY_PROPERTY => "IOCTL_STORAGE_QUERY_PROPERTY",
        IOCTL_DISK_GET_DRIVE_GEOMETRY => "IOCTL_DISK_GET_DRIVE_GEOMETRY",
        IOCTL_DISK_PERFORMANCE => "IOCTL_DISK_PERFORMANCE",
        _ => "IOCTL_UNKNOWN",
    }
}

/// An open, exclusively owned channel to a block device or volume.
///
/// Dropping the value releases the underlying OS handle. A handle is used
/// from one thread at a time; it is not shared.
pub trait DeviceControl {
    /// Issue one synchronous control query.
    ///
    /// `input` is the request payload (empty for most storage queries) and
    /// `output` receives the reply. Returns the number of bytes written into
    /// `output`.
    fn control(&self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize>;
}

impl<T: DeviceControl + ?Sized> DeviceControl for &T {
    fn control(&self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize> {
        (**self).control(code, input, output)
    }
}

impl<T: DeviceControl + ?Sized> DeviceControl for Box<T> {
    fn control(&self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize> {
        (**self).control(code, input, output)
    }
}

/// Query a fixed-size structure that takes no input payload.
///
/// Fails when the reply is shorter than `min_len` bytes.
pub fn query_fixed<const N: usize, H>(handle: &H, code: u32, min_len: usize) -> Result<[u8; N]>
where
    H: DeviceControl + ?Sized,
{
    let mut output = [0u8; N];
    let returned = handle.control(code, &[], &mut output)?;
    if returned < min_len {
        return Err(Error::query_failed(
            control_name(code),
            format!("short reply: {} of {} bytes", returned, min_len),
        ));
    }
    Ok(output)
}

/// Query a variable-length descriptor in two phases.
///
/// The first call asks only for the descriptor header to learn the total
/// size the reply needs; the second call fetches the whole descriptor into a
/// zeroed buffer of that size. The returned buffer is truncated to the bytes
/// the device actually wrote.
pub fn query_variable_length<H>(handle: &H, code: u32, input: &[u8]) -> Result<Vec<u8>>
where
    H: DeviceControl + ?Sized,
{
    let mut header = [0u8; DESCRIPTOR_HEADER_SIZE];
    let returned = handle.control(code, input, &mut header)?;
    if returned < DESCRIPTOR_HEADER_SIZE {
        return Err(Error::query_failed(
            control_name(code),
            format!("short descriptor header: {} bytes", returned),
        ));
    }

    let size = le_u32(&header, 4).unwrap_or(0) as usize;
    if size < DESCRIPTOR_HEADER_SIZE || size > MAX_VARIABLE_REPLY {
        return Err(Error::query_failed(
            control_name(code),
            format!("implausible descriptor size {}", size),
        ));
    }

    let mut buffer = vec![0u8; size];
    let returned = handle.control(code, input, &mut buffer)?;
    buffer.truncate(returned.min(size));
    Ok(buffer)
}

pub(crate) fn le_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

pub(crate) fn le_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn le_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub(crate) fn le_i64(buf: &[u8], offset: usize) -> Option<i64> {
    let bytes = buf.get(offset..offset.checked_add(8)?)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(i64::from_le_bytes(raw))
}
