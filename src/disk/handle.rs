//! Device handle opener
//!
//! Builds `\\.\PhysicalDriveN` and `\\.\X:` paths and opens them through a
//! [`DeviceHost`], the read-only view of the ambient OS state this crate
//! queries.

use crate::disk::ioctl::DeviceControl;
use crate::error::{Error, Result, UnavailableReason};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Path of a block device or volume that can be opened for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DevicePath {
    /// `\\.\PhysicalDriveN`
    PhysicalDrive(u32),
    /// `\\.\X:` (always upper case)
    DriveLetter(char),
}

impl DevicePath {
    /// Path for a drive letter, `None` unless the letter is A-Z (either case)
    pub fn drive_letter(letter: char) -> Option<Self> {
        letter
            .is_ascii_alphabetic()
            .then(|| DevicePath::DriveLetter(letter.to_ascii_uppercase()))
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePath::PhysicalDrive(index) => write!(f, r"\\.\PhysicalDrive{}", index),
            DevicePath::DriveLetter(letter) => write!(f, r"\\.\{}:", letter),
        }
    }
}

/// Ambient OS state: device opening and the active drive-letter bitmasks.
///
/// Every method reads the current state; nothing is cached between calls.
pub trait DeviceHost {
    /// Handle type produced by [`DeviceHost::open`]
    type Handle: DeviceControl;

    /// Open `path` for attribute-read access, shared read/write, synchronous,
    /// failing when the path names a directory.
    fn open(&self, path: &DevicePath) -> Result<Self::Handle>;

    /// Drive-letter bitmask from the calling process's device map
    fn process_drive_map(&self) -> Result<u32>;

    /// System-wide logical-drive bitmask
    fn logical_drives(&self) -> u32;
}

impl<T: DeviceHost + ?Sized> DeviceHost for &T {
    type Handle = T::Handle;

    fn open(&self, path: &DevicePath) -> Result<Self::Handle> {
        (**self).open(path)
    }

    fn process_drive_map(&self) -> Result<u32> {
        (**self).process_drive_map()
    }

    fn logical_drives(&self) -> u32 {
        (**self).logical_drives()
    }
}

/// Open `\\.\PhysicalDrive{index}`
pub fn open_physical_drive<H: DeviceHost + ?Sized>(host: &H, index: u32) -> Result<H::Handle> {
    host.open(&DevicePath::PhysicalDrive(index))
}

/// Open `\\.\{letter}:`
pub fn open_drive_letter_device<H: DeviceHost + ?Sized>(
    host: &H,
    letter: char,
) -> Result<H::Handle> {
    let path = DevicePath::drive_letter(letter).ok_or_else(|| Error::DeviceUnavailable {
        path: format!(r"\\.\{}:", letter),
        reason: UnavailableReason::Other,
    })?;
    host.open(&path)
}
