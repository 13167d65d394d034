//! Drive-letter mapper
//!
//! Physical device enumeration order is not a reliable way to find the
//! volumes on a disk, so the mapping is built the other way round: every
//! active drive letter is opened, asked for its physical device number, and
//! grouped under that number.

use crate::disk::handle::{DeviceHost, DevicePath};
use crate::disk::number::{query_device_number, DeviceNumber};
use crate::error::{Error, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const LETTER_COUNT: u32 = 26;

/// Ordered, duplicate-free drive letters, displayed comma-joined ("C,D")
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DriveLetterSet {
    letters: Vec<char>,
}

impl DriveLetterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a letter; letters already present are ignored
    pub fn push(&mut self, letter: char) {
        let letter = letter.to_ascii_uppercase();
        if !self.letters.contains(&letter) {
            self.letters.push(letter);
        }
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn contains(&self, letter: char) -> bool {
        self.letters.contains(&letter.to_ascii_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    /// Parse the comma-joined form; the empty string is the empty set
    pub fn parse(text: &str) -> Result<Self> {
        let mut set = Self::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let letter = part.trim_end_matches(':');
            let mut chars = letter.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => set.push(c),
                _ => return Err(Error::Parse(format!("invalid drive letter '{}'", part))),
            }
        }
        Ok(set)
    }
}

impl fmt::Display for DriveLetterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut joined = String::with_capacity(self.letters.len() * 2);
        for letter in &self.letters {
            joined.push(*letter);
            joined.push(',');
        }
        // drop the separator after the last letter
        joined.pop();
        f.write_str(&joined)
    }
}

impl FromStr for DriveLetterSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<DriveLetterSet> for String {
    fn from(set: DriveLetterSet) -> Self {
        set.to_string()
    }
}

impl TryFrom<String> for DriveLetterSet {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::parse(&text)
    }
}

/// Bitmask of active drive letters (bit 0 = A .. bit 25 = Z).
///
/// Prefers the process device map and falls back to the system-wide logical
/// drive mask when that query fails.
pub fn active_drive_mask<H: DeviceHost + ?Sized>(host: &H) -> u32 {
    match host.process_drive_map() {
        Ok(mask) => mask,
        Err(e) => {
            debug!("process device map unavailable ({}), using logical drives", e);
            host.logical_drives()
        }
    }
}

/// Open the drive letter and resolve its device number.
///
/// Open failures and resolver failures both mean "not correlatable" and are
/// reported as `None`. The handle is released before returning.
fn resolve_letter<H: DeviceHost + ?Sized>(host: &H, path: &DevicePath) -> Option<DeviceNumber> {
    let handle = match host.open(path) {
        Ok(handle) => handle,
        Err(e) => {
            trace!("skipping {}: {}", path, e);
            return None;
        }
    };

    match query_device_number(&handle) {
        Ok(number) => Some(number),
        Err(e) => {
            trace!("skipping {}: {}", path, e);
            None
        }
    }
}

fn scan_letters<H, F>(host: &H, mut visit: F)
where
    H: DeviceHost + ?Sized,
    F: FnMut(char, DeviceNumber),
{
    let mask = active_drive_mask(host);

    for bit in (0..LETTER_COUNT).filter(|bit| mask & (1 << bit) != 0) {
        let letter = (b'A' + bit as u8) as char;
        let path = DevicePath::DriveLetter(letter);

        if let Some(number) = resolve_letter(host, &path) {
            visit(letter, number);
        }
    }
}

/// Drive letters mounted on physical device `index`, in A-Z order.
///
/// Never fails: letters that cannot be opened or resolved are skipped, and a
/// device with no letters (or no such device) yields the empty set.
pub fn query_drive_letters_for_device<H: DeviceHost + ?Sized>(
    host: &H,
    index: u32,
) -> DriveLetterSet {
    let mut set = DriveLetterSet::new();
    scan_letters(host, |letter, number| {
        if number.index == index {
            set.push(letter);
        }
    });
    set
}

/// Reverse map from physical device index to its drive letters, in one scan
pub fn map_drive_letters<H: DeviceHost + ?Sized>(host: &H) -> BTreeMap<u32, DriveLetterSet> {
    let mut map: BTreeMap<u32, DriveLetterSet> = BTreeMap::new();
    scan_letters(host, |letter, number| {
        map.entry(number.index).or_default().push(letter);
    });
    map
}
