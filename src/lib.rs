//! # Storage Monitor (stormon)
//!
//! Physical disk enumeration and per-device queries for Windows hosts: identity
//! (vendor, model, revision, serial), the drive letters mounted on each disk,
//! geometry-derived capacity, raw performance counters, and hot-plug and
//! failure-prediction support.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stormon::disk::{self, DiskDrive};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let host = disk::system_host()?;
//!
//! for summary in disk::enumerate_disks(&host, 32, true) {
//!     println!("{}: {} [{}] {}",
//!         summary.index,
//!         summary.identity.display_name().unwrap_or_default(),
//!         summary.drive_letters,
//!         summary.capacity,
//!     );
//! }
//!
//! let drive = DiskDrive::open(&host, 0)?;
//! let stats = drive.statistics()?;
//! println!("{} reads, {} writes", stats.read_count, stats.write_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Drive letters
//!
//! Physical device numbering cannot be used to find the volumes on a disk,
//! so [`disk::query_drive_letters_for_device`] opens every active drive letter,
//! asks it for its physical device number and keeps the letters that match.
//!
//! ## Platform Support
//!
//! | Platform | Disks | Drive letters | Counters |
//! |----------|-------|---------------|----------|
//! | Windows  | ✅    | ✅            | ✅       |
//! | Linux    | ❌    | ❌            | ❌       |
//! | macOS    | ❌    | ❌            | ❌       |
//!
//! Structure decoding is portable; only [`disk::system_host`] is Windows only.

pub mod config; // Configuration management with TOML persistence
pub mod disk; // Physical disk queries
pub mod error;
pub mod units; // Human-readable sizes and rates

// Re-export main types
pub use config::{Config, DisplayConfig, GeneralConfig, ScanConfig};
pub use disk::{
    DeviceControl, DeviceHost, DeviceIdentity, DeviceNumber, DevicePath, DiskDrive, DiskSummary,
    DriveLetterSet, PerformanceSnapshot,
};
pub use error::{Error, Result, UnavailableReason};
pub use units::format_size;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
