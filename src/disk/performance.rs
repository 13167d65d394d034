//! Disk performance counters (DISK_PERFORMANCE)
//!
//! Counters are cumulative since the counters were enabled; rates need two
//! snapshots, see [`PerformanceSnapshot::delta`].

use crate::disk::ioctl::{
    control_name, le_i64, le_u16, le_u32, query_fixed, DeviceControl, IOCTL_DISK_PERFORMANCE,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DISK_PERFORMANCE_SIZE: usize = 88;
/// Everything up to and including StorageDeviceNumber
const DISK_PERFORMANCE_MIN_SIZE: usize = 68;
/// Counter times are in 100 ns ticks
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Raw performance counters of one disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// Cumulative time spent on reads (100 ns ticks)
    pub read_time: u64,
    /// Cumulative time spent on writes (100 ns ticks)
    pub write_time: u64,
    /// Cumulative idle time (100 ns ticks)
    pub idle_time: u64,
    pub read_count: u32,
    pub write_count: u32,
    pub queue_depth: u32,
    pub split_count: u32,
    /// Timestamp of the sample (100 ns ticks, system time base)
    pub query_time: u64,
    pub storage_device_number: u32,
    /// Name of the storage manager that maintains the counters ("PhysDisk", "VolMgr ", ...)
    pub storage_manager: String,
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl PerformanceSnapshot {
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < DISK_PERFORMANCE_MIN_SIZE {
            return None;
        }

        let manager: Vec<u16> = (0..8)
            .map_while(|i| le_u16(buf, 68 + i * 2))
            .take_while(|&c| c != 0)
            .collect();

        Some(Self {
            bytes_read: non_negative(le_i64(buf, 0)?),
            bytes_written: non_negative(le_i64(buf, 8)?),
            read_time: non_negative(le_i64(buf, 16)?),
            write_time: non_negative(le_i64(buf, 24)?),
            idle_time: non_negative(le_i64(buf, 32)?),
            read_count: le_u32(buf, 40)?,
            write_count: le_u32(buf, 44)?,
            queue_depth: le_u32(buf, 48)?,
            split_count: le_u32(buf, 52)?,
            query_time: non_negative(le_i64(buf, 56)?),
            storage_device_number: le_u32(buf, 64)?,
            storage_manager: String::from_utf16_lossy(&manager).trim_end().to_string(),
        })
    }

    pub fn total_operations(&self) -> u64 {
        self.read_count as u64 + self.write_count as u64
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes_read.saturating_add(self.bytes_written)
    }

    /// Mean time per request, `None` when no request has completed
    pub fn average_latency(&self) -> Option<Duration> {
        average_latency(
            self.read_time.saturating_add(self.write_time),
            self.total_operations(),
        )
    }

    /// Counter changes since `previous`. Counters that went backwards (reset
    /// or a different device) are reported as zero.
    pub fn delta(&self, previous: &PerformanceSnapshot) -> PerformanceDelta {
        PerformanceDelta {
            bytes_read: self.bytes_read.saturating_sub(previous.bytes_read),
            bytes_written: self.bytes_written.saturating_sub(previous.bytes_written),
            read_count: self.read_count.saturating_sub(previous.read_count) as u64,
            write_count: self.write_count.saturating_sub(previous.write_count) as u64,
            busy_time: self
                .read_time
                .saturating_add(self.write_time)
                .saturating_sub(previous.read_time.saturating_add(previous.write_time)),
            elapsed: self.query_time.saturating_sub(previous.query_time),
        }
    }
}

fn average_latency(busy_ticks: u64, operations: u64) -> Option<Duration> {
    if operations == 0 {
        return None;
    }
    Some(ticks_to_duration(busy_ticks / operations))
}

fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::new(
        ticks / TICKS_PER_SECOND,
        ((ticks % TICKS_PER_SECOND) * 100) as u32,
    )
}

/// Difference between two snapshots of the same disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceDelta {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub read_count: u64,
    pub write_count: u64,
    /// Read + write time accumulated in the interval (100 ns ticks)
    pub busy_time: u64,
    /// Interval between the two samples' query times (100 ns ticks)
    pub elapsed: u64,
}

impl PerformanceDelta {
    /// Mean time per request completed in the interval
    pub fn average_latency(&self) -> Option<Duration> {
        average_latency(self.busy_time, self.read_count + self.write_count)
    }

    /// Per-second rates over `elapsed`; falls back to the counters' own
    /// query-time interval when `elapsed` is zero.
    pub fn rates(&self, elapsed: Duration) -> PerformanceRates {
        let seconds = if elapsed.is_zero() {
            ticks_to_duration(self.elapsed).as_secs_f64()
        } else {
            elapsed.as_secs_f64()
        };

        if seconds <= 0.0 {
            return PerformanceRates::default();
        }

        PerformanceRates {
            read_bytes_per_sec: self.bytes_read as f64 / seconds,
            write_bytes_per_sec: self.bytes_written as f64 / seconds,
            reads_per_sec: self.read_count as f64 / seconds,
            writes_per_sec: self.write_count as f64 / seconds,
        }
    }
}

/// Throughput and IOPS over an interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRates {
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
    pub reads_per_sec: f64,
    pub writes_per_sec: f64,
}

/// Read the disk's performance counters.
///
/// Errors are returned to the caller: an all-zero record would be
/// indistinguishable from an idle disk.
pub fn query_performance_snapshot<H: DeviceControl + ?Sized>(
    handle: &H,
) -> Result<PerformanceSnapshot> {
    let raw = query_fixed::<DISK_PERFORMANCE_SIZE, _>(
        handle,
        IOCTL_DISK_PERFORMANCE,
        DISK_PERFORMANCE_MIN_SIZE,
    )?;
    PerformanceSnapshot::decode(&raw).ok_or_else(|| {
        Error::query_failed(control_name(IOCTL_DISK_PERFORMANCE), "malformed DISK_PERFORMANCE")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::mock::{MockDevice, MockFailure};

    fn snapshot() -> PerformanceSnapshot {
        PerformanceSnapshot {
            bytes_read: 4096 * 1000,
            bytes_written: 4096 * 500,
            read_time: 2_000_000,
            write_time: 1_000_000,
            idle_time: 90_000_000,
            read_count: 1000,
            write_count: 500,
            queue_depth: 2,
            split_count: 3,
            query_time: 133_000_000_000,
            storage_device_number: 1,
            storage_manager: "PhysDisk".to_string(),
        }
    }

    #[test]
    fn test_query_snapshot() {
        let handle = MockDevice::new().with_performance(&snapshot()).into_handle();
        let decoded = query_performance_snapshot(&handle).unwrap();
        assert_eq!(decoded, snapshot());
        assert_eq!(decoded.total_operations(), 1500);
        assert_eq!(decoded.total_bytes(), 4096 * 1500);
    }

    #[test]
    fn test_query_failure_propagates() {
        let handle = MockDevice::new()
            .with_failure(IOCTL_DISK_PERFORMANCE, MockFailure::Failed)
            .into_handle();
        assert!(matches!(
            query_performance_snapshot(&handle),
            Err(Error::QueryFailed { .. })
        ));
    }

    #[test]
    fn test_short_reply_rejected() {
        let handle = MockDevice::new()
            .with_reply(IOCTL_DISK_PERFORMANCE, vec![0u8; 40])
            .into_handle();
        assert!(query_performance_snapshot(&handle).is_err());
    }

    #[test]
    fn test_average_latency() {
        // 3_000_000 ticks over 1500 requests = 2000 ticks = 200 us
        assert_eq!(
            snapshot().average_latency(),
            Some(Duration::from_micros(200))
        );
        assert_eq!(PerformanceSnapshot::default().average_latency(), None);
    }

    #[test]
    fn test_delta_and_rates() {
        let before = snapshot();
        let mut after = snapshot();
        after.bytes_read += 1024 * 1024;
        after.bytes_written += 512 * 1024;
        after.read_count += 100;
        after.write_count += 50;
        after.read_time += 15_000;
        after.query_time += TICKS_PER_SECOND * 2;

        let delta = after.delta(&before);
        assert_eq!(delta.bytes_read, 1024 * 1024);
        assert_eq!(delta.read_count, 100);
        assert_eq!(delta.write_count, 50);
        assert_eq!(delta.elapsed, TICKS_PER_SECOND * 2);
        assert_eq!(delta.average_latency(), Some(Duration::from_micros(10)));

        let rates = delta.rates(Duration::ZERO);
        assert_eq!(rates.read_bytes_per_sec, 512.0 * 1024.0);
        assert_eq!(rates.reads_per_sec, 50.0);

        let rates = delta.rates(Duration::from_secs(1));
        assert_eq!(rates.writes_per_sec, 50.0);
    }

    #[test]
    fn test_delta_counter_reset() {
        let delta = PerformanceSnapshot::default().delta(&snapshot());
        assert_eq!(delta, PerformanceDelta::default());
        assert_eq!(delta.rates(Duration::ZERO), PerformanceRates::default());
    }
}
