// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2024 NervoSys

//! Windows device host
//!
//! Devices are opened with `std::fs::OpenOptions` so the handle is owned by a
//! `File` and closed when it drops, on every path out of a query. Control
//! queries go through `DeviceIoControl`; drive-letter masks come from the
//! process device map with `GetLogicalDrives` as the fallback.

use crate::disk::handle::{DeviceHost, DevicePath};
use crate::disk::ioctl::{control_name, DeviceControl};
use crate::error::{Error, Result, UnavailableReason};
use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::mem;
use std::os::windows::fs::OpenOptionsExt;
use std::os::windows::io::AsRawHandle;
use windows::Wdk::System::Threading::{NtQueryInformationProcess, PROCESSINFOCLASS};
use windows::Win32::Foundation::{
    ERROR_INVALID_FUNCTION, ERROR_NOT_SUPPORTED, HANDLE,
};
use windows::Win32::Storage::FileSystem::GetLogicalDrives;
use windows::Win32::System::Threading::GetCurrentProcess;
use windows::Win32::System::IO::DeviceIoControl;

const FILE_READ_ATTRIBUTES: u32 = 0x0000_0080;
const SYNCHRONIZE: u32 = 0x0010_0000;
const FILE_SHARE_READ: u32 = 0x0000_0001;
const FILE_SHARE_WRITE: u32 = 0x0000_0002;

const PROCESS_DEVICE_MAP: PROCESSINFOCLASS = PROCESSINFOCLASS(23);

#[repr(C)]
#[derive(Clone, Copy)]
struct DeviceMapQuery {
    drive_map: u32,
    drive_type: [u8; 32],
}

#[repr(C)]
union DeviceMapInformation {
    set_directory: *mut c_void,
    query: DeviceMapQuery,
}

/// PROCESS_DEVICEMAP_INFORMATION_EX
#[repr(C)]
struct ProcessDeviceMapInformationEx {
    information: DeviceMapInformation,
    flags: u32,
}

/// Live Windows system
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsHost;

impl WindowsHost {
    pub fn new() -> Self {
        Self
    }
}

/// Open device handle, closed on drop
#[derive(Debug)]
pub struct WindowsDevice {
    file: File,
}

impl WindowsDevice {
    fn as_handle(&self) -> HANDLE {
        HANDLE(self.file.as_raw_handle())
    }
}

impl DeviceControl for WindowsDevice {
    fn control(&self, code: u32, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut bytes_returned: u32 = 0;

        let result = unsafe {
            DeviceIoControl(
                self.as_handle(),
                code,
                (!input.is_empty()).then(|| input.as_ptr() as *const c_void),
                input.len() as u32,
                (!output.is_empty()).then(|| output.as_mut_ptr() as *mut c_void),
                output.len() as u32,
                Some(&mut bytes_returned),
                None,
            )
        };

        match result {
            Ok(()) => Ok(bytes_returned as usize),
            Err(e)
                if e.code() == ERROR_INVALID_FUNCTION.to_hresult()
                    || e.code() == ERROR_NOT_SUPPORTED.to_hresult() =>
            {
                Err(Error::QueryUnsupported {
                    control: control_name(code),
                })
            }
            Err(e) => Err(Error::query_failed(control_name(code), e.message())),
        }
    }
}

impl DeviceHost for WindowsHost {
    type Handle = WindowsDevice;

    fn open(&self, path: &DevicePath) -> Result<WindowsDevice> {
        let path = path.to_string();

        // No FILE_FLAG_BACKUP_SEMANTICS, so directories are refused; no
        // FILE_FLAG_OVERLAPPED, so I/O is synchronous.
        OpenOptions::new()
            .access_mode(FILE_READ_ATTRIBUTES | SYNCHRONIZE)
            .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
            .open(&path)
            .map(|file| WindowsDevice { file })
            .map_err(|e| Error::DeviceUnavailable {
                reason: UnavailableReason::from_io(&e),
                path,
            })
    }

    fn process_drive_map(&self) -> Result<u32> {
        let mut info: ProcessDeviceMapInformationEx = unsafe { mem::zeroed() };

        let status = unsafe {
            NtQueryInformationProcess(
                GetCurrentProcess(),
                PROCESS_DEVICE_MAP,
                &mut info as *mut _ as *mut c_void,
                mem::size_of::<ProcessDeviceMapInformationEx>() as u32,
                std::ptr::null_mut(),
            )
        };

        if status.is_err() {
            return Err(Error::NotSupported(format!(
                "ProcessDeviceMap query failed: 0x{:08X}",
                status.0
            )));
        }

        Ok(unsafe { info.information.query.drive_map })
    }

    fn logical_drives(&self) -> u32 {
        unsafe { GetLogicalDrives() }
    }
}
