//! Snapshot of the currently mounted filesystems.

#[cfg(any(target_os = "macos", test))]
use std::ffi::c_char;

use crate::error::VolumeError;
use crate::volume::MountRecord;

#[cfg(target_os = "linux")]
const MOUNT_TABLE: &str = "/proc/self/mounts";

/// Lists every mounted filesystem, pseudo filesystems included, in the order
/// the kernel reports them.
#[cfg(target_os = "linux")]
pub fn mounted_volumes() -> Result<Vec<MountRecord>, VolumeError> {
    let table = std::fs::read_to_string(MOUNT_TABLE).map_err(VolumeError::MountTable)?;
    Ok(parse_mount_table(&table))
}

/// Lists every mounted filesystem as reported by `getfsstat`, with the mount
/// source (`/dev/disk1s1`, `devfs`, ...) as the device.
#[cfg(target_os = "macos")]
pub fn mounted_volumes() -> Result<Vec<MountRecord>, VolumeError> {
    use std::{io, mem, ptr};

    // SAFETY: a null buffer only queries the number of mounted filesystems.
    let count = unsafe { libc::getfsstat(ptr::null_mut(), 0, libc::MNT_NOWAIT) };
    if count < 0 {
        return Err(VolumeError::MountTable(io::Error::last_os_error()));
    }
    // SAFETY: `statfs` is a plain C struct, all zeroes is a valid value.
    let mut buf = vec![unsafe { mem::zeroed::<libc::statfs>() }; count as usize];
    let size = libc::c_int::try_from(buf.len() * mem::size_of::<libc::statfs>())
        .map_err(|_| VolumeError::MountTable(io::Error::other("mount table too large")))?;
    // SAFETY: `buf` holds exactly `size` bytes of `statfs` entries.
    let filled = unsafe { libc::getfsstat(buf.as_mut_ptr(), size, libc::MNT_NOWAIT) };
    if filled < 0 {
        return Err(VolumeError::MountTable(io::Error::last_os_error()));
    }
    Ok(buf
        .iter()
        .take(filled as usize)
        .map(|entry| statfs_record(&entry.f_mntonname, &entry.f_mntfromname))
        .collect())
}

/// Builds a record from the fixed-size, NUL-terminated name fields of a
/// `statfs` entry.
#[cfg(any(target_os = "macos", test))]
fn statfs_record(mount_on: &[c_char], mount_from: &[c_char]) -> MountRecord {
    MountRecord::new(c_field(mount_on), c_field(mount_from))
}

#[cfg(any(target_os = "macos", test))]
fn c_field(field: &[c_char]) -> String {
    let bytes: Vec<u8> = field
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Lists every disk known to the system. The device is the disk name the
/// platform reports.
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn mounted_volumes() -> Result<Vec<MountRecord>, VolumeError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    Ok(disks
        .list()
        .iter()
        .map(|disk| {
            MountRecord::new(
                disk.mount_point().to_string_lossy(),
                disk.name().to_string_lossy(),
            )
        })
        .collect())
}

/// Parses the `fstab`-style table exposed in `/proc/<pid>/mounts`.
///
/// Lines with fewer than two fields are ignored.
pub fn parse_mount_table(table: &str) -> Vec<MountRecord> {
    table
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_ascii_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            Some(MountRecord::new(unescape(mount_point), unescape(device)))
        })
        .collect()
}

/// Decodes the three-digit octal escapes the kernel uses for whitespace and
/// backslashes in mount table fields.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = match bytes[i] {
            b'\\' => bytes.get(i + 1..i + 4).filter(|digits| is_octal_escape(digits)),
            _ => None,
        };
        match escape {
            Some(digits) => {
                let value = digits
                    .iter()
                    .fold(0u8, |acc, digit| acc * 8 + (digit - b'0'));
                out.push(value);
                i += 4;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}
