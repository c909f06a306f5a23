//! Build date of a package, taken from its first archived file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use super::parse_date;

const CAB_SIGNATURE: &[u8; 4] = b"MSCF";
const CAB_HEADER_LEN: usize = 36;
const CAB_FILE_ENTRY_LEN: usize = 16;

/// Platform access to the modified time of the first entry inside a package
pub trait FileTimestampProbe {
    /// Modified time as display text
    fn modified_text(&self, package: &Path) -> io::Result<String>;
}

/// Reads the DOS timestamp of the first `CFFILE` entry of a cabinet.
///
/// Both CBS and SPKG packages are cabinets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CabinetTimestampProbe;

impl FileTimestampProbe for CabinetTimestampProbe {
    fn modified_text(&self, package: &Path) -> io::Result<String> {
        let mut file = File::open(package)?;

        let mut header = [0u8; CAB_HEADER_LEN];
        file.read_exact(&mut header)?;
        if &header[0..4] != CAB_SIGNATURE {
            return Err(invalid("not a cabinet file"));
        }

        let files_offset = u32::from_le_bytes([header[16], header[17], header[18], header[19]]);
        let file_count = u16::from_le_bytes([header[28], header[29]]);
        if file_count == 0 {
            return Err(invalid("cabinet has no files"));
        }

        let mut entry = [0u8; CAB_FILE_ENTRY_LEN];
        file.seek(SeekFrom::Start(u64::from(files_offset)))?;
        file.read_exact(&mut entry)?;

        let date = u16::from_le_bytes([entry[10], entry[11]]);
        let time = u16::from_le_bytes([entry[12], entry[13]]);
        let modified = dos_date_time(date, time).ok_or_else(|| invalid("invalid DOS timestamp"))?;

        Ok(modified.format("%m/%d/%Y %H:%M:%S").to_string())
    }
}

fn dos_date_time(date: u16, time: u16) -> Option<NaiveDateTime> {
    let year = i32::from((date >> 9) & 0x7f) + 1980;
    let month = u32::from((date >> 5) & 0x0f);
    let day = u32::from(date & 0x1f);
    let hour = u32::from(time >> 11);
    let minute = u32::from((time >> 5) & 0x3f);
    let second = u32::from(time & 0x1f) * 2;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

/// Outcome of a timestamp probe
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimestampReport {
    /// Text returned by the probe, empty when the probe failed
    pub raw: String,
    pub modified: Option<NaiveDateTime>,
}

/// Probe and parse the modified time of a package. Failures only produce an
/// empty report.
pub fn inspect_timestamp(probe: &dyn FileTimestampProbe, package: &Path) -> TimestampReport {
    let raw = match probe.modified_text(package) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Could not read file date of {}: {}", package.display(), e);
            return TimestampReport::default();
        }
    };
    let modified = parse_date(&raw);
    if modified.is_none() {
        log::warn!("Could not parse file date {:?}", raw);
    }
    TimestampReport { raw, modified }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    /// Minimal cabinet: header, one folder, one file entry
    fn cabinet(date: u16, time: u16) -> Vec<u8> {
        let mut cab = Vec::new();
        cab.extend_from_slice(b"MSCF");
        cab.extend_from_slice(&0u32.to_le_bytes()); // reserved1
        cab.extend_from_slice(&64u32.to_le_bytes()); // cbCabinet
        cab.extend_from_slice(&0u32.to_le_bytes()); // reserved2
        cab.extend_from_slice(&44u32.to_le_bytes()); // coffFiles
        cab.extend_from_slice(&0u32.to_le_bytes()); // reserved3
        cab.extend_from_slice(&[3, 1]); // version
        cab.extend_from_slice(&1u16.to_le_bytes()); // cFolders
        cab.extend_from_slice(&1u16.to_le_bytes()); // cFiles
        cab.extend_from_slice(&0u16.to_le_bytes()); // flags
        cab.extend_from_slice(&0u16.to_le_bytes()); // setID
        cab.extend_from_slice(&0u16.to_le_bytes()); // iCabinet
        cab.extend_from_slice(&[0u8; 8]); // CFFOLDER
        cab.extend_from_slice(&5u32.to_le_bytes()); // cbFile
        cab.extend_from_slice(&0u32.to_le_bytes()); // uoffFolderStart
        cab.extend_from_slice(&0u16.to_le_bytes()); // iFolder
        cab.extend_from_slice(&date.to_le_bytes());
        cab.extend_from_slice(&time.to_le_bytes());
        cab.extend_from_slice(&0x20u16.to_le_bytes()); // attribs
        cab.extend_from_slice(b"a.txt\0");
        cab
    }

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), bytes).unwrap();
        file
    }

    #[test]
    fn test_cabinet_probe() {
        // 2017-10-26 15:07:10
        let date = ((2017 - 1980) << 9) | (10 << 5) | 26;
        let time = (15 << 11) | (7 << 5) | 5;
        let file = write_temp(&cabinet(date, time));

        let text = CabinetTimestampProbe.modified_text(file.path()).unwrap();
        assert_eq!(text, "10/26/2017 15:07:10");

        let report = inspect_timestamp(&CabinetTimestampProbe, file.path());
        assert_eq!(
            report.modified,
            NaiveDate::from_ymd_opt(2017, 10, 26).unwrap().and_hms_opt(15, 7, 10)
        );
    }

    #[test]
    fn test_cabinet_probe_rejects_other_files() {
        let file = write_temp(b"PK\x03\x04 this is a zip archive, not a cabinet");
        let err = CabinetTimestampProbe.modified_text(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_inspect_timestamp_failure_is_empty() {
        let report = inspect_timestamp(&CabinetTimestampProbe, Path::new("/nonexistent/a.cab"));
        assert_eq!(report, TimestampReport::default());
    }

    struct FixedProbe(&'static str);

    impl FileTimestampProbe for FixedProbe {
        fn modified_text(&self, _package: &Path) -> io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_inspect_timestamp_unparsable() {
        let report = inspect_timestamp(&FixedProbe("someday"), Path::new("a.cab"));
        assert_eq!(report.raw, "someday");
        assert_eq!(report.modified, None);
    }
}
