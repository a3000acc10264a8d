//! Canonical CSV tables delivered to the export collaborator when a
//! full experiment completes: one `(id,time,device)` table per device
//! bucket plus the `(id,cursor_diameter)` table for the enlarged-cursor
//! phase. Rows keep trial order; nothing is re-sorted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::experiment::{Device, DeviceBuckets};
use crate::trial::TrialSample;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTables {
    pub mouse: String,
    pub gamepad: String,
    pub gamepad_cursor: String,
    pub cursor_diameter: String,
}

impl ExportTables {
    pub fn from_buckets(buckets: &DeviceBuckets) -> csv::Result<Self> {
        Ok(Self {
            mouse: device_table(&buckets.mouse, Device::Mouse)?,
            gamepad: device_table(&buckets.gamepad, Device::GamepadPointer)?,
            gamepad_cursor: device_table(&buckets.gamepad_cursor, Device::GamepadCursor)?,
            cursor_diameter: cursor_diameter_table(&buckets.gamepad_cursor)?,
        })
    }

    /// Writes the four tables under `dir` with the canonical file
    /// names; returns the paths written.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let files = [
            ("data_mouse.csv", &self.mouse),
            ("data_gamepad.csv", &self.gamepad),
            ("data_gamepad_cursor.csv", &self.gamepad_cursor),
            ("data_gamepad_cursor_diameter.csv", &self.cursor_diameter),
        ];

        let mut paths = Vec::with_capacity(files.len());
        for (name, content) in files {
            let path = dir.join(name);
            fs::write(&path, content)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> csv::Result<String> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn device_table(samples: &[TrialSample], device: Device) -> csv::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["id", "time", "device"])?;
    let tag = device.to_string();
    for s in samples {
        wtr.write_record([s.id.to_string(), s.time.to_string(), tag.clone()])?;
    }
    finish(wtr)
}

/// One row per ID class with the cursor diameter measured for it. The
/// bucket carries the diameter on every trial; the table keeps each
/// class's last occurrence, in the order those last occurrences appear.
fn cursor_diameter_table(samples: &[TrialSample]) -> csv::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["id", "cursor_diameter"])?;
    for (i, s) in samples.iter().enumerate() {
        let appears_later = samples[i + 1..].iter().any(|other| other.id == s.id);
        if !appears_later {
            wtr.write_record([
                s.id.to_string(),
                s.cursor_diameter.unwrap_or(0.0).to_string(),
            ])?;
        }
    }
    finish(wtr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(id: f64, time: f64, cursor: Option<f64>) -> TrialSample {
        TrialSample {
            id,
            time,
            distance: 300.0,
            width: 40.0,
            cursor_diameter: cursor,
        }
    }

    #[test]
    fn test_device_table_header_and_rows() {
        let rows = vec![sample(2.5, 430.0, None), sample(1.5, 380.0, None)];
        let csv = device_table(&rows, Device::Mouse).unwrap();
        assert_eq!(csv, "id,time,device\n2.5,430,mouse\n1.5,380,mouse\n");
    }

    #[test]
    fn test_rows_keep_trial_order() {
        let rows = vec![
            sample(4.0, 900.0, None),
            sample(1.5, 300.0, None),
            sample(3.0, 700.0, None),
        ];
        let csv = device_table(&rows, Device::GamepadPointer).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "4,900,gamepad");
        assert_eq!(lines[2], "1.5,300,gamepad");
        assert_eq!(lines[3], "3,700,gamepad");
    }

    #[test]
    fn test_cursor_diameter_dedup_keeps_last_occurrence() {
        let rows = vec![
            sample(2.0, 400.0, Some(18.0)),
            sample(3.0, 500.0, Some(25.0)),
            sample(2.0, 420.0, Some(19.0)),
        ];
        let csv = cursor_diameter_table(&rows).unwrap();
        assert_eq!(csv, "id,cursor_diameter\n3,25\n2,19\n");
    }

    #[test]
    fn test_empty_buckets_still_export_headers() {
        let tables = ExportTables::from_buckets(&DeviceBuckets::default()).unwrap();
        assert_eq!(tables.mouse, "id,time,device\n");
        assert_eq!(tables.cursor_diameter, "id,cursor_diameter\n");
    }

    #[test]
    fn test_write_to_dir() {
        let mut buckets = DeviceBuckets::default();
        buckets.mouse.push(sample(2.0, 400.0, None));
        buckets.gamepad_cursor.push(sample(2.0, 600.0, Some(21.0)));

        let tables = ExportTables::from_buckets(&buckets).unwrap();
        let dir = tempdir().unwrap();
        let paths = tables.write_to_dir(dir.path()).unwrap();

        assert_eq!(paths.len(), 4);
        let mouse = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(mouse.starts_with("id,time,device\n"));
        let diam = std::fs::read_to_string(&paths[3]).unwrap();
        assert_eq!(diam, "id,cursor_diameter\n2,21\n");
    }
}
