use crate::frame::Frame;
use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save rows as CSV with a header taken from the field names.
pub fn save_csv<T: Serialize, P: AsRef<Path>>(rows: &[T], path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save rows as pretty JSON array.
pub fn save_json<T: Serialize, P: AsRef<Path>>(rows: &[T], path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Write a bulk-data frame back out as delimited text.
pub fn save_frame_csv<P: AsRef<Path>>(frame: &Frame, path: P, delimiter: u8) -> Result<()> {
    let f = File::create(path)?;
    write_frame(frame, f, delimiter)
}

/// Same as [`save_frame_csv`] into any writer (stdout in the CLI).
pub fn write_frame<W: Write>(frame: &Frame, out: W, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(out);
    wtr.write_record(&frame.columns)?;
    for row in &frame.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Same as [`save_csv`] into any writer.
pub fn write_csv<T: Serialize, W: Write>(rows: &[T], out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let rows = vec![Subject {
            id: "02".into(),
            desc: "Population and elections".into(),
            active: true,
            has_subjects: true,
        }];
        save_csv(&rows, &csvp).unwrap();
        save_json(&rows, &jsonp).unwrap();
        let txt = std::fs::read_to_string(&csvp).unwrap();
        assert!(txt.starts_with("id,desc,active,hasSubjects\n"));
        assert!(jsonp.exists());
    }

    #[test]
    fn frame_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("bulk.csv");
        let frame = Frame {
            columns: vec!["TID".into(), "INDHOLD".into()],
            rows: vec![vec!["2020K1".into(), "1;2".into()]],
        };
        save_frame_csv(&frame, &p, b';').unwrap();
        let back = Frame::from_delimited(File::open(&p).unwrap(), b';').unwrap();
        assert_eq!(back, frame);
    }
}
