//! Recorded landmark frames read from CSV.
//!
//! One row per frame. A row holds the landmark coordinates as flat
//! `x,y,z` triplets in face-mesh index order. A row consisting of a single
//! `-` records a frame in which no face was detected. Lines starting with
//! `#` are comments.

use crate::{
    landmarks::{Acquisition, Landmark, LandmarkSet, LandmarkSource},
    Error, Result,
};
use csv::{ReaderBuilder, StringRecord};
use log::info;
use std::{fs::File, io::Read, path::Path};

const NO_FACE_MARKER: &str = "-";

/// Landmark source replaying a CSV recording
pub struct ReplaySource<R: Read = File> {
    reader: csv::Reader<R>,
    record: StringRecord,
    name: String,
    row: u64,
}

impl ReplaySource<File> {
    /// Open a recording. A missing or unreadable file is fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::LandmarkSource(format!("Cannot open recording {}: {e}", path.display()))
        })?;
        info!("Replaying landmarks from {}", path.display());
        Ok(Self::from_reader(file, path.display().to_string()))
    }
}

impl<R: Read + Send> ReplaySource<R> {
    /// Replay from any reader
    pub fn from_reader(reader: R, name: impl Into<String>) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        Self {
            reader,
            record: StringRecord::new(),
            name: name.into(),
            row: 0,
        }
    }

    /// Rows read so far
    #[must_use]
    pub const fn rows_read(&self) -> u64 {
        self.row
    }

    fn parse_record(&self) -> Result<Acquisition> {
        if self.record.len() == 1 && &self.record[0] == NO_FACE_MARKER {
            return Ok(Acquisition::NoFace);
        }

        if self.record.len() % 3 != 0 {
            return Err(Error::LandmarkSource(format!(
                "row {}: {} values is not a whole number of x,y,z triplets",
                self.row,
                self.record.len()
            )));
        }

        let values = self
            .record
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|e| {
                    Error::LandmarkSource(format!("row {}: bad value {field:?}: {e}", self.row))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let points = values
            .chunks_exact(3)
            .map(|xyz| Landmark::new(xyz[0], xyz[1], xyz[2]))
            .collect();

        Ok(Acquisition::Face(LandmarkSet::new(points)))
    }
}

impl<R: Read + Send> LandmarkSource for ReplaySource<R> {
    fn acquire(&mut self) -> Result<Acquisition> {
        if !self.reader.read_record(&mut self.record)? {
            info!("End of recording {} after {} rows", self.name, self.row);
            return Ok(Acquisition::EndOfStream);
        }
        self.row += 1;
        self.parse_record()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Write landmark sets in the replay format
pub fn write_frames<W: std::io::Write>(writer: W, frames: &[Option<LandmarkSet>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    for frame in frames {
        match frame {
            Some(set) => {
                let fields = set
                    .points()
                    .iter()
                    .flat_map(|p| [p.x, p.y, p.z])
                    .map(|v| v.to_string());
                writer.write_record(fields)?;
            }
            None => writer.write_record([NO_FACE_MARKER])?,
        }
    }

    writer.flush()?;
    Ok(())
}
