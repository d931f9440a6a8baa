use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, trace, warn};

use crate::{
    binder::Column,
    errors::OutputError,
    schedule::ActiveSchedule,
    units::Unit,
};

/// One output file: a grid, its columns and the rows not yet written.
#[derive(Debug)]
pub struct OutputStream {
    name: String,
    path: PathBuf,
    schedule: ActiveSchedule,
    columns: Vec<Column>,
    time_unit: Unit,
    restart: bool,
    cache: Vec<Vec<f64>>,
    writer: Option<BufWriter<File>>,
    /// File length after the last successful flush.
    committed: Option<u64>,
}

impl OutputStream {
    pub fn new(
        name: String,
        path: PathBuf,
        schedule: ActiveSchedule,
        columns: Vec<Column>,
        time_unit: Unit,
        restart: bool,
    ) -> Self {
        if columns.is_empty() {
            info!("Output stream '{}' has no columns, no file is written", name);
        } else {
            info!("Output stream '{}' writes {} column(s) to '{}'", name, columns.len(), path.display());
        }
        OutputStream {
            name,
            path,
            schedule,
            columns,
            time_unit,
            restart,
            cache: Vec::new(),
            writer: None,
            committed: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schedule(&self) -> &ActiveSchedule {
        &self.schedule
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The header line of the file.
    pub fn header(&self) -> String {
        std::iter::once(format!("Time [{}]", self.time_unit))
            .chain(self.columns.iter().map(|c| c.header.clone()))
            .join("\t")
    }

    /// Rows waiting to be written.
    pub fn cached_rows(&self) -> &[Vec<f64>] {
        &self.cache
    }

    /// Size of the row cache, counting eight bytes per value.
    pub fn cache_bytes(&self) -> usize {
        self.cache.len() * (self.columns.len() + 1) * std::mem::size_of::<f64>()
    }

    pub(crate) fn step_completed(&mut self, t: f64) {
        for column in &mut self.columns {
            column.step_completed(t);
        }
    }

    /// Appends a row to the cache if `t_out` is an instant of this stream's grid.
    ///
    /// `t_time` is written to the time column. Returns true when a row was added.
    pub fn sample_row(&mut self, t_out: f64, t_time: f64) -> bool {
        if self.columns.is_empty() || !self.schedule.is_active(t_out) {
            return false;
        }
        let row: Vec<f64> = std::iter::once(t_time)
            .chain(self.columns.iter_mut().map(|c| c.sample(t_out)))
            .collect();
        trace!("Output stream '{}' sampled at t={}", self.name, t_out);
        self.cache.push(row);
        true
    }

    /// Opens the file for the next flush.
    ///
    /// A file that already holds flushed rows is cut back to the last
    /// successful flush, dropping anything a failed flush left behind.
    fn open(&mut self) -> Result<BufWriter<File>, OutputError> {
        let io_err = |e| OutputError::io(&self.path, e);

        if let Some(len) = self.committed {
            debug!("Reopening '{}' at {} byte(s)", self.path.display(), len);
            let file = OpenOptions::new().append(true).open(&self.path).map_err(io_err)?;
            file.set_len(len).map_err(io_err)?;
            return Ok(BufWriter::new(file));
        }

        if self.restart && self.path.exists() {
            debug!("Appending to '{}'", self.path.display());
            let file = OpenOptions::new().append(true).open(&self.path).map_err(io_err)?;
            self.committed = Some(file.metadata().map_err(io_err)?.len());
            return Ok(BufWriter::new(file));
        }
        if self.restart {
            warn!(
                "Output file '{}' does not exist for restart, creating a new file",
                self.path.display()
            );
        }

        let file = File::create(&self.path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", self.header()).map_err(io_err)?;
        Ok(writer)
    }

    /// Writes all cached rows and clears the cache.
    ///
    /// The file is opened on the first flush that has rows to write. When
    /// writing fails the rows stay cached for the next flush.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        if self.cache.is_empty() {
            return Ok(());
        }
        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open()?,
        };

        let len = write_rows(&mut writer, &self.cache).map_err(|e| OutputError::io(&self.path, e))?;
        debug!("Flushed {} row(s) to '{}'", self.cache.len(), self.path.display());

        self.committed = Some(len);
        self.cache.clear();
        self.writer = Some(writer);
        Ok(())
    }
}

/// Writes `rows` tab-separated and flushes, returning the new file length.
fn write_rows(writer: &mut BufWriter<File>, rows: &[Vec<f64>]) -> io::Result<u64> {
    for row in rows {
        writeln!(writer, "{}", row.iter().join("\t"))?;
    }
    writer.flush()?;
    Ok(writer.get_ref().metadata()?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use crate::core::{EntityCategory, EntityRef};
    use crate::filter::{EntityFilter, IdGroup};
    use crate::request::{QuantityName, Request};
    use crate::resolve::{PlannedRequest, StreamPlan};
    use crate::schedule::{Interval, Schedule};
    use crate::test_utils::MockHost;

    fn stream(dir: &Path, host: &MockHost, restart: bool) -> OutputStream {
        stream_at(dir.join("states.tsv"), host, restart)
    }

    fn stream_at(path: PathBuf, host: &MockHost, restart: bool) -> OutputStream {
        let schedule = Schedule::new("grid", vec![Interval::from_seconds(None, None, Some(10.0))])
            .activate()
            .unwrap();
        let plan = StreamPlan {
            name: "states".to_string(),
            schedule: schedule.clone(),
            requests: vec![PlannedRequest {
                index: 0,
                request: Request::new(QuantityName::new("Temperature"), "grid", "zones"),
                filter: EntityFilter::new("zones", EntityCategory::Zone, IdGroup::all()),
            }],
        };
        let mut columns = bind(&[plan], host).unwrap().unwrap();
        OutputStream::new(
            "states".to_string(),
            path,
            schedule,
            columns.remove(0),
            Unit::parse("s").unwrap(),
            restart,
        )
    }

    fn host() -> MockHost {
        let mut host = MockHost::new();
        host.add_zone(1);
        host.add_scalar(EntityRef::new(EntityCategory::Zone, 1.into()), "Temperature", "K", 290.0);
        host
    }

    #[test]
    fn test_rows_only_on_grid_instants() {
        let dir = tempfile::tempdir().unwrap();
        let host = host();
        let mut stream = stream(dir.path(), &host, false);

        assert!(stream.sample_row(0.0, 0.0));
        assert!(!stream.sample_row(5.0, 5.0));
        assert!(stream.sample_row(10.0, 10.0));
        assert_eq!(stream.cached_rows(), &[vec![0.0, 290.0], vec![10.0, 290.0]]);
        assert_eq!(stream.cache_bytes(), 2 * 2 * 8);
    }

    #[test]
    fn test_empty_flush_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let host = host();
        let mut stream = stream(dir.path(), &host, false);
        stream.flush().unwrap();
        assert!(!stream.path().exists());
    }

    #[test]
    fn test_flush_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let host = host();
        let mut stream = stream(dir.path(), &host, false);
        stream.sample_row(0.0, 0.0);
        stream.flush().unwrap();
        stream.sample_row(10.0, 10.0);
        stream.flush().unwrap();
        assert_eq!(stream.cache_bytes(), 0);

        let content = std::fs::read_to_string(stream.path()).unwrap();
        assert_eq!(content, "Time [s]\tZone(id=1).Temperature [K]\n0\t290\n10\t290\n");
    }

    #[test]
    fn test_restart_appends_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("states.tsv");
        std::fs::write(&path, "Time [s]\tZone(id=1).Temperature [K]\n0\t290\n").unwrap();

        let host = host();
        let mut stream = stream(dir.path(), &host, true);
        stream.sample_row(10.0, 10.0);
        stream.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Time [s]\tZone(id=1).Temperature [K]\n0\t290\n10\t290\n");
    }

    #[test]
    fn test_restart_without_file_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let host = host();
        let mut stream = stream(dir.path(), &host, true);
        stream.sample_row(10.0, 10.0);
        stream.flush().unwrap();
        let content = std::fs::read_to_string(stream.path()).unwrap();
        assert!(content.starts_with("Time [s]\t"));
    }

    #[test]
    fn test_flush_after_failed_write_keeps_earlier_rows() {
        let dir = tempfile::tempdir().unwrap();
        let host = host();
        let mut stream = stream(dir.path(), &host, false);
        stream.sample_row(0.0, 0.0);
        stream.flush().unwrap();

        // a failed flush leaves half a row in the file and loses its writer
        stream.sample_row(10.0, 10.0);
        let mut file = OpenOptions::new().append(true).open(stream.path()).unwrap();
        write!(file, "10\t2").unwrap();
        stream.writer = None;

        stream.flush().unwrap();
        let content = std::fs::read_to_string(stream.path()).unwrap();
        assert_eq!(content, "Time [s]\tZone(id=1).Temperature [K]\n0\t290\n10\t290\n");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_error_keeps_rows_cached() {
        let host = host();
        let mut stream = stream_at(PathBuf::from("/dev/full"), &host, false);
        stream.sample_row(0.0, 0.0);

        let err = stream.flush().unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }), "{:?}", err);
        assert_eq!(stream.cached_rows().len(), 1);
        assert!(stream.writer.is_none());
    }
}
