use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::{
    binder,
    errors::{OutputError, ResultExt},
    host::SimulationHost,
    resolve,
    specs::OutputSpec,
    units::Unit,
};

use super::OutputStream;

/// When cached rows are written to disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlushPolicy {
    /// Maximum wall-clock time between two flushes.
    pub max_delay: Duration,
    /// Flush as soon as all caches together hold more bytes than this.
    pub max_cache_bytes: usize,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy {
            max_delay: Duration::from_secs(30),
            max_cache_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Owns all output streams and drives them from the simulation's callbacks.
#[derive(Debug)]
pub struct OutputHandler {
    streams: Vec<OutputStream>,
    time_unit: Unit,
    policy: FlushPolicy,
    last_flush: Instant,
    cache_bytes: usize,
    diagnostics: Vec<String>,
}

impl OutputHandler {
    /// Resolves and binds all output definitions of `spec` against `host`.
    ///
    /// Creates `output_dir` if needed. With `restart` set, existing stream
    /// files are appended to instead of being replaced.
    pub fn setup(
        spec: &OutputSpec,
        host: &dyn SimulationHost,
        output_dir: &Path,
        restart: bool,
    ) -> Result<OutputHandler, OutputError> {
        let time_unit = Unit::parse(&spec.time_unit)?;
        if !time_unit.is_time() {
            return Err(OutputError::NotATimeUnit(time_unit.to_string()));
        }
        let policy = spec.flush_policy()?;

        fs::create_dir_all(output_dir)
            .map_err(|e| OutputError::io(output_dir, e))
            .context("Error creating output directory")?;

        let (plans, mut diagnostics): (Vec<resolve::StreamPlan>, Vec<String>) =
            resolve::resolve(
                &spec.definitions.items,
                &spec.grids.items,
                &spec.object_lists.items,
            )
            .context("Error initializing output definitions")?
            .into();

        let (columns, binding_diagnostics): (Vec<Vec<binder::Column>>, Vec<String>) =
            binder::bind(&plans, host)
                .context("Error binding output quantities")?
                .into();
        diagnostics.extend(binding_diagnostics);

        let streams: Vec<OutputStream> = plans
            .into_iter()
            .zip(columns)
            .map(|(plan, columns)| {
                let path = output_dir.join(plan.file_name());
                OutputStream::new(plan.name, path, plan.schedule, columns, time_unit, restart)
            })
            .collect();

        info!(
            "Outputs initialized: {} stream(s), {} column(s)",
            streams.len(),
            streams.iter().map(|s| s.columns().len()).sum::<usize>()
        );

        Ok(OutputHandler {
            streams,
            time_unit,
            policy,
            last_flush: Instant::now(),
            cache_bytes: 0,
            diagnostics,
        })
    }

    pub fn streams(&self) -> &[OutputStream] {
        &self.streams
    }

    /// Unit of the time column.
    pub fn time_unit(&self) -> Unit {
        self.time_unit
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Warnings collected during setup.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Total size of all row caches.
    pub fn cache_bytes(&self) -> usize {
        self.cache_bytes
    }

    /// Called after every completed integrator step at time `t` (seconds).
    pub fn step_completed(&mut self, t: f64) {
        for stream in &mut self.streams {
            stream.step_completed(t);
        }
    }

    /// Samples all streams whose grid has an instant at `t_out` (seconds).
    ///
    /// `t_time` is the value written to the time column. Flushes according
    /// to the flush policy.
    pub fn produce_output(&mut self, t_out: f64, t_time: f64) -> Result<(), OutputError> {
        for stream in &mut self.streams {
            stream.sample_row(t_out, t_time);
        }
        self.cache_bytes = self.streams.iter().map(OutputStream::cache_bytes).sum();

        if self.last_flush.elapsed() >= self.policy.max_delay
            || self.cache_bytes > self.policy.max_cache_bytes
        {
            debug!("Flushing output caches ({} bytes)", self.cache_bytes);
            self.flush_all()?;
        }
        Ok(())
    }

    /// Like [`produce_output`](Self::produce_output), writing `t_out` converted
    /// to the output time unit into the time column.
    pub fn produce_output_at(&mut self, t_out: f64) -> Result<(), OutputError> {
        let t_time = self.time_unit.from_base(t_out);
        self.produce_output(t_out, t_time)
    }

    /// Writes all cached rows of all streams.
    pub fn flush_all(&mut self) -> Result<(), OutputError> {
        for stream in &mut self.streams {
            stream.flush()?;
        }
        self.cache_bytes = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// The earliest instant after `t` at which any stream wants output, or
    /// `f64::MAX` when no stream has further instants.
    pub fn next_output_time(&self, t: f64) -> f64 {
        self.streams
            .iter()
            .map(|s| s.schedule().next_output_time(t))
            .fold(f64::MAX, f64::min)
    }
}
