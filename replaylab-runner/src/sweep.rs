//! Parameter sweeps: one run per parameter set over shared streams.
//!
//! Each run owns its own simulation state and reopens every stream from
//! scratch, so runs are independent and can execute in parallel with rayon.
//! Results come back in parameter order regardless of parallelism.

use rayon::prelude::*;

use replaylab_core::config::SimConfig;
use replaylab_core::data::DataStream;
use replaylab_core::engine::Algorithm;

use crate::fitness::FitnessMetric;
use crate::runner::{run_simulation, RunError, RunResult};

/// One parameter set and its run.
#[derive(Debug, Clone)]
pub struct SweepEntry<P> {
    pub params: P,
    pub result: RunResult,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct SweepResults<P> {
    entries: Vec<SweepEntry<P>>,
    metric: FitnessMetric,
}

impl<P> SweepResults<P> {
    /// Entries in the order the parameter sets were given.
    pub fn entries(&self) -> &[SweepEntry<P>] {
        &self.entries
    }

    pub fn metric(&self) -> FitnessMetric {
        self.metric
    }

    /// Highest-scoring entry. Ties go to the earliest parameter set.
    pub fn best(&self) -> Option<&SweepEntry<P>> {
        let mut best: Option<&SweepEntry<P>> = None;
        for entry in &self.entries {
            match best {
                Some(b) if !self.metric.is_better(entry.score, b.score) => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    /// Entries sorted best first, NaN scores last; ties keep parameter order.
    /// `ranked()[0]` is always `best()`.
    pub fn ranked(&self) -> Vec<&SweepEntry<P>> {
        let mut ranked: Vec<&SweepEntry<P>> = self.entries.iter().collect();
        ranked.sort_by(|a, b| self.metric.compare(b.score, a.score));
        ranked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<SweepEntry<P>> {
        self.entries
    }
}

/// Runs one simulation per parameter set.
#[derive(Debug, Clone, Copy)]
pub struct ParamSweep {
    parallel: bool,
    metric: FitnessMetric,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self {
            parallel: true,
            metric: FitnessMetric::default(),
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_metric(mut self, metric: FitnessMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Run `make(params)` once per entry of `params`.
    ///
    /// The first failing run aborts the sweep.
    pub fn run<P, A, F>(
        &self,
        config: &SimConfig,
        streams: &[Box<dyn DataStream>],
        params: &[P],
        make: F,
    ) -> Result<SweepResults<P>, RunError>
    where
        P: Clone + Send + Sync,
        A: Algorithm,
        F: Fn(&P) -> A + Sync,
    {
        config.validate_window()?;
        tracing::info!(runs = params.len(), parallel = self.parallel, "sweep started");

        let run_one = |p: &P| -> Result<SweepEntry<P>, RunError> {
            let mut algorithm = make(p);
            let result = run_simulation(config, streams, &mut algorithm)?;
            let score = self.metric.extract(&result);
            Ok(SweepEntry {
                params: p.clone(),
                result,
                score,
            })
        };

        let entries = if self.parallel {
            params.par_iter().map(run_one).collect::<Result<Vec<_>, _>>()?
        } else {
            params.iter().map(run_one).collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults {
            entries,
            metric: self.metric,
        })
    }
}
