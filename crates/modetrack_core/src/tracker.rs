//! Sequential mode tracking across a parameter sweep.
//!
//! Each raw mode set is matched against the previously tracked set (not the
//! seed), so modes may drift gradually through many small steps. Reference
//! modes without an acceptable match are carried forward as lost, and
//! unmatched candidates are born at the end of the ordering.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assignment::{solve_assignment, Assignment};
use crate::error::{Result, TrackingError};
use crate::mode_set::ModeSet;
use crate::settings::{BirthPolicy, LostModePolicy, TrackerSettings};
use crate::similarity::{similarity_matrix, Mac};
use crate::traits::{Complex64, SimilarityMetric};

/// Matched pairs scoring below this are logged as low-confidence.
const LOW_CONFIDENCE_MAC: f64 = 0.1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackerState {
    /// Seed or data not yet assigned.
    Uninitialized,
    /// Inputs assigned, `track` not yet run on them.
    Ready,
    Tracked,
    Failed,
}

/// Origin of one slot in a tracked mode set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ModeStatus {
    /// Matched to `candidate` in the raw set with the given MAC.
    Tracked { candidate: usize, mac: f64 },
    /// No acceptable match; the slot holds the previous reference pair.
    Lost,
    /// Unmatched raw candidate appended as a new mode.
    Born { candidate: usize },
}

/// Diagnostics for one tracking step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepReport {
    pub step: usize,
    /// One entry per slot of the tracked set, in order.
    pub statuses: Vec<ModeStatus>,
    /// Reference indices that found no match, whether carried or dropped.
    pub lost_references: Vec<usize>,
    /// Smallest MAC among matched slots.
    pub min_mac: Option<f64>,
    /// Raw solver order differed from the tracked order.
    pub reordered: bool,
    /// Both sets were non-empty but nothing could be matched.
    pub degenerate: bool,
}

impl StepReport {
    pub fn tracked_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| matches!(s, ModeStatus::Tracked { .. }))
            .count()
    }

    pub fn born_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| matches!(s, ModeStatus::Born { .. }))
            .count()
    }

    pub fn lost_count(&self) -> usize {
        self.lost_references.len()
    }
}

/// Output of a complete tracking run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackingRun {
    pub tracked: Vec<ModeSet>,
    pub reports: Vec<StepReport>,
}

impl TrackingRun {
    /// Eigenvalue of mode `mode` at every step; `None` where the mode is lost
    /// or has not been born yet.
    pub fn locus(&self, mode: usize) -> Vec<Option<Complex64>> {
        self.tracked
            .iter()
            .zip(&self.reports)
            .map(|(set, report)| match report.statuses.get(mode) {
                Some(ModeStatus::Tracked { .. }) | Some(ModeStatus::Born { .. }) => {
                    set.get(mode).map(|p| p.value())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of mode indices that appear anywhere in the run.
    pub fn mode_count(&self) -> usize {
        self.tracked.iter().map(ModeSet::len).max().unwrap_or(0)
    }
}

/// Tracks `data` starting from `seed`.
///
/// The returned run has one tracked set and one report per entry of `data`.
pub fn track_modes<M: SimilarityMetric>(
    seed: &ModeSet,
    data: &[ModeSet],
    metric: &M,
    settings: &TrackerSettings,
) -> Result<TrackingRun> {
    validate_inputs(seed, data, settings)?;

    let mut run = TrackingRun {
        tracked: Vec::with_capacity(data.len()),
        reports: Vec::with_capacity(data.len()),
    };
    let mut reference = seed.clone();

    for (step, candidate) in data.iter().enumerate() {
        let (tracked, report) = track_step(step, &reference, candidate, metric, settings)?;
        debug!(
            step,
            tracked = report.tracked_count(),
            lost = report.lost_count(),
            born = report.born_count(),
            min_mac = ?report.min_mac,
            "tracked mode set"
        );
        if report.degenerate {
            warn!(
                step,
                reference_modes = reference.len(),
                candidate_modes = candidate.len(),
                "no acceptable match in step; all reference modes lost"
            );
        } else if let Some(min_mac) = report.min_mac.filter(|m| *m < LOW_CONFIDENCE_MAC) {
            warn!(step, min_mac, "low-confidence match in step");
        }
        reference = tracked.clone();
        run.tracked.push(tracked);
        run.reports.push(report);
    }

    Ok(run)
}

fn validate_inputs(seed: &ModeSet, data: &[ModeSet], settings: &TrackerSettings) -> Result<()> {
    settings.validate()?;
    if seed.is_empty() {
        return Err(TrackingError::EmptyInput("seed mode set has no modes".to_string()));
    }
    if data.is_empty() {
        return Err(TrackingError::EmptyInput("no mode sets to track".to_string()));
    }
    let dim = seed.dimension().unwrap_or(0);
    if dim == 0 {
        return Err(TrackingError::InvalidInput(
            "seed eigenvectors have zero dimension".to_string(),
        ));
    }
    for (step, set) in data.iter().enumerate() {
        if let Some(found) = set.dimension() {
            if found != dim {
                return Err(TrackingError::InvalidInput(format!(
                    "mode set {} has eigenvector dimension {}, seed has {}",
                    step, found, dim
                )));
            }
        }
    }
    Ok(())
}

fn track_step<M: SimilarityMetric>(
    step: usize,
    reference: &ModeSet,
    candidate: &ModeSet,
    metric: &M,
    settings: &TrackerSettings,
) -> Result<(ModeSet, StepReport)> {
    // An empty side has nothing to match: every reference mode is lost and
    // every candidate is new.
    let (similarity, assignment) = if reference.is_empty() || candidate.is_empty() {
        let assignment = Assignment {
            rows: vec![None; reference.len()],
            unassigned_candidates: (0..candidate.len()).collect(),
            total: 0.0,
        };
        (DMatrix::zeros(reference.len(), candidate.len()), assignment)
    } else {
        let similarity = similarity_matrix(reference, candidate, metric)?;
        let assignment = solve_assignment(&similarity, settings)?;
        (similarity, assignment)
    };

    let capacity = reference.len() + assignment.unassigned_candidates.len();
    let mut tracked = ModeSet::with_capacity(capacity);
    let mut statuses = Vec::with_capacity(capacity);
    let mut lost_references = Vec::new();
    let mut min_mac: Option<f64> = None;

    for (i, col) in assignment.rows.iter().enumerate() {
        match *col {
            Some(j) => {
                let mac = similarity[(i, j)];
                min_mac = Some(min_mac.map_or(mac, |m| m.min(mac)));
                tracked.add_pair(candidate[j].clone())?;
                statuses.push(ModeStatus::Tracked { candidate: j, mac });
            }
            None => {
                lost_references.push(i);
                if settings.lost_modes == LostModePolicy::CarryForward {
                    tracked.add_pair(reference[i].clone())?;
                    statuses.push(ModeStatus::Lost);
                }
            }
        }
    }

    if settings.births == BirthPolicy::Append {
        for &j in &assignment.unassigned_candidates {
            tracked.add_pair(candidate[j].clone())?;
            statuses.push(ModeStatus::Born { candidate: j });
        }
    }

    let reordered = statuses.iter().enumerate().any(|(slot, status)| match status {
        ModeStatus::Tracked { candidate, .. } | ModeStatus::Born { candidate } => {
            *candidate != slot
        }
        ModeStatus::Lost => false,
    });
    let degenerate =
        !reference.is_empty() && !candidate.is_empty() && assignment.assigned_count() == 0;

    Ok((
        tracked,
        StepReport {
            step,
            statuses,
            lost_references,
            min_mac,
            reordered,
            degenerate,
        },
    ))
}

/// Stateful front end over [`track_modes`].
///
/// Assign a seed and the raw data, call [`ModeTracker::track`], then read
/// [`ModeTracker::tracked_data`]. Re-running on unchanged inputs reproduces
/// the same output.
#[derive(Debug, Clone)]
pub struct ModeTracker<M: SimilarityMetric = Mac> {
    metric: M,
    settings: TrackerSettings,
    seed: Option<ModeSet>,
    data: Option<Vec<ModeSet>>,
    run: TrackingRun,
    state: TrackerState,
}

impl ModeTracker<Mac> {
    pub fn new() -> Self {
        Self::with_metric(Mac, TrackerSettings::default())
    }

    pub fn with_settings(settings: TrackerSettings) -> Self {
        Self::with_metric(Mac, settings)
    }
}

impl Default for ModeTracker<Mac> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: SimilarityMetric> ModeTracker<M> {
    pub fn with_metric(metric: M, settings: TrackerSettings) -> Self {
        Self {
            metric,
            settings,
            seed: None,
            data: None,
            run: TrackingRun::default(),
            state: TrackerState::Uninitialized,
        }
    }

    pub fn set_seed(&mut self, seed: ModeSet) {
        self.seed = Some(seed);
        self.inputs_changed();
    }

    pub fn set_data(&mut self, data: Vec<ModeSet>) {
        self.data = Some(data);
        self.inputs_changed();
    }

    pub fn set_settings(&mut self, settings: TrackerSettings) {
        self.settings = settings;
        self.inputs_changed();
    }

    fn inputs_changed(&mut self) {
        self.run = TrackingRun::default();
        self.state = if self.seed.is_some() && self.data.is_some() {
            TrackerState::Ready
        } else {
            TrackerState::Uninitialized
        };
    }

    pub fn seed(&self) -> Option<&ModeSet> {
        self.seed.as_ref()
    }

    pub fn data(&self) -> &[ModeSet] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Runs the tracker over the assigned data.
    ///
    /// On failure the tracker moves to [`TrackerState::Failed`] and holds no
    /// partial output. Previous output is always discarded first.
    pub fn track(&mut self) -> Result<&[ModeSet]> {
        self.run = TrackingRun::default();
        let outcome = match (&self.seed, &self.data) {
            (None, _) => Err(TrackingError::EmptyInput("seed has not been assigned".to_string())),
            (_, None) => Err(TrackingError::EmptyInput("data has not been assigned".to_string())),
            (Some(seed), Some(data)) => track_modes(seed, data, &self.metric, &self.settings),
        };
        match outcome {
            Ok(run) => {
                self.run = run;
                self.state = TrackerState::Tracked;
                Ok(&self.run.tracked)
            }
            Err(err) => {
                warn!(error = %err, "mode tracking failed");
                self.state = TrackerState::Failed;
                Err(err)
            }
        }
    }

    /// Tracked mode sets from the last successful run; empty otherwise.
    pub fn tracked_data(&self) -> &[ModeSet] {
        &self.run.tracked
    }

    pub fn step_reports(&self) -> &[StepReport] {
        &self.run.reports
    }

    pub fn run(&self) -> &TrackingRun {
        &self.run
    }

    pub fn into_run(self) -> TrackingRun {
        self.run
    }
}
