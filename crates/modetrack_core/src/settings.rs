use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackingError};

/// How the correspondence between consecutive mode sets is computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Globally optimal assignment (Hungarian method).
    #[default]
    Optimal,
    /// Each reference mode in index order takes its best unclaimed candidate.
    Greedy,
}

/// What happens to a reference mode that finds no acceptable candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LostModePolicy {
    /// Keep the slot, holding the previous reference pair, so indices stay stable.
    #[default]
    CarryForward,
    /// Remove the slot; later mode indices shift down.
    Drop,
}

/// Where unmatched candidates end up in the tracked ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BirthPolicy {
    /// Appended after the tracked slots in ascending candidate index.
    #[default]
    Append,
    /// Ignored; the tracked set never grows.
    Discard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrackerSettings {
    /// Minimum MAC for a pair to be accepted. Pairs scoring zero are never
    /// accepted regardless of this value.
    pub acceptance_threshold: f64,
    /// Totals within this distance of the optimum count as ties.
    pub tie_tolerance: f64,
    #[serde(default)]
    pub strategy: MatchStrategy,
    #[serde(default)]
    pub lost_modes: LostModePolicy,
    #[serde(default)]
    pub births: BirthPolicy,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.0,
            tie_tolerance: 1e-9,
            strategy: MatchStrategy::Optimal,
            lost_modes: LostModePolicy::CarryForward,
            births: BirthPolicy::Append,
        }
    }
}

impl TrackerSettings {
    pub fn with_threshold(acceptance_threshold: f64) -> Self {
        Self {
            acceptance_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(TrackingError::InvalidInput(format!(
                "acceptance_threshold must lie in [0, 1], got {}",
                self.acceptance_threshold
            )));
        }
        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 {
            return Err(TrackingError::InvalidInput(format!(
                "tie_tolerance must be finite and non-negative, got {}",
                self.tie_tolerance
            )));
        }
        Ok(())
    }
}
