pub mod assignment;
pub mod eigenpair;
pub mod error;
pub mod mode_set;
pub mod settings;
pub mod similarity;
pub mod tracker;
/// The `modetrack_core` crate keeps the identity of eigenmodes consistent across a
/// parameter sweep, so that mode `i` of every tracked set is the same physical mode.
///
/// Key components:
/// - **Traits**: `ModalScalar` (real or complex input scalars), `SimilarityMetric`
///   (pairwise mode score).
/// - **Mode sets**: `EigenPair` and `ModeSet`, an ordered collection sharing one
///   eigenvector dimension.
/// - **Similarity**: The Modal Assurance Criterion and the reference-by-candidate score matrix.
/// - **Assignment**: Optimal (Hungarian) and greedy one-to-one matching with thresholds and ties.
/// - **Tracker**: `ModeTracker`, which propagates the ordering step by step and
///   reports losses and births.
pub mod traits;

pub use eigenpair::EigenPair;
pub use error::{Result, TrackingError};
pub use mode_set::ModeSet;
pub use settings::{BirthPolicy, LostModePolicy, MatchStrategy, TrackerSettings};
pub use similarity::{mac, similarity_matrix, Mac};
pub use tracker::{track_modes, ModeStatus, ModeTracker, StepReport, TrackerState, TrackingRun};
pub use traits::{Complex64, ModalScalar, SimilarityMetric};
