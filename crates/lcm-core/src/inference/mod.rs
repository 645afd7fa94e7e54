//! Posterior inference over latent classes.

pub mod explain;
pub mod output;
pub mod posterior;

pub use explain::{EvidenceTerm, SubjectExplanation};
pub use output::{
    PosteriorMatrix, PosteriorOutput, PosteriorVector, SubjectOutcomes, SubjectProbability,
    TargetProbabilities,
};
pub use posterior::{PosteriorEngine, PosteriorQuery};
