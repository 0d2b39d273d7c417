pub mod classify;
pub mod engagement;
pub mod normalize;
pub mod penalty;
pub mod pipeline;
pub mod post;

pub use classify::ContentFlags;
pub use engagement::{BookmarkConfig, EngagementCurve, EngagementModel, RateScoreConfig};
pub use penalty::{ComplexityConfig, Penalties, PenaltyCalculator, PenaltyConfig};
pub use pipeline::{AccountScore, ScoringPipeline};
pub use post::{PostBreakdown, PostScorer, PostWeights};
