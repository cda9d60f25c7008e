pub mod account;
pub mod compatibility;
pub mod ledger;
pub mod listing;
pub mod suggestions;
pub mod swipe;

pub use compatibility::{
    heuristic_score, CompatibilityScorer, InMemoryScoreCache, InferenceError, InferenceProvider,
    OpenAiProvider, RedisScoreCache, ScoreCache, ScoreSource,
};
pub use account::require_active_user;
pub use ledger::MatchLedger;
pub use listing::{MatchListService, MatchSummary};
pub use suggestions::{rank_suggestions, Suggestion, SuggestionRanker};
pub use swipe::{SwipeOutcome, SwipeProcessor};
