use crate::config::MatchingConfig;
use crate::repository::{MatchStore, UserDirectory};
use crate::services::{
    CompatibilityScorer, MatchLedger, MatchListService, SuggestionRanker, SwipeProcessor,
};
use std::sync::Arc;

/// Services shared by all HTTP workers
#[derive(Clone)]
pub struct AppState {
    pub ledger: MatchLedger,
    pub suggestions: Arc<SuggestionRanker>,
    pub swipes: Arc<SwipeProcessor>,
    pub listing: Arc<MatchListService>,
    pub match_store: Arc<dyn MatchStore>,
}

impl AppState {
    pub fn new(
        match_store: Arc<dyn MatchStore>,
        directory: Arc<dyn UserDirectory>,
        scorer: CompatibilityScorer,
        config: MatchingConfig,
    ) -> Self {
        let ledger = MatchLedger::new(match_store.clone(), config.max_write_retries);

        Self {
            suggestions: Arc::new(SuggestionRanker::new(
                ledger.clone(),
                directory.clone(),
                scorer.clone(),
                config,
            )),
            swipes: Arc::new(SwipeProcessor::new(ledger.clone(), directory.clone(), scorer)),
            listing: Arc::new(MatchListService::new(ledger.clone(), directory)),
            ledger,
            match_store,
        }
    }
}
