use crate::dispatch::{CandidateRegistry, DispatchCtx, Endpoint, Scores};
use std::cmp::Ordering;
use std::sync::Arc;

/// An endpoint together with the scores it was ranked by.
#[derive(Debug, Clone)]
pub struct RankedEndpoint {
    pub endpoint: Arc<Endpoint>,
    pub scores: Scores,
}

/// Ranks the registry's candidates for a client.
#[derive(Debug, Clone)]
pub struct EndpointDirector {
    registry: Arc<CandidateRegistry>,
}

impl EndpointDirector {
    pub fn new(registry: Arc<CandidateRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CandidateRegistry> {
        &self.registry
    }

    /// Score every current candidate and return all of them, best first.
    pub fn dispatch(&self, ctx: &DispatchCtx) -> Vec<RankedEndpoint> {
        let mut ranked: Vec<RankedEndpoint> = self
            .registry
            .snapshot()
            .into_iter()
            .map(|endpoint| {
                let scores = endpoint.calculate_score(ctx);
                RankedEndpoint { endpoint, scores }
            })
            .collect();

        ranked.sort_by(compare_ranked);
        ranked
    }
}

/// Active score descending, then static score descending, then identity for a stable order.
fn compare_ranked(a: &RankedEndpoint, b: &RankedEndpoint) -> Ordering {
    b.scores
        .active_score
        .total_cmp(&a.scores.active_score)
        .then_with(|| b.scores.static_score.total_cmp(&a.scores.static_score))
        .then_with(|| a.endpoint.key().cmp(b.endpoint.key()))
}

/// Keep at most `limit` entries. Not applied by [`EndpointDirector::dispatch`]; callers opt in.
pub fn truncate_top(mut ranked: Vec<RankedEndpoint>, limit: usize) -> Vec<RankedEndpoint> {
    ranked.truncate(limit);
    ranked
}
