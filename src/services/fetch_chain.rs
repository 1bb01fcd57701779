use std::time::Duration;

use crate::models::{MatchRecord, SourceKind};
use crate::services::sources::{FetchWindow, MatchSource};

/// What the chain produced, and which source it came from.
#[derive(Debug, Clone, Default)]
pub struct ChainOutcome {
    pub matches: Vec<MatchRecord>,
    pub source: Option<SourceKind>,
}

/// Ordered sources tried until one yields matches.
///
/// `run` never fails: errors and timeouts are logged and the next source is
/// tried. When every source comes back empty the outcome is empty with no
/// source, which callers cannot tell apart from a day without fixtures.
pub struct FetchChain {
    sources: Vec<Box<dyn MatchSource>>,
    source_timeout: Duration,
}

impl FetchChain {
    pub fn new(sources: Vec<Box<dyn MatchSource>>, source_timeout: Duration) -> Self {
        Self { sources, source_timeout }
    }

    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    pub async fn run(&self, window: &FetchWindow) -> ChainOutcome {
        for source in &self.sources {
            let kind = source.kind();

            match tokio::time::timeout(self.source_timeout, source.fetch(window)).await {
                Ok(Ok(matches)) if !matches.is_empty() => {
                    tracing::info!("{} returned {} matches", kind, matches.len());
                    return ChainOutcome { matches, source: Some(kind) };
                }
                Ok(Ok(_)) => tracing::debug!("{} returned no matches", kind),
                Ok(Err(e)) => tracing::warn!("{} unavailable: {}", kind, e),
                Err(_) => tracing::warn!("{} timed out after {:?}", kind, self.source_timeout),
            }
        }

        tracing::warn!("All match sources exhausted; snapshot will be empty");
        ChainOutcome::default()
    }
}
