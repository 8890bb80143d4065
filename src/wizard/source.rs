//! Per-kind source resolution: the collected spec plus its search session.

use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::models::{RepositoryHit, SearchProvider, SourceKind, SourceSpec};

/// Ephemeral search state scoped to one source step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSession {
    pub query: String,
    pub results: Vec<RepositoryHit>,
    /// Guards against duplicate concurrent searches for this step.
    pub in_flight: bool,
    /// Monotonically increasing request token. Completions carrying an
    /// older token than the latest issued are discarded, so out-of-order
    /// responses can never overwrite newer results.
    pub latest_token: u64,
}

/// One source step of the wizard: spec, session, and provider choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSlot {
    pub spec: SourceSpec,
    pub session: SearchSession,
    pub provider: SearchProvider,
}

impl SourceSlot {
    pub fn new(kind: SourceKind) -> Self {
        SourceSlot {
            spec: SourceSpec::new(kind),
            session: SearchSession::default(),
            provider: SearchProvider::default(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.spec.kind
    }

    /// Issue a new search token. A second search while one is outstanding
    /// is rejected rather than raced.
    pub fn begin_search(&mut self) -> Result<u64, WizardError> {
        if self.session.in_flight {
            return Err(WizardError::SearchInFlight(self.spec.kind));
        }
        self.session.latest_token += 1;
        self.session.in_flight = true;
        Ok(self.session.latest_token)
    }

    /// Land a completed search. Returns `false` when the token is stale
    /// and the results were dropped.
    pub fn complete_search(&mut self, token: u64, results: Vec<RepositoryHit>) -> bool {
        if token != self.session.latest_token {
            log::debug!(
                "[Wizard] Discarding stale {} search response (token {} < {})",
                self.spec.kind,
                token,
                self.session.latest_token
            );
            return false;
        }
        self.session.in_flight = false;
        self.session.results = results;
        true
    }

    /// Record a failed search. Stale failures are ignored the same way.
    pub fn fail_search(&mut self, token: u64) -> bool {
        if token != self.session.latest_token {
            return false;
        }
        self.session.in_flight = false;
        true
    }

    /// Select one hit: resolve the spec and clear the session in the same
    /// logical update, so a stale result list is never shown afterwards.
    ///
    /// Selection also invalidates any search still outstanding for this
    /// step; its completion will carry an old token and be dropped.
    pub fn select_result(&mut self, index: usize) -> Result<(), WizardError> {
        let hit = self
            .session
            .results
            .get(index)
            .cloned()
            .ok_or(WizardError::NoSuchResult(index))?;

        self.spec.select_hit(self.provider, &hit);
        self.session.query.clear();
        self.session.results.clear();
        self.session.in_flight = false;
        self.session.latest_token += 1;
        Ok(())
    }
}
