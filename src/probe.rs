//! Two-phase provider probe
//!
//! 1. A branch check gates everything: a missing repository or branch ends the
//!    probe before any content request is made.
//! 2. One content check per catalog candidate, all dispatched at once on a
//!    Tokio `JoinSet` and collected as they complete.
//!
//! Precedence among positive results follows catalog order. A found candidate
//! is reported as soon as every earlier candidate has settled, so the answer is
//! the same on every run even though completion order is not. When the probe
//! finishes early the remaining tasks are aborted and the set is drained, so no
//! task outlives the call.
//!
//! Nothing is retried here.

use crate::catalog::{BuildTool, BuildTypeCatalog};
use crate::outcome::{DetectError, DetectionOutcome};
use crate::provider::{ProbeStatus, ProviderClient, ProviderError};
use crate::reference::RepositoryReference;
use crate::token::Credential;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Settled state of one content check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Found,
    NotFound,
    Failed,
}

impl From<&Result<ProbeStatus, ProviderError>> for Settled {
    fn from(result: &Result<ProbeStatus, ProviderError>) -> Self {
        match result {
            Ok(ProbeStatus::Found) => Settled::Found,
            Ok(ProbeStatus::NotFound) => Settled::NotFound,
            Err(_) => Settled::Failed,
        }
    }
}

/// Index of the winning candidate, once it can no longer change
fn decided(settled: &[Option<Settled>]) -> Option<usize> {
    for (index, slot) in settled.iter().enumerate() {
        match slot {
            Some(Settled::Found) => return Some(index),
            Some(_) => continue,
            None => return None,
        }
    }
    None
}

/// Probes a provider for the catalog's marker files
pub struct ProviderProbe<P: ?Sized> {
    client: Arc<P>,
}

impl<P: ?Sized> Clone for ProviderProbe<P> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<P> ProviderProbe<P>
where
    P: ProviderClient + ?Sized + 'static,
{
    pub fn new(client: Arc<P>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<P> {
        &self.client
    }

    /// Runs the probe and folds the result into a [`DetectionOutcome`]
    pub async fn probe(
        &self,
        reference: &RepositoryReference,
        catalog: &BuildTypeCatalog,
        credential: &Credential,
    ) -> DetectionOutcome {
        self.try_probe(reference, catalog, credential).await.into()
    }

    /// Runs the probe
    ///
    /// Returns `Ok(None)` only when every content check answered not-found.
    ///
    /// # Errors
    ///
    /// - `DetectError::RepositoryOrBranchNotFound` when the branch check says
    ///   the repository or branch is absent
    /// - `DetectError::UpstreamUnavailable` when the branch check fails, or
    ///   when nothing was found and at least one content check failed
    pub async fn try_probe(
        &self,
        reference: &RepositoryReference,
        catalog: &BuildTypeCatalog,
        credential: &Credential,
    ) -> Result<Option<BuildTool>, DetectError> {
        self.check_branch(reference, credential).await?;

        if catalog.is_empty() {
            return Ok(None);
        }

        let candidates = catalog.candidates();
        let mut tasks = JoinSet::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let reference = reference.clone();
            let credential = credential.clone();
            let marker = candidate.marker_file.clone();
            tasks.spawn(async move {
                let result = client.content_exists(&reference, &marker, &credential).await;
                (index, result)
            });
        }
        debug!(%reference, probes = candidates.len(), "Dispatched content probes");

        let mut settled: Vec<Option<Settled>> = vec![None; candidates.len()];
        let mut early = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    let marker = candidates[index].marker_file.as_str();
                    match &result {
                        Ok(status) => debug!(%reference, marker, ?status, "Content probe settled"),
                        Err(e) => warn!(%reference, marker, error = %e, "Content probe failed"),
                    }
                    settled[index] = Some(Settled::from(&result));
                }
                Err(e) => warn!(%reference, error = %e, "Content probe task did not complete"),
            }

            if let Some(index) = decided(&settled) {
                early = Some(index);
                break;
            }
        }

        if !tasks.is_empty() {
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
            debug!(%reference, "Drained outstanding content probes");
        }

        let winner = early.or_else(|| settled.iter().position(|s| *s == Some(Settled::Found)));
        if let Some(index) = winner {
            let tool = candidates[index].tool;
            info!(%reference, build_tool = %tool, "Build tool detected");
            return Ok(Some(tool));
        }

        if settled.iter().all(|s| *s == Some(Settled::NotFound)) {
            info!(%reference, "No marker file found");
            Ok(None)
        } else {
            warn!(%reference, "Content probes failed without a match");
            Err(DetectError::upstream(format!(
                "content probes for {} failed",
                reference
            )))
        }
    }

    async fn check_branch(
        &self,
        reference: &RepositoryReference,
        credential: &Credential,
    ) -> Result<(), DetectError> {
        match self.client.branch_exists(reference, credential).await {
            Ok(ProbeStatus::Found) => Ok(()),
            Ok(ProbeStatus::NotFound) => {
                info!(%reference, provider = self.client.name(), "Repository or branch not found");
                Err(DetectError::RepositoryOrBranchNotFound {
                    owner: reference.owner().to_string(),
                    repository: reference.repository().to_string(),
                    branch: reference.branch().to_string(),
                })
            }
            Err(e) => {
                warn!(%reference, provider = self.client.name(), error = %e, "Branch check failed");
                Err(DetectError::upstream(format!("branch check failed: {}", e)))
            }
        }
    }
}
