use super::{ProbeStatus, ProviderClient, ProviderError};
use crate::reference::RepositoryReference;
use crate::token::Credential;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted provider for tests and offline runs
///
/// The branch check answers `Found` and every content check answers
/// `NotFound` unless scripted otherwise.
pub struct MockProviderClient {
    branch: Mutex<MockAnswer>,
    contents: Mutex<HashMap<String, MockAnswer>>,
    branch_calls: AtomicUsize,
    content_calls: Mutex<Vec<String>>,
    completed_content_calls: AtomicUsize,
    credentials_seen: Mutex<Vec<Credential>>,
    name: String,
}

#[derive(Debug, Clone)]
pub struct MockAnswer {
    pub result: Result<ProbeStatus, ProviderError>,
    pub delay: Duration,
    /// Panic instead of answering, after the delay
    pub panics: bool,
}

impl MockAnswer {
    pub fn found() -> Self {
        Self {
            result: Ok(ProbeStatus::Found),
            delay: Duration::ZERO,
            panics: false,
        }
    }

    pub fn not_found() -> Self {
        Self {
            result: Ok(ProbeStatus::NotFound),
            delay: Duration::ZERO,
            panics: false,
        }
    }

    pub fn error(error: ProviderError) -> Self {
        Self {
            result: Err(error),
            delay: Duration::ZERO,
            panics: false,
        }
    }

    pub fn panic() -> Self {
        Self {
            panics: true,
            ..Self::not_found()
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl MockProviderClient {
    pub fn new() -> Self {
        Self::with_name("MockProvider")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            branch: Mutex::new(MockAnswer::found()),
            contents: Mutex::new(HashMap::new()),
            branch_calls: AtomicUsize::new(0),
            content_calls: Mutex::new(Vec::new()),
            completed_content_calls: AtomicUsize::new(0),
            credentials_seen: Mutex::new(Vec::new()),
            name: name.into(),
        }
    }

    pub fn set_branch(&self, answer: MockAnswer) {
        *self.branch.lock().unwrap() = answer;
    }

    pub fn set_content(&self, path: impl Into<String>, answer: MockAnswer) {
        self.contents.lock().unwrap().insert(path.into(), answer);
    }

    pub fn branch_calls(&self) -> usize {
        self.branch_calls.load(Ordering::SeqCst)
    }

    /// Paths requested so far, in dispatch order
    pub fn content_calls(&self) -> Vec<String> {
        self.content_calls.lock().unwrap().clone()
    }

    /// Content checks that ran to completion (not aborted)
    pub fn completed_content_calls(&self) -> usize {
        self.completed_content_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.branch_calls() + self.content_calls.lock().unwrap().len()
    }

    pub fn credentials_seen(&self) -> Vec<Credential> {
        self.credentials_seen.lock().unwrap().clone()
    }
}

impl Default for MockProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    async fn branch_exists(
        &self,
        _reference: &RepositoryReference,
        credential: &Credential,
    ) -> Result<ProbeStatus, ProviderError> {
        self.branch_calls.fetch_add(1, Ordering::SeqCst);
        self.credentials_seen.lock().unwrap().push(credential.clone());
        let answer = self.branch.lock().unwrap().clone();
        if !answer.delay.is_zero() {
            tokio::time::sleep(answer.delay).await;
        }
        answer.result
    }

    async fn content_exists(
        &self,
        _reference: &RepositoryReference,
        path: &str,
        credential: &Credential,
    ) -> Result<ProbeStatus, ProviderError> {
        self.content_calls.lock().unwrap().push(path.to_string());
        self.credentials_seen.lock().unwrap().push(credential.clone());
        let answer = self
            .contents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(MockAnswer::not_found);
        if !answer.delay.is_zero() {
            tokio::time::sleep(answer.delay).await;
        }
        if answer.panics {
            panic!("scripted panic while checking {}", path);
        }
        self.completed_content_calls.fetch_add(1, Ordering::SeqCst);
        answer.result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
