use std::sync::{Mutex, MutexGuard};

use tracing::{error, info, warn};

use crate::api::{ContextResetter, DocumentStore};
use crate::errors::{best_effort, AppError};
use crate::models::StagedFile;

/// Result of a batch submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Every staged file was accepted; the caller moves on to the chat screen.
    Completed { uploaded: usize, chunks: u32 },
    /// Another submission was already running; nothing was sent.
    AlreadyRunning,
}

impl UploadOutcome {
    pub fn should_navigate(&self) -> bool {
        matches!(self, UploadOutcome::Completed { .. })
    }
}

/// Read-only view of the upload screen.
#[derive(Debug, Clone, Default)]
pub struct UploadSnapshot {
    pub files: Vec<StagedFile>,
    pub is_processing: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct UploadState {
    staged: Vec<StagedFile>,
    is_processing: bool,
    error: Option<String>,
}

/// Entry-screen controller: stages files and uploads them one at a time.
pub struct UploadController<R, S> {
    resetter: R,
    store: S,
    state: Mutex<UploadState>,
}

impl<R, S> UploadController<R, S>
where
    R: ContextResetter,
    S: DocumentStore,
{
    /// Creates the controller without touching the remote context.
    pub fn new(resetter: R, store: S) -> Self {
        Self { resetter, store, state: Mutex::new(UploadState::default()) }
    }

    /// Creates the controller and runs the mount-time context reset.
    pub async fn mount(resetter: R, store: S) -> Self {
        let controller = Self::new(resetter, store);
        controller.clear_remote_context().await;
        controller
    }

    /// Clears the server-side document context. Never fails; returns whether
    /// the service confirmed the reset.
    pub async fn clear_remote_context(&self) -> bool {
        let cleared = best_effort("clear_document_context", self.resetter.reset_context()).await;
        if cleared.is_some() {
            info!("Document context cleared");
        }
        cleared.is_some()
    }

    /// Appends the selection, in order, to the staged files.
    pub fn stage_files(&self, selection: impl IntoIterator<Item = StagedFile>) {
        let mut state = self.lock();
        let before = state.staged.len();
        state.staged.extend(selection);
        info!(added = state.staged.len() - before, total = state.staged.len(), "Files staged");
    }

    /// Removes the entry at `position`. Out-of-range positions are ignored.
    pub fn unstage_file(&self, position: usize) -> Option<StagedFile> {
        let mut state = self.lock();
        if position >= state.staged.len() {
            warn!(position, "Ignoring removal of unknown staged file");
            return None;
        }
        Some(state.staged.remove(position))
    }

    pub fn staged_files(&self) -> Vec<StagedFile> {
        self.lock().staged.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.lock().is_processing
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let state = self.lock();
        UploadSnapshot {
            files: state.staged.clone(),
            is_processing: state.is_processing,
            error: state.error.clone(),
        }
    }

    /// Uploads every staged file, strictly one after another, in staging order.
    ///
    /// Stops at the first failure, records a message naming the file and
    /// leaves the staged files untouched so the whole batch can be resent.
    pub async fn submit_batch(&self) -> Result<UploadOutcome, AppError> {
        let batch = {
            let mut state = self.lock();
            if state.staged.is_empty() {
                let err = AppError::EmptyBatch;
                state.error = Some(err.to_string());
                return Err(err);
            }
            if state.is_processing {
                return Ok(UploadOutcome::AlreadyRunning);
            }
            state.is_processing = true;
            state.error = None;
            state.staged.clone()
        };

        let result = self.upload_sequentially(&batch).await;

        let mut state = self.lock();
        state.is_processing = false;
        match result {
            Ok(chunks) => {
                info!(files = batch.len(), chunks, "Batch uploaded");
                Ok(UploadOutcome::Completed { uploaded: batch.len(), chunks })
            }
            Err(err) => {
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn upload_sequentially(&self, batch: &[StagedFile]) -> Result<u32, AppError> {
        let mut chunks = 0;
        for file in batch {
            match self.store.upload(file).await {
                Ok(receipt) => {
                    let count = receipt.document_count.unwrap_or(0);
                    info!(file = %file.name(), chunks = count, "File uploaded");
                    chunks += count;
                }
                Err(e) => {
                    error!(file = %file.name(), "Upload failed: {e}");
                    return Err(AppError::upload_failed(file.name(), e));
                }
            }
        }
        Ok(chunks)
    }

    fn lock(&self) -> MutexGuard<'_, UploadState> {
        // State stays consistent across a panic; keep serving it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Notify;

    use super::*;
    use crate::api::UploadReceipt;

    #[derive(Clone, Default)]
    struct StubResetter {
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl ContextResetter for StubResetter {
        async fn reset_context(&self) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Unexpected("connection refused".into()));
            }
            Ok(())
        }
    }

    /// Records every upload in call order and fails on the chosen names.
    #[derive(Clone, Default)]
    struct StubStore {
        failing: HashSet<String>,
        calls: Arc<Mutex<Vec<String>>>,
        gate: Option<Arc<Notify>>,
    }

    impl StubStore {
        fn failing_on(names: &[&str]) -> Self {
            Self { failing: names.iter().map(|n| n.to_string()).collect(), ..Self::default() }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self { gate: Some(gate), ..Self::default() }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DocumentStore for StubStore {
        async fn upload(&self, file: &StagedFile) -> Result<UploadReceipt, AppError> {
            self.calls.lock().unwrap().push(file.name().to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.failing.contains(file.name()) {
                return Err(AppError::Unexpected("500".into()));
            }
            Ok(UploadReceipt { message: None, document_count: Some(3) })
        }
    }

    fn files(names: &[&str]) -> Vec<StagedFile> {
        names.iter().map(|n| StagedFile::new(*n, n.as_bytes().to_vec())).collect()
    }

    fn names(files: &[StagedFile]) -> Vec<&str> {
        files.iter().map(|f| f.name()).collect()
    }

    #[tokio::test]
    async fn mount_resets_context_once() {
        let resetter = StubResetter::default();
        let calls = resetter.calls.clone();
        let _controller = UploadController::mount(resetter, StubStore::default()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_reset_does_not_block_uploads() {
        let resetter = StubResetter { fail: true, ..StubResetter::default() };
        let store = StubStore::default();
        let controller = UploadController::mount(resetter, store.clone()).await;

        assert!(!controller.clear_remote_context().await);
        controller.stage_files(files(&["a.pdf"]));
        let outcome = controller.submit_batch().await.unwrap();
        assert!(outcome.should_navigate());
        assert!(controller.error().is_none());
    }

    #[test]
    fn staging_appends_in_order_and_keeps_duplicates() {
        let controller = UploadController::new(StubResetter::default(), StubStore::default());
        controller.stage_files(files(&["a.pdf", "b.pdf"]));
        controller.stage_files(files(&["a.pdf"]));
        assert_eq!(names(&controller.staged_files()), ["a.pdf", "b.pdf", "a.pdf"]);
    }

    #[test]
    fn unstage_removes_exactly_one_entry() {
        let controller = UploadController::new(StubResetter::default(), StubStore::default());
        controller.stage_files(files(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]));

        let removed = controller.unstage_file(1).unwrap();
        assert_eq!(removed.name(), "b.pdf");
        assert_eq!(names(&controller.staged_files()), ["a.pdf", "c.pdf", "d.pdf"]);

        assert!(controller.unstage_file(3).is_none());
        assert_eq!(controller.staged_files().len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_network() {
        let store = StubStore::default();
        let controller = UploadController::new(StubResetter::default(), store.clone());

        let err = controller.submit_batch().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            controller.error().as_deref(),
            Some("Please select at least one file to process")
        );
        assert!(store.calls().is_empty());
        assert!(!controller.is_processing());
    }

    #[tokio::test]
    async fn all_files_uploaded_in_staging_order() {
        let store = StubStore::default();
        let controller = UploadController::new(StubResetter::default(), store.clone());
        controller.stage_files(files(&["a.pdf", "b.pdf", "c.pdf"]));

        let outcome = controller.submit_batch().await.unwrap();
        assert_eq!(outcome, UploadOutcome::Completed { uploaded: 3, chunks: 9 });
        assert_eq!(store.calls(), ["a.pdf", "b.pdf", "c.pdf"]);
        assert!(!controller.is_processing());
    }

    #[tokio::test]
    async fn first_failure_stops_the_batch() {
        let store = StubStore::failing_on(&["b.pdf"]);
        let controller = UploadController::new(StubResetter::default(), store.clone());
        controller.stage_files(files(&["a.pdf", "b.pdf", "c.pdf"]));

        let err = controller.submit_batch().await.unwrap_err();
        assert_eq!(err.failed_file(), Some("b.pdf"));
        assert_eq!(store.calls(), ["a.pdf", "b.pdf"]);
        assert_eq!(controller.error().as_deref(), Some("Failed to upload b.pdf"));
        assert_eq!(names(&controller.staged_files()), ["a.pdf", "b.pdf", "c.pdf"]);
        assert!(!controller.is_processing());
    }

    #[tokio::test]
    async fn resubmission_resends_the_whole_batch() {
        let store = StubStore::failing_on(&["b.pdf"]);
        let controller = UploadController::new(StubResetter::default(), store.clone());
        controller.stage_files(files(&["a.pdf", "b.pdf"]));
        assert!(controller.submit_batch().await.is_err());

        controller.unstage_file(1);
        let outcome = controller.submit_batch().await.unwrap();
        assert!(outcome.should_navigate());
        assert_eq!(store.calls(), ["a.pdf", "b.pdf", "a.pdf"]);
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn second_submission_while_running_is_ignored() {
        let gate = Arc::new(Notify::new());
        let store = StubStore::gated(gate.clone());
        let controller = UploadController::new(StubResetter::default(), store.clone());
        controller.stage_files(files(&["a.pdf"]));

        let first = controller.submit_batch();
        let second = async {
            tokio::task::yield_now().await;
            assert!(controller.is_processing());
            let outcome = controller.submit_batch().await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.unwrap().should_navigate());
        assert_eq!(second.unwrap(), UploadOutcome::AlreadyRunning);
        assert_eq!(store.calls(), ["a.pdf"]);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_even_while_running() {
        let gate = Arc::new(Notify::new());
        let store = StubStore::gated(gate.clone());
        let controller = UploadController::new(StubResetter::default(), store.clone());
        controller.stage_files(files(&["a.pdf"]));

        let first = controller.submit_batch();
        let second = async {
            tokio::task::yield_now().await;
            // The running batch holds its own snapshot.
            controller.unstage_file(0);
            let outcome = controller.submit_batch().await;
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(second.unwrap_err().is_validation());
        assert_eq!(store.calls(), ["a.pdf"]);
    }
}
