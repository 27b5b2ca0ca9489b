use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default quiet period before a typed search is committed to the URL.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// Receives canonical query strings once they are committed.
pub trait UrlSink: Send + Sync + 'static {
    fn commit(&self, query: &str);
}

impl<F> UrlSink for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn commit(&self, query: &str) {
        self(query)
    }
}

enum CommitRequest {
    /// Commit after the quiet period unless something newer arrives first.
    Settle(String),
    /// Commit right away, cancelling any pending settle.
    Now(String),
}

/// Pushes query strings to a [`UrlSink`], debouncing search keystrokes.
///
/// Must be created inside a tokio runtime. Dropping the committer aborts the
/// background task and discards a pending commit.
pub struct UrlCommitter {
    tx: mpsc::UnboundedSender<CommitRequest>,
    task: JoinHandle<()>,
}

impl UrlCommitter {
    pub fn spawn(quiet: Duration, sink: impl UrlSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(rx, quiet, Arc::new(sink)));
        Self { tx, task }
    }

    pub fn commit_debounced(&self, query: String) {
        self.send(CommitRequest::Settle(query));
    }

    pub fn commit_now(&self, query: String) {
        self.send(CommitRequest::Now(query));
    }

    fn send(&self, request: CommitRequest) {
        if self.tx.send(request).is_err() {
            tracing::warn!("URL committer task is gone; dropping commit");
        }
    }
}

impl Drop for UrlCommitter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<CommitRequest>,
    quiet: Duration,
    sink: Arc<dyn UrlSink>,
) {
    let mut pending: Option<String> = None;
    let mut last_committed: Option<String> = None;

    let commit = |query: String, last: &mut Option<String>| {
        // Identical URLs would only add duplicate history entries.
        if last.as_deref() != Some(query.as_str()) {
            sink.commit(&query);
            *last = Some(query);
        }
    };

    loop {
        let request = if pending.is_some() {
            tokio::select! {
                request = rx.recv() => request,
                _ = tokio::time::sleep(quiet) => {
                    if let Some(query) = pending.take() {
                        commit(query, &mut last_committed);
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match request {
            Some(CommitRequest::Settle(query)) => pending = Some(query),
            Some(CommitRequest::Now(query)) => {
                pending = None;
                commit(query, &mut last_committed);
            }
            None => break,
        }
    }
}
