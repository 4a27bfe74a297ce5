//! Background worker that refreshes providers when the host reports changes.
//!
//! Change signals usually arrive in bursts (a save touches files, folders and
//! symbols at once). The worker drains what is queued, waits the coalescing
//! window, drains again and then refreshes the union in one pass.

use crate::state::ContextState;
use std::sync::Arc;
use tokio::sync::mpsc;

/// "The data behind these providers may have changed."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSignal {
    /// Affected providers; `None` means all of them
    pub providers: Option<Vec<String>>,
}

impl ChangeSignal {
    pub fn all() -> Self {
        Self { providers: None }
    }

    pub fn providers<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            providers: Some(names.into_iter().map(Into::into).collect()),
        }
    }
}

/// Providers accumulated from one burst of signals.
#[derive(Debug, Default)]
enum Pending {
    #[default]
    Nothing,
    All,
    Named(Vec<String>),
}

impl Pending {
    fn merge(&mut self, signal: ChangeSignal) {
        let Some(names) = signal.providers else {
            *self = Self::All;
            return;
        };
        match self {
            Self::All => {}
            Self::Nothing => *self = Self::Named(dedup(names)),
            Self::Named(current) => {
                for name in names {
                    if !current.contains(&name) {
                        current.push(name);
                    }
                }
            }
        }
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

/// Consumes change signals and refreshes the affected providers.
pub struct RefreshWorker {
    state: Arc<ContextState>,
    signals: mpsc::Receiver<ChangeSignal>,
}

impl RefreshWorker {
    pub fn new(state: Arc<ContextState>, signals: mpsc::Receiver<ChangeSignal>) -> Self {
        Self { state, signals }
    }

    /// Run until the signal channel closes or the state shuts down.
    pub async fn run(mut self) {
        let shutdown = self.state.shutdown_token().clone();

        loop {
            let first = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                signal = self.signals.recv() => signal,
            };
            let Some(first) = first else {
                break;
            };

            let mut pending = Pending::default();
            pending.merge(first);
            self.drain(&mut pending);

            let window = tokio::time::sleep(self.state.options().refresh_coalesce);
            tokio::pin!(window);
            let mut closed = false;
            loop {
                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => return,
                    () = &mut window => break,
                    signal = self.signals.recv() => match signal {
                        Some(signal) => pending.merge(signal),
                        None => {
                            closed = true;
                            break;
                        }
                    },
                }
            }

            self.apply(pending).await;
            if closed {
                break;
            }
        }

        tracing::debug!("Refresh worker stopped");
    }

    fn drain(&mut self, pending: &mut Pending) {
        while let Ok(signal) = self.signals.try_recv() {
            pending.merge(signal);
        }
    }

    async fn apply(&self, pending: Pending) {
        let names = match pending {
            Pending::Nothing => return,
            Pending::All => self.state.provider_names(),
            Pending::Named(names) => names,
        };

        let report = self.state.refresh(&names).await;
        tracing::info!(
            "Refreshed {} providers ({} failed, {} superseded)",
            report.loaded.len(),
            report.failed.len(),
            report.superseded.len()
        );
    }
}

/// Spawn the refresh worker on the state's task tracker.
///
/// Returns a handle to the spawned task.
pub fn spawn_refresh_worker(
    state: Arc<ContextState>,
    signals: mpsc::Receiver<ChangeSignal>,
) -> tokio::task::JoinHandle<()> {
    let tracker = state.tracker().clone();
    tracker.spawn(RefreshWorker::new(state, signals).run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_pending_merge_named() {
        let mut pending = Pending::default();
        pending.merge(ChangeSignal::providers(["file", "folder"]));
        pending.merge(ChangeSignal::providers(["file", "symbol"]));

        let Pending::Named(names) = pending else {
            panic!("expected named providers");
        };
        check!(names == vec!["file", "folder", "symbol"]);
    }

    #[test]
    fn test_pending_all_absorbs_named() {
        let mut pending = Pending::default();
        pending.merge(ChangeSignal::providers(["file"]));
        pending.merge(ChangeSignal::all());
        pending.merge(ChangeSignal::providers(["folder"]));
        check!(matches!(pending, Pending::All));
    }
}
