//! The reach metric as a long-running, cancellable statistic.
//!
//! [`ReachMetric`] owns everything that outlives a single run: configuration, the last
//! completed result, the cancellation token and the progress sink. A run moves it through
//! `Idle -> Running -> {Completed | Cancelled}`; only one run may be in flight at a time.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::attributes::{AttributeTable, DEFAULT_MEMBERSHIP_COLUMN};
use crate::cancel::CancellationToken;
use crate::graph::{Graph, SharedGraph};
use crate::progress::{total_units, Control, NoProgress, ProgressSink};
use crate::reach::{reach_snapshot, ReachRun};
use crate::snapshot::GraphSnapshot;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachConfig {
    /// Boolean node column that marks set members.
    pub membership_column: String,
}

impl Default for ReachConfig {
    fn default() -> Self {
        Self {
            membership_column: DEFAULT_MEMBERSHIP_COLUMN.to_string(),
        }
    }
}

impl ReachConfig {
    pub fn validate(&self) -> Result<()> {
        if self.membership_column.trim().is_empty() {
            return Err(Error::InvalidParameter(
                "membership_column must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a [`ReachMetric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// A fresh value is stored.
    Completed,
    /// Cancelled; the previous value is kept.
    Cancelled,
}

/// Single-flight reach computation holding the last completed result.
pub struct ReachMetric {
    config: ReachConfig,
    state: Mutex<MetricState>,
    last_run: Mutex<Option<ReachRun>>,
    cancel: CancellationToken,
    progress: Mutex<Option<Arc<dyn ProgressSink>>>,
}

impl Default for ReachMetric {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachMetric {
    pub fn new() -> Self {
        Self {
            config: ReachConfig::default(),
            state: Mutex::new(MetricState::Idle),
            last_run: Mutex::new(None),
            cancel: CancellationToken::new(),
            progress: Mutex::new(None),
        }
    }

    pub fn with_config(config: ReachConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &ReachConfig {
        &self.config
    }

    /// Run against a shared graph, reading membership from the configured column of `table`.
    ///
    /// The read lock is held only while the snapshot is captured; writers may proceed during
    /// the shortest-path stage.
    pub fn execute<G, A>(&self, graph: &SharedGraph<G>, table: &A) -> Result<RunStatus>
    where
        G: Graph,
        A: AttributeTable + ?Sized,
    {
        self.run(|sink, control| {
            let guard = graph.read();
            sink.start(total_units(guard.node_count()));
            Ok(GraphSnapshot::from_table(
                &*guard,
                table,
                &self.config.membership_column,
                control,
            ))
        })
    }

    /// Like [`ReachMetric::execute`], for a graph the caller already holds consistently.
    pub fn execute_graph<G, A>(&self, graph: &G, table: &A) -> Result<RunStatus>
    where
        G: Graph,
        A: AttributeTable + ?Sized,
    {
        self.run(|sink, control| {
            sink.start(total_units(graph.node_count()));
            Ok(GraphSnapshot::from_table(
                graph,
                table,
                &self.config.membership_column,
                control,
            ))
        })
    }

    /// Run with caller-supplied membership; `flags.len()` must equal the node count.
    pub fn execute_with_flags<G: Graph>(&self, graph: &G, flags: &[bool]) -> Result<RunStatus> {
        self.run(|sink, control| {
            sink.start(total_units(graph.node_count()));
            GraphSnapshot::from_flags(graph, flags, control)
        })
    }

    fn run<F>(&self, capture: F) -> Result<RunStatus>
    where
        F: FnOnce(&dyn ProgressSink, Control<'_>) -> Result<GraphSnapshot>,
    {
        let mut guard = {
            let mut state = self.state.lock();
            if *state == MetricState::Running {
                tracing::warn!("reach metric already running; rejecting concurrent execute");
                return Err(Error::AlreadyRunning);
            }
            // Reset before publishing `Running`: anyone who sees `Running` cancels this run.
            self.cancel.reset();
            let previous = *state;
            *state = MetricState::Running;
            RunningGuard {
                state: &self.state,
                previous,
                armed: true,
            }
        };

        let sink: Arc<dyn ProgressSink> = match self.progress.lock().clone() {
            Some(sink) => sink,
            None => Arc::new(NoProgress),
        };
        let control = Control::new(&self.cancel, sink.as_ref());

        let snapshot = capture(sink.as_ref(), control)?;
        tracing::debug!(
            n = snapshot.node_count(),
            set_size = snapshot.set_size(),
            "captured graph snapshot"
        );

        let status = match reach_snapshot(&snapshot, control) {
            Some(run) => {
                tracing::info!(
                    value = run.value,
                    set_size = run.set_size,
                    unreachable = run.unreachable,
                    "reach metric completed"
                );
                *self.last_run.lock() = Some(run);
                guard.finish(MetricState::Completed);
                RunStatus::Completed
            }
            None => {
                tracing::debug!("reach metric cancelled; keeping previous value");
                guard.finish(MetricState::Cancelled);
                RunStatus::Cancelled
            }
        };
        Ok(status)
    }

    /// Last completed reach value, `0.0` before any run completes.
    pub fn value(&self) -> f64 {
        self.last_run.lock().as_ref().map_or(0.0, |run| run.value)
    }

    /// Full result of the last completed run.
    pub fn last_run(&self) -> Option<ReachRun> {
        self.last_run.lock().clone()
    }

    pub fn state(&self) -> MetricState {
        *self.state.lock()
    }

    /// HTML summary of the last completed value.
    pub fn report(&self) -> String {
        format!(
            "<html><body><h1>Reach Metric Report</h1>\
             <hr>\
             <br>\
             <br><h2>Results:</h2>\
             Reach Metric: {:.4}\
             </body></html>",
            self.value()
        )
    }

    /// Request cancellation of the in-flight run. Safe from any thread; always acknowledged.
    ///
    /// Each run clears the flag when it starts, so a cancel issued while idle has no effect.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel();
        true
    }

    /// Handle to the cancellation flag, for cancelling from code that cannot reach `self`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Sink for subsequent runs.
    pub fn set_progress_ticket(&self, sink: Arc<dyn ProgressSink>) {
        *self.progress.lock() = Some(sink);
    }
}

impl std::fmt::Debug for ReachMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReachMetric")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("value", &self.value())
            .finish_non_exhaustive()
    }
}

/// Puts the state back if a run leaves early (error or panic).
struct RunningGuard<'a> {
    state: &'a Mutex<MetricState>,
    previous: MetricState,
    armed: bool,
}

impl RunningGuard<'_> {
    fn finish(&mut self, state: MetricState) {
        *self.state.lock() = state;
        self.armed = false;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.state.lock() = self.previous;
        }
    }
}
