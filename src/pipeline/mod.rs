//! Sequential build/bundle pipeline.
//!
//! A [`Pipeline`] is an ordered list of named stages. Stages are lazy futures,
//! so a stage that is never reached never performs any side effects. The
//! runner stops at the first failure and reports which stage failed.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Boxed stage body.
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// The stages a pipeline can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Compiles the product.
    Build,
    /// Assembles the `.app` from the built product.
    Bundle,
}

impl StageKind {
    /// State the pipeline is in while this stage runs.
    fn running_state(self) -> PipelineState {
        match self {
            StageKind::Build => PipelineState::Building,
            StageKind::Bundle => PipelineState::Bundling,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Build => f.write_str("build"),
            StageKind::Bundle => f.write_str("bundle"),
        }
    }
}

/// Pipeline progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// No stage has run yet.
    NotStarted,
    /// The build stage is running.
    Building,
    /// The bundle stage is running.
    Bundling,
    /// Every stage completed.
    Succeeded,
    /// A stage failed and the rest were skipped.
    Failed {
        /// Stage that failed
        stage: StageKind,
        /// Rendered error chain
        error: String,
    },
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::NotStarted => f.write_str("not started"),
            PipelineState::Building => f.write_str("building"),
            PipelineState::Bundling => f.write_str("bundling"),
            PipelineState::Succeeded => f.write_str("succeeded"),
            PipelineState::Failed { stage, error } => write!(f, "{stage} failed: {error}"),
        }
    }
}

/// A stage that returned an error. The remaining stages did not run.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source:#}")]
pub struct StageFailure {
    /// Stage that returned the error.
    pub stage: StageKind,
    /// Error returned by the stage.
    pub source: anyhow::Error,
    /// Wall-clock time until the failure.
    pub elapsed: Duration,
}

impl StageFailure {
    /// Terminal state of the failed pipeline.
    pub fn state(&self) -> PipelineState {
        PipelineState::Failed {
            stage: self.stage,
            error: format!("{:#}", self.source),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Stages that ran, in order.
    pub stages: Vec<StageKind>,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

/// One named stage.
pub struct Stage<'a> {
    kind: StageKind,
    future: StageFuture<'a>,
}

impl<'a> Stage<'a> {
    pub fn new<F>(kind: StageKind, future: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'a,
    {
        Self {
            kind,
            future: Box::pin(future),
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }
}

impl fmt::Debug for Stage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("kind", &self.kind).finish()
    }
}

type Observer<'a> = Box<dyn FnMut(&PipelineState) + 'a>;

/// Ordered, short-circuiting list of stages.
pub struct Pipeline<'a> {
    stages: Vec<Stage<'a>>,
    observer: Option<Observer<'a>>,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline from an explicit list of stages.
    pub fn new(stages: Vec<Stage<'a>>) -> Self {
        Self {
            stages,
            observer: None,
        }
    }

    /// `bundle` alone when the build is skipped, otherwise `build` then `bundle`.
    pub fn compose<B, U>(skip_build: bool, build: B, bundle: U) -> Self
    where
        B: Future<Output = anyhow::Result<()>> + Send + 'a,
        U: Future<Output = anyhow::Result<()>> + Send + 'a,
    {
        let mut stages = Vec::with_capacity(2);
        if !skip_build {
            stages.push(Stage::new(StageKind::Build, build));
        }
        stages.push(Stage::new(StageKind::Bundle, bundle));
        Self::new(stages)
    }

    /// Calls `observer` on every state transition.
    pub fn on_transition<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&PipelineState) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// The stages in execution order.
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    /// Runs the stages in order, stopping at the first failure.
    pub async fn run(self) -> Result<PipelineReport, StageFailure> {
        let Pipeline {
            stages,
            mut observer,
        } = self;
        let mut transition = |state: PipelineState| {
            log::debug!("Pipeline state: {state}");
            if let Some(observer) = observer.as_mut() {
                observer(&state);
            }
        };

        let (outcome, elapsed) = timed(async {
            let mut completed = Vec::with_capacity(stages.len());
            for stage in stages {
                transition(stage.kind.running_state());
                if let Err(source) = stage.future.await {
                    return Err((stage.kind, source));
                }
                completed.push(stage.kind);
            }
            Ok(completed)
        })
        .await;

        match outcome {
            Ok(stages) => {
                transition(PipelineState::Succeeded);
                log::info!("Pipeline finished in {elapsed:.2?}");
                Ok(PipelineReport { stages, elapsed })
            }
            Err((stage, source)) => {
                let failure = StageFailure {
                    stage,
                    source,
                    elapsed,
                };
                transition(failure.state());
                log::debug!("Pipeline failed after {elapsed:.2?}");
                Err(failure)
            }
        }
    }
}

/// Awaits `future` and measures its wall-clock duration.
pub async fn timed<F: Future>(future: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let output = future.await;
    (output, start.elapsed())
}

/// Formats a duration for the final status line (`1.24s`, `2m 3s`).
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}
