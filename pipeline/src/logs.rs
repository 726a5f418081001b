//! Stage-tagged run log.
//!
//! Each pipeline stage reports what it did as a [`StageEvent`]. Events are
//! echoed to stderr as `[stage] message` and published on a process-wide
//! channel, so an embedding caller can follow a run (or assert on it in
//! tests) without scraping the console.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast;

use crate::error::{EncodingError, PipelineError};

/// Pipeline stage an event belongs to, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Fit,
    Transform,
    Aggregate,
    Stamp,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Fit => "fit",
            Stage::Transform => "transform",
            Stage::Aggregate => "aggregate",
            Stage::Stamp => "stamp",
            Stage::Export => "export",
        }
    }

    /// Stage a run failed in.
    pub fn of(err: &PipelineError) -> Stage {
        match err {
            PipelineError::Load(_) => Stage::Load,
            PipelineError::Encoding(
                EncodingError::EmptyColumn(_) | EncodingError::TooManyCategories { .. },
            ) => Stage::Fit,
            PipelineError::Encoding(_) | PipelineError::Derivation(_) | PipelineError::Worker(_) => {
                Stage::Transform
            }
            PipelineError::Export(_) => Stage::Export,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Progress,
    Done,
    Warning,
    Failed,
}

/// One reported step of a run.
#[derive(Debug, Clone, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub outcome: Outcome,
    pub message: String,
    /// Sub-step depth under the stage line
    pub depth: u8,
}

impl StageEvent {
    pub fn new(stage: Stage, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            stage,
            outcome,
            message: message.into(),
            depth: 0,
        }
    }

    pub fn nested(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Console form: `[stage] ✓ message`, sub-steps indented.
    pub fn render(&self) -> String {
        let mark = match self.outcome {
            Outcome::Progress => "·",
            Outcome::Done => "✓",
            Outcome::Warning => "⚠",
            Outcome::Failed => "✗",
        };
        format!(
            "{}[{}] {} {}",
            "   ".repeat(self.depth as usize),
            self.stage,
            mark,
            self.message
        )
    }
}

/// Process-wide run log.
pub static RUN_LOG: Lazy<RunLog> = Lazy::new(|| RunLog::with_capacity(256));

pub struct RunLog {
    events: broadcast::Sender<StageEvent>,
}

impl RunLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self { events }
    }

    pub fn emit(&self, event: StageEvent) {
        eprintln!("{}", event.render());
        // a run without listeners is the normal CLI case
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.events.subscribe()
    }
}

pub fn progress(stage: Stage, msg: impl Into<String>) {
    RUN_LOG.emit(StageEvent::new(stage, Outcome::Progress, msg));
}

pub fn progress_nested(stage: Stage, msg: impl Into<String>) {
    RUN_LOG.emit(StageEvent::new(stage, Outcome::Progress, msg).nested(1));
}

pub fn done(stage: Stage, msg: impl Into<String>) {
    RUN_LOG.emit(StageEvent::new(stage, Outcome::Done, msg));
}

pub fn warning(stage: Stage, msg: impl Into<String>) {
    RUN_LOG.emit(StageEvent::new(stage, Outcome::Warning, msg));
}

/// Report the error that aborted a run, tagged with the stage it came from.
pub fn failed(err: &PipelineError) {
    RUN_LOG.emit(StageEvent::new(Stage::of(err), Outcome::Failed, err.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DerivationError, LoadError};

    #[test]
    fn test_subscriber_receives_events_in_order() {
        let log = RunLog::with_capacity(8);
        let mut rx = log.subscribe();

        log.emit(StageEvent::new(Stage::Load, Outcome::Done, "Read 3 rows"));
        log.emit(StageEvent::new(Stage::Fit, Outcome::Progress, "cp=0 → index 0").nested(1));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.stage, Stage::Load);
        assert_eq!(first.outcome, Outcome::Done);
        assert_eq!(first.message, "Read 3 rows");

        let second = rx.try_recv().unwrap();
        assert_eq!(second.stage, Stage::Fit);
        assert_eq!(second.depth, 1);
    }

    #[test]
    fn test_emit_without_listeners() {
        RunLog::with_capacity(1).emit(StageEvent::new(Stage::Stamp, Outcome::Progress, "2024-06-15"));
    }

    #[test]
    fn test_render() {
        let event = StageEvent::new(Stage::Aggregate, Outcome::Done, "3 High");
        assert_eq!(event.render(), "[aggregate] ✓ 3 High");
        assert_eq!(event.nested(1).render(), "   [aggregate] ✓ 3 High");
    }

    #[test]
    fn test_failure_stage() {
        let cases = [
            (PipelineError::Load(LoadError::Empty), Stage::Load),
            (EncodingError::EmptyColumn("cp".into()).into(), Stage::Fit),
            (EncodingError::NullCategory("cp".into()).into(), Stage::Transform),
            (
                DerivationError::Overflow {
                    feature: "powerOfTrestbps".into(),
                    input: i64::MAX,
                }
                .into(),
                Stage::Transform,
            ),
            (PipelineError::Worker("panicked".into()), Stage::Transform),
        ];
        for (err, stage) in cases {
            assert_eq!(Stage::of(&err), stage, "{err}");
        }
    }

    #[test]
    fn test_failed_is_published() {
        let mut rx = RUN_LOG.subscribe();
        failed(&PipelineError::Load(LoadError::Empty));

        let event = loop {
            match rx.try_recv() {
                Ok(event) if event.outcome == Outcome::Failed => break event,
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(e) => panic!("no failure event: {e}"),
            }
        };
        assert_eq!(event.stage, Stage::Load);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(StageEvent::new(Stage::Export, Outcome::Failed, "disk full")).unwrap();
        assert_eq!(json["stage"], "export");
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["depth"], 0);
    }
}
