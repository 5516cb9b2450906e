//! Optional background execution for batch computations.
//!
//! # Responsibility
//! - Describe batch tasks (topic processing, question filtering, hierarchy
//!   sorting) as plain data.
//! - Run them through an `Offloader` when one is available and inline
//!   otherwise.
//!
//! # Invariants
//! - `run_inline` is the reference implementation; offloaded results are
//!   identical.
//! - An unavailable offloader never fails the caller.

use crate::hierarchy::{flatten, progress, sort_hierarchy, CourseProgress};
use crate::model::question::Question;
use crate::model::topic::Topic;
use crate::quiz::{filter_questions, QuestionFilter};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::thread;

/// Batch computation that may run off the caller's thread.
#[derive(Debug, Clone, PartialEq)]
pub enum OffloadTask {
    /// Flatten a topic tree and compute progress.
    ProcessTopics(Vec<Topic>),
    FilterQuestions {
        questions: Vec<Question>,
        filter: QuestionFilter,
    },
    SortHierarchy(Vec<Topic>),
}

impl OffloadTask {
    fn kind(&self) -> &'static str {
        match self {
            Self::ProcessTopics(_) => "process_topics",
            Self::FilterQuestions { .. } => "filter_questions",
            Self::SortHierarchy(_) => "sort_hierarchy",
        }
    }
}

/// Result of one [`OffloadTask`].
#[derive(Debug, Clone, PartialEq)]
pub enum OffloadOutput {
    ProcessedTopics {
        flattened: Vec<Topic>,
        progress: CourseProgress,
    },
    FilteredQuestions(Vec<Question>),
    SortedHierarchy(Vec<Topic>),
}

/// The offload path could not run the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadUnavailable {
    pub reason: String,
}

impl Display for OffloadUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "offload unavailable: {}", self.reason)
    }
}

impl Error for OffloadUnavailable {}

/// Capability to run a task somewhere other than the caller's thread.
pub trait Offloader {
    fn try_offload(&self, task: OffloadTask) -> Result<OffloadOutput, OffloadUnavailable>;
}

/// Offloader that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOffloader;

impl Offloader for NoOffloader {
    fn try_offload(&self, _task: OffloadTask) -> Result<OffloadOutput, OffloadUnavailable> {
        Err(OffloadUnavailable {
            reason: "no background executor configured".to_string(),
        })
    }
}

/// Runs each task on a short-lived background thread and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadOffloader;

impl Offloader for ThreadOffloader {
    fn try_offload(&self, task: OffloadTask) -> Result<OffloadOutput, OffloadUnavailable> {
        let handle = thread::Builder::new()
            .name("coursekit-offload".to_string())
            .spawn(move || run_inline(task))
            .map_err(|err| OffloadUnavailable {
                reason: format!("failed to spawn worker: {err}"),
            })?;
        handle.join().map_err(|_| OffloadUnavailable {
            reason: "worker panicked".to_string(),
        })
    }
}

/// Synchronous reference implementation for every task.
pub fn run_inline(task: OffloadTask) -> OffloadOutput {
    match task {
        OffloadTask::ProcessTopics(topics) => OffloadOutput::ProcessedTopics {
            flattened: flatten(&topics).into_iter().cloned().collect(),
            progress: progress(&topics),
        },
        OffloadTask::FilterQuestions { questions, filter } => {
            OffloadOutput::FilteredQuestions(filter_questions(&questions, &filter))
        }
        OffloadTask::SortHierarchy(topics) => {
            OffloadOutput::SortedHierarchy(sort_hierarchy(&topics))
        }
    }
}

/// Tries `offloader` first and falls back to [`run_inline`].
pub fn execute(offloader: Option<&dyn Offloader>, task: OffloadTask) -> OffloadOutput {
    let Some(offloader) = offloader else {
        return run_inline(task);
    };

    let kind = task.kind();
    let fallback = task.clone();
    match offloader.try_offload(task) {
        Ok(output) => {
            debug!("event=offload_run module=offload status=ok task={kind}");
            output
        }
        Err(err) => {
            warn!("event=offload_run module=offload status=skip task={kind} reason={err}");
            run_inline(fallback)
        }
    }
}
