//! Merge stage: route decoded records to per-kind buckets, drop records that
//! belong to another run, and fold partial records into one per entity.
//!
//! The [`Accumulator`] is threaded through the record stream by value
//! (`try_fold`), then turned into a [`MergedRun`] once the stream ends.

pub mod bucket;
pub mod relations;

pub use bucket::{Bucket, MergedRecord};
pub use relations::extract_relations;

use crate::error::{HistoryError, Result};
use crate::id::{AttemptId, DagId, TaskId, VertexId};
use crate::log::{EntityKind, RawRecord};

use tracing::warn;

/// The run a parse is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScope {
    raw: String,
    dag: DagId,
}

impl RunScope {
    /// `run_id` is trimmed; it must be non-empty and parse as a DAG id.
    pub fn new(run_id: &str) -> Result<Self> {
        let raw = run_id.trim();
        if raw.is_empty() {
            return Err(HistoryError::InvalidArgument(
                "please provide a valid dag id".to_string(),
            ));
        }
        let dag = raw
            .parse()
            .map_err(|e| HistoryError::InvalidArgument(format!("{e}")))?;
        Ok(Self {
            raw: raw.to_string(),
            dag,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn dag(&self) -> &DagId {
        &self.dag
    }

    fn owns(&self, routed: &Routed) -> bool {
        match routed {
            // DAG records are matched on the literal id.
            Routed::Dag(raw) => raw.entity == self.raw,
            Routed::Vertex(id, _) => id.dag() == &self.dag,
            Routed::Task(id, _) => id.dag() == &self.dag,
            Routed::Attempt(id, _) => id.dag() == &self.dag,
        }
    }
}

/// A record tagged with its kind and parsed identifier.
#[derive(Debug, Clone)]
pub enum Routed {
    Dag(RawRecord),
    Vertex(VertexId, RawRecord),
    Task(TaskId, RawRecord),
    Attempt(AttemptId, RawRecord),
}

impl Routed {
    /// `Ok(None)` for kinds this parser does not know; an unparsable
    /// identifier is malformed input.
    pub fn classify(raw: RawRecord) -> Result<Option<Self>> {
        let Some(kind) = raw.kind() else {
            return Ok(None);
        };
        let routed = match kind {
            EntityKind::Dag => Self::Dag(raw),
            EntityKind::Vertex => Self::Vertex(raw.entity.parse()?, raw),
            EntityKind::Task => Self::Task(raw.entity.parse()?, raw),
            EntityKind::TaskAttempt => Self::Attempt(raw.entity.parse()?, raw),
        };
        Ok(Some(routed))
    }

    fn entity(&self) -> &str {
        match self {
            Self::Dag(raw)
            | Self::Vertex(_, raw)
            | Self::Task(_, raw)
            | Self::Attempt(_, raw) => &raw.entity,
        }
    }
}

/// Per-kind buckets for one parse invocation.
#[derive(Debug)]
pub struct Accumulator {
    scope: RunScope,
    dag: Option<MergedRecord>,
    vertices: Bucket<VertexId>,
    tasks: Bucket<TaskId>,
    attempts: Bucket<AttemptId>,
    skipped: usize,
}

impl Accumulator {
    pub fn new(scope: RunScope) -> Self {
        Self {
            scope,
            dag: None,
            vertices: Bucket::default(),
            tasks: Bucket::default(),
            attempts: Bucket::default(),
            skipped: 0,
        }
    }

    /// Fold one decoded record in.
    pub fn absorb(mut self, raw: RawRecord) -> Result<Self> {
        let Some(routed) = Routed::classify(raw)? else {
            return Ok(self);
        };

        if !self.scope.owns(&routed) {
            warn!(
                entity = routed.entity(),
                dag = self.scope.raw(),
                "record does not belong to requested dag; skipping"
            );
            self.skipped += 1;
            return Ok(self);
        }

        match routed {
            Routed::Dag(raw) => match self.dag.as_mut() {
                Some(dag) => dag.absorb(raw.other_info),
                None => self.dag = Some(raw.into()),
            },
            Routed::Vertex(id, raw) => self.vertices.merge(id, raw),
            Routed::Task(id, raw) => self.tasks.merge(id, raw),
            Routed::Attempt(id, raw) => self.attempts.merge(id, raw),
        }
        Ok(self)
    }

    /// Close the fold and run relation extraction over the final attempts.
    pub fn finish(self) -> MergedRun {
        let mut attempts = self.attempts;
        attempts.values_mut().for_each(extract_relations);
        MergedRun {
            scope: self.scope,
            dag: self.dag,
            vertices: self.vertices,
            tasks: self.tasks,
            attempts,
            skipped: self.skipped,
        }
    }
}

/// Result of the merge stage, consumed by the model builder.
#[derive(Debug)]
pub struct MergedRun {
    pub scope: RunScope,
    /// `None` when no record for the requested DAG was seen.
    pub dag: Option<MergedRecord>,
    pub vertices: Bucket<VertexId>,
    pub tasks: Bucket<TaskId>,
    pub attempts: Bucket<AttemptId>,
    /// Records dropped because they belong to another run.
    pub skipped: usize,
}
