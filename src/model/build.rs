use crate::error::{HistoryError, Result};
use crate::id::{TaskId, VertexId};
use crate::merge::MergedRun;
use crate::model::{DagInfo, FromRecord, TaskAttemptInfo, TaskInfo, VertexInfo};

use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Build typed entities from merged records and link them into one tree.
///
/// Entities are built DAG first, then vertices, tasks and attempts. Links
/// come from identifier containment only; a task or attempt whose parent
/// has no record makes the log incomplete.
pub fn build_dag(run: MergedRun) -> Result<DagInfo> {
    let MergedRun {
        scope,
        dag,
        vertices,
        tasks,
        attempts,
        skipped,
    } = run;

    let Some(dag) = dag else {
        error!(dag = scope.raw(), "dag record not found; looks like a partial file");
        return Err(HistoryError::IncompleteLog(format!(
            "please provide a valid/complete history log file containing {}",
            scope.raw()
        )));
    };
    let mut dag = DagInfo::from_record(scope.dag().clone(), dag);

    let mut vertices: BTreeMap<VertexId, VertexInfo> = vertices
        .into_iter()
        .map(|(id, record)| {
            let vertex = VertexInfo::from_record(id.clone(), record);
            debug!(vertex = %vertex.common.entity(), "parsed vertex");
            (id, vertex)
        })
        .collect();

    let mut tasks: BTreeMap<TaskId, TaskInfo> = tasks
        .into_iter()
        .map(|(id, record)| {
            let task = TaskInfo::from_record(id.clone(), record);
            debug!(task = %task.common.entity(), "parsed task");
            (id, task)
        })
        .collect();

    let mut attempt_count = 0usize;
    for (id, record) in attempts {
        let attempt = TaskAttemptInfo::from_record(id, record);
        debug!(attempt = %attempt.common.entity(), "parsed task attempt");
        let task = tasks
            .get_mut(attempt.id.task())
            .ok_or_else(|| orphan("task attempt", attempt.common.entity(), "task"))?;
        task.attempts.push(attempt);
        attempt_count += 1;
    }

    let task_count = tasks.len();
    for (id, task) in tasks {
        let vertex = vertices
            .get_mut(id.vertex())
            .ok_or_else(|| orphan("task", task.common.entity(), "vertex"))?;
        vertex.tasks.push(task);
    }

    dag.vertices = vertices.into_values().collect();

    info!(
        dag = %dag.common.entity(),
        vertices = dag.vertices.len(),
        tasks = task_count,
        attempts = attempt_count,
        skipped,
        "parsed dag history"
    );
    Ok(dag)
}

fn orphan(kind: &str, entity: &str, parent: &str) -> HistoryError {
    HistoryError::IncompleteLog(format!("{kind} {entity} has no {parent} record in the log"))
}
