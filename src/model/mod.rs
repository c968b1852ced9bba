//! In-memory history model: a DAG owning its vertices, tasks and attempts.

mod build;

pub use build::build_dag;

use crate::id::{AttemptId, DagId, TaskId, VertexId};
use crate::log::ExtraInfo;
use crate::merge::MergedRecord;
use crate::merge::relations::{CONTAINER_ID, NODE_ID};

use serde::Serialize;
use serde_json::Value;

/// Builds a typed entity from its merged record.
pub trait FromRecord: Sized {
    type Id;

    fn from_record(id: Self::Id, record: MergedRecord) -> Self;
}

/// Attributes shared by every entity kind. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Common {
    entity: String,
    status: Option<String>,
    start_time: Option<i64>,
    end_time: Option<i64>,
    time_taken: Option<i64>,
    diagnostics: Option<String>,
    attributes: ExtraInfo,
    events: Vec<Value>,
    related_entities: Vec<Value>,
    fields: ExtraInfo,
}

impl Common {
    fn take(record: MergedRecord, mut info: ExtraInfo) -> Self {
        let MergedRecord {
            entity,
            related_entities,
            mut rest,
            ..
        } = record;
        Self {
            status: take_str(&mut info, "status"),
            start_time: take_i64(&mut info, "startTime"),
            end_time: take_i64(&mut info, "endTime"),
            time_taken: take_i64(&mut info, "timeTaken"),
            diagnostics: take_str(&mut info, "diagnostics"),
            attributes: info,
            events: take_list(&mut rest, "events"),
            related_entities: match related_entities {
                Some(Value::Array(list)) => list,
                _ => Vec::new(),
            },
            fields: rest,
            entity,
        }
    }

    /// Identifier exactly as it appears in the log.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<i64> {
        self.end_time
    }

    pub fn time_taken(&self) -> Option<i64> {
        self.time_taken
    }

    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }

    /// Extra info not lifted into a typed field.
    pub fn attributes(&self) -> &ExtraInfo {
        &self.attributes
    }

    /// The first record's `events` list.
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    pub fn related_entities(&self) -> &[Value] {
        &self.related_entities
    }

    /// Remaining top-level fields of the first record (`primaryfilters`, ...).
    pub fn fields(&self) -> &ExtraInfo {
        &self.fields
    }
}

fn take_list(fields: &mut ExtraInfo, key: &str) -> Vec<Value> {
    // A non-list value stays among the other fields.
    if !fields.get(key).is_some_and(Value::is_array) {
        return Vec::new();
    }
    match fields.remove(key) {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    }
}

fn take_str(info: &mut ExtraInfo, key: &str) -> Option<String> {
    match info.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn take_i64(info: &mut ExtraInfo, key: &str) -> Option<i64> {
    let parsed = match info.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    // Leave values we cannot read in `attributes`.
    if parsed.is_some() {
        info.remove(key);
    }
    parsed
}

fn split(mut record: MergedRecord) -> (MergedRecord, ExtraInfo) {
    let info = record.other_info.take().unwrap_or_default();
    (record, info)
}

#[derive(Debug, Clone, Serialize)]
pub struct DagInfo {
    #[serde(skip)]
    id: DagId,
    #[serde(flatten)]
    common: Common,
    name: Option<String>,
    vertices: Vec<VertexInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VertexInfo {
    #[serde(skip)]
    id: VertexId,
    #[serde(flatten)]
    common: Common,
    name: Option<String>,
    tasks: Vec<TaskInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    #[serde(skip)]
    id: TaskId,
    #[serde(flatten)]
    common: Common,
    successful_attempt_id: Option<String>,
    attempts: Vec<TaskAttemptInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskAttemptInfo {
    #[serde(skip)]
    id: AttemptId,
    #[serde(flatten)]
    common: Common,
    node_id: Option<String>,
    container_id: Option<String>,
}

impl FromRecord for DagInfo {
    type Id = DagId;

    fn from_record(id: DagId, record: MergedRecord) -> Self {
        let (record, mut info) = split(record);
        let name = take_str(&mut info, "dagName");
        Self {
            id,
            name,
            common: Common::take(record, info),
            vertices: Vec::new(),
        }
    }
}

impl FromRecord for VertexInfo {
    type Id = VertexId;

    fn from_record(id: VertexId, record: MergedRecord) -> Self {
        let (record, mut info) = split(record);
        let name = take_str(&mut info, "vertexName");
        Self {
            id,
            name,
            common: Common::take(record, info),
            tasks: Vec::new(),
        }
    }
}

impl FromRecord for TaskInfo {
    type Id = TaskId;

    fn from_record(id: TaskId, record: MergedRecord) -> Self {
        let (record, mut info) = split(record);
        let successful_attempt_id = take_str(&mut info, "successfulAttemptId");
        Self {
            id,
            successful_attempt_id,
            common: Common::take(record, info),
            attempts: Vec::new(),
        }
    }
}

impl FromRecord for TaskAttemptInfo {
    type Id = AttemptId;

    fn from_record(id: AttemptId, record: MergedRecord) -> Self {
        let (record, mut info) = split(record);
        let node_id = take_str(&mut info, NODE_ID);
        let container_id = take_str(&mut info, CONTAINER_ID);
        Self {
            id,
            node_id,
            container_id,
            common: Common::take(record, info),
        }
    }
}

impl DagInfo {
    pub fn id(&self) -> &DagId {
        &self.id
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn vertices(&self) -> &[VertexInfo] {
        &self.vertices
    }

    pub fn vertex(&self, id: &VertexId) -> Option<&VertexInfo> {
        self.vertices.iter().find(|v| &v.id == id)
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<&VertexInfo> {
        self.vertices.iter().find(|v| v.name() == Some(name))
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskInfo> {
        self.vertices.iter().flat_map(|v| v.tasks.iter())
    }

    pub fn attempts(&self) -> impl Iterator<Item = &TaskAttemptInfo> {
        self.tasks().flat_map(|t| t.attempts.iter())
    }
}

impl VertexInfo {
    pub fn id(&self) -> &VertexId {
        &self.id
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&TaskInfo> {
        self.tasks.iter().find(|t| &t.id == id)
    }
}

impl TaskInfo {
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn successful_attempt_id(&self) -> Option<&str> {
        self.successful_attempt_id.as_deref()
    }

    pub fn attempts(&self) -> &[TaskAttemptInfo] {
        &self.attempts
    }

    /// The attempt named by `successfulAttemptId`, if it was logged.
    pub fn successful_attempt(&self) -> Option<&TaskAttemptInfo> {
        let wanted: AttemptId = self.successful_attempt_id.as_deref()?.parse().ok()?;
        self.attempts.iter().find(|a| a.id == wanted)
    }
}

impl TaskAttemptInfo {
    pub fn id(&self) -> &AttemptId {
        &self.id
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }
}
