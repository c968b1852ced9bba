//! Structured run-scoped identifiers.
//!
//! Every non-DAG id embeds its parent, so ownership is decided by walking
//! the chain up to the `DagId`:
//!
//! ```text
//! dag_1                         vertex_1438652049951_0008_1_00
//! dag_1_vertex_1                task_1438652049951_0008_1_00_000003
//! dag_1_vertex_1_task_1         attempt_1438652049951_0008_1_00_000003_0
//! dag_1_vertex_1_task_1_attempt_1
//! ```
//!
//! The left column is the nested notation, the right the sink's flat one.
//! Both parse into the same structure; zero padding is not significant.

mod grammar;

use std::fmt;
use std::str::FromStr;

use grammar::{split_flat, split_nested};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {kind} id from {raw:?}")]
pub struct IdParseError {
    pub kind: &'static str,
    pub raw: String,
}

impl IdParseError {
    fn new(kind: &'static str, raw: &str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
        }
    }
}

/// Root of the ownership chain, stored as its numeric components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DagId(Vec<u64>);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId {
    dag: DagId,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId {
    vertex: VertexId,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId {
    task: TaskId,
    seq: u64,
}

impl DagId {
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl VertexId {
    pub fn dag(&self) -> &DagId {
        &self.dag
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl TaskId {
    pub fn vertex(&self) -> &VertexId {
        &self.vertex
    }

    pub fn dag(&self) -> &DagId {
        self.vertex.dag()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl AttemptId {
    pub fn task(&self) -> &TaskId {
        &self.task
    }

    pub fn dag(&self) -> &DagId {
        self.task.dag()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl FromStr for DagId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split_flat(s, "dag") {
            Some(Ok(parts)) => Ok(Self(parts)),
            _ => Err(IdParseError::new("dag", s)),
        }
    }
}

impl FromStr for VertexId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IdParseError::new("vertex", s);

        // vertex_<ts>_<app>_<dag>_<vertex>
        if let Some(parts) = split_flat(s, "vertex") {
            let parts = parts.map_err(|_| err())?;
            return match parts.as_slice() {
                [ts, app, dag, seq] => Ok(Self {
                    dag: DagId(vec![*ts, *app, *dag]),
                    seq: *seq,
                }),
                _ => Err(err()),
            };
        }

        let (parent, seq) = split_nested(s, "vertex").ok_or_else(err)?;
        Ok(Self {
            dag: parent.parse().map_err(|_| err())?,
            seq,
        })
    }
}

impl FromStr for TaskId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IdParseError::new("task", s);

        if let Some(parts) = split_flat(s, "task") {
            let parts = parts.map_err(|_| err())?;
            return match parts.as_slice() {
                [ts, app, dag, vertex, seq] => Ok(Self {
                    vertex: VertexId {
                        dag: DagId(vec![*ts, *app, *dag]),
                        seq: *vertex,
                    },
                    seq: *seq,
                }),
                _ => Err(err()),
            };
        }

        let (parent, seq) = split_nested(s, "task").ok_or_else(err)?;
        Ok(Self {
            vertex: parent.parse().map_err(|_| err())?,
            seq,
        })
    }
}

impl FromStr for AttemptId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IdParseError::new("attempt", s);

        if let Some(parts) = split_flat(s, "attempt") {
            let parts = parts.map_err(|_| err())?;
            return match parts.as_slice() {
                [ts, app, dag, vertex, task, seq] => Ok(Self {
                    task: TaskId {
                        vertex: VertexId {
                            dag: DagId(vec![*ts, *app, *dag]),
                            seq: *vertex,
                        },
                        seq: *task,
                    },
                    seq: *seq,
                }),
                _ => Err(err()),
            };
        }

        let (parent, seq) = split_nested(s, "attempt").ok_or_else(err)?;
        Ok(Self {
            task: parent.parse().map_err(|_| err())?,
            seq,
        })
    }
}

impl fmt::Display for DagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            // Sink layout: dag_<clusterTs>_<appSeq:04>_<dagSeq>
            [ts, app, seq] => write!(f, "dag_{ts}_{app:04}_{seq}"),
            parts => {
                write!(f, "dag")?;
                for p in parts {
                    write!(f, "_{p}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_chain_walks_to_dag() {
        let attempt: AttemptId = "dag_1_vertex_2_task_3_attempt_4".parse().unwrap();
        assert_eq!(attempt.seq(), 4);
        assert_eq!(attempt.task().seq(), 3);
        assert_eq!(attempt.task().vertex().seq(), 2);
        assert_eq!(attempt.dag(), &"dag_1".parse::<DagId>().unwrap());
    }

    #[test]
    fn flat_chain_walks_to_dag() {
        let attempt: AttemptId = "attempt_1438652049951_0008_1_00_000152_0".parse().unwrap();
        let dag: DagId = "dag_1438652049951_0008_1".parse().unwrap();
        assert_eq!(attempt.dag(), &dag);
        assert_eq!(attempt.task().seq(), 152);

        let task: TaskId = "task_1438652049951_0008_1_00_000152".parse().unwrap();
        assert_eq!(attempt.task(), &task);
    }

    #[test]
    fn padding_is_not_significant() {
        let a: VertexId = "vertex_1438652049951_0008_1_00".parse().unwrap();
        let b: VertexId = "vertex_1438652049951_8_1_0".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multi_component_nested_dag() {
        let v: VertexId = "dag_1438652049951_0008_1_vertex_7".parse().unwrap();
        assert_eq!(v.dag().components(), &[1438652049951, 8, 1]);
        assert_eq!(v.seq(), 7);
    }

    #[test]
    fn dag_display_matches_sink_layout() {
        let dag: DagId = "dag_1438652049951_0008_1".parse().unwrap();
        assert_eq!(dag.to_string(), "dag_1438652049951_0008_1");
        let dag: DagId = "dag_1".parse().unwrap();
        assert_eq!(dag.to_string(), "dag_1");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("dag_".parse::<DagId>().is_err());
        assert!("dag_x".parse::<DagId>().is_err());
        assert!("vertex_1_2".parse::<VertexId>().is_err());
        assert!("dag_1_task_1".parse::<TaskId>().is_err());
        assert!("garbage".parse::<AttemptId>().is_err());
        assert!("dag_1_vertex_1_task_".parse::<TaskId>().is_err());
        assert!("dag_1_vertex_99999999999999999999999".parse::<VertexId>().is_err());
    }

    #[test]
    fn error_names_kind_and_input() {
        let err = "dag_1_vertex_q".parse::<VertexId>().unwrap_err();
        assert_eq!(err.kind, "vertex");
        assert_eq!(err.to_string(), "cannot parse vertex id from \"dag_1_vertex_q\"");
    }
}
