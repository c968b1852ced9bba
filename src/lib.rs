//! Rebuild one DAG run's execution history from a record-separated JSON
//! history log.
//!
//! Pipeline: [`log`] splits and decodes records, [`merge`] routes them per
//! entity kind, drops other runs' records and folds partial records
//! together, and [`model`] builds the linked DAG -> vertex -> task ->
//! attempt tree.
//!
//! ```no_run
//! let dag = dag_history::parse("history.txt", "dag_1438652049951_0008_1")?;
//! for vertex in dag.vertices() {
//!     println!("{:?}: {} tasks", vertex.name(), vertex.tasks().len());
//! }
//! # Ok::<(), dag_history::HistoryError>(())
//! ```

pub mod error;
pub mod id;
pub mod log;
pub mod merge;
pub mod model;
mod parser;

pub use error::{HistoryError, Result};
pub use model::{DagInfo, TaskAttemptInfo, TaskInfo, VertexInfo};
pub use parser::{HistoryParser, ParseOptions, parse};
