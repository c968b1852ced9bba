use crate::error::{HistoryError, Result};
use crate::log::reader::RawChunk;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Free-form attributes carried in a record's `otherinfo` object.
pub type ExtraInfo = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Dag,
    Vertex,
    Task,
    TaskAttempt,
}

impl EntityKind {
    /// Map a record's `entitytype` tag. The sink's `TEZ_` prefix is optional.
    /// Unknown tags yield `None` and are ignored by the caller.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.strip_prefix("TEZ_").unwrap_or(tag) {
            "DAG_ID" => Some(Self::Dag),
            "VERTEX_ID" => Some(Self::Vertex),
            "TASK_ID" => Some(Self::Task),
            "TASK_ATTEMPT_ID" => Some(Self::TaskAttempt),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Dag => "TEZ_DAG_ID",
            Self::Vertex => "TEZ_VERTEX_ID",
            Self::Task => "TEZ_TASK_ID",
            Self::TaskAttempt => "TEZ_TASK_ATTEMPT_ID",
        }
    }
}

/// A decoded record, consumed by the merge stage right after decode.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub entity: String,
    pub entity_type: String,
    pub other_info: Option<ExtraInfo>,
    /// Left untyped: relation extraction must never fail on its shape.
    pub related_entities: Option<Value>,
    /// Every other top-level field (`events`, `primaryfilters`, ...).
    pub rest: ExtraInfo,
}

impl RawRecord {
    pub fn kind(&self) -> Option<EntityKind> {
        EntityKind::from_tag(&self.entity_type)
    }
}

/// Record shape on the wire. Both spellings of the tag and extra info are
/// separate fields so a record carrying both still decodes.
#[derive(Debug, Deserialize)]
struct WireRecord {
    entity: String,

    #[serde(default)]
    entitytype: Option<Value>,

    #[serde(rename = "entityType", default)]
    entity_type_camel: Option<Value>,

    #[serde(default)]
    otherinfo: Option<Value>,

    #[serde(rename = "otherInfo", default)]
    other_info_camel: Option<Value>,

    #[serde(rename = "relatedEntities", default)]
    related_entities: Option<Value>,

    #[serde(flatten)]
    rest: ExtraInfo,
}

/// Decode one chunk. Any failure is fatal for the parse.
///
/// `entitytype` wins over `entityType` and `otherinfo` over `otherInfo`;
/// the other spelling is ignored.
pub fn decode_record(chunk: &RawChunk) -> Result<RawRecord> {
    let malformed = |msg: String| {
        HistoryError::malformed(format!("cannot decode record #{}: {}", chunk.index, msg))
    };

    let wire: WireRecord =
        serde_json::from_str(&chunk.text).map_err(|e| malformed(e.to_string()))?;

    let entity_type = match wire.entitytype.or(wire.entity_type_camel) {
        Some(Value::String(tag)) => tag,
        Some(other) => return Err(malformed(format!("entitytype is not a string: {other}"))),
        None => return Err(malformed("missing field `entitytype`".to_string())),
    };

    // Anything but an object counts as "no otherinfo".
    let other_info = match wire.otherinfo.or(wire.other_info_camel) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    };

    Ok(RawRecord {
        entity: wire.entity,
        entity_type,
        other_info,
        related_entities: wire.related_entities,
        rest: wire.rest,
    })
}
