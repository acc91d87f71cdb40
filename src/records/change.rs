//! Incremental change records.

use super::decode_entity;
use crate::entities::EntityData;
use crate::types::EntityKind;
use serde_json::{Map, Value};
use tracing::debug;

/// Which mutation a change record carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "CREATE" => Some(ChangeKind::Create),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// A mutation addressed by `(kind, id)`.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeRecord {
    /// Insert (or overwrite) a full row.
    Create {
        kind: EntityKind,
        id: String,
        entity: EntityData,
    },
    /// Merge the named fields into an existing row.
    Update {
        kind: EntityKind,
        id: String,
        changed_properties: Map<String, Value>,
    },
    Delete { kind: EntityKind, id: String },
}

impl ChangeRecord {
    pub fn update(kind: EntityKind, id: impl Into<String>, changed: Map<String, Value>) -> Self {
        ChangeRecord::Update {
            kind,
            id: id.into(),
            changed_properties: changed,
        }
    }

    pub fn delete(kind: EntityKind, id: impl Into<String>) -> Self {
        ChangeRecord::Delete { kind, id: id.into() }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            ChangeRecord::Create { kind, .. }
            | ChangeRecord::Update { kind, .. }
            | ChangeRecord::Delete { kind, .. } => *kind,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ChangeRecord::Create { id, .. }
            | ChangeRecord::Update { id, .. }
            | ChangeRecord::Delete { id, .. } => id,
        }
    }

    /// Names of the fields an update touches. Empty for create and delete.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        let fields = match self {
            ChangeRecord::Update {
                changed_properties, ..
            } => Some(changed_properties.keys().map(String::as_str)),
            _ => None,
        };
        fields.into_iter().flatten()
    }

    pub fn touches_field(&self, field: &str) -> bool {
        self.changed_fields().any(|f| f == field)
    }

    /// Decode a change row. Returns `None` when the target kind or id is
    /// missing or unknown, or a create carries no decodable entity.
    pub(super) fn from_value(change: ChangeKind, value: &Value) -> Option<Self> {
        let entity_type = value.get("entityType").and_then(Value::as_str)?;
        let Some(kind) = EntityKind::from_wire(entity_type) else {
            debug!(entity_type = %entity_type, "change for unknown entity type");
            return None;
        };
        let id = match value.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        match change {
            ChangeKind::Create => {
                let entity = decode_entity(kind, value.get("entity")?.clone());
                if entity.is_unknown() {
                    return None;
                }
                Some(ChangeRecord::Create { kind, id, entity })
            }
            ChangeKind::Update => {
                let changed_properties = value
                    .get("changedProperties")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Some(ChangeRecord::Update {
                    kind,
                    id,
                    changed_properties,
                })
            }
            ChangeKind::Delete => Some(ChangeRecord::Delete { kind, id }),
        }
    }
}
