// Entity identity domain models
use serde::{Deserialize, Serialize};

/// Reference to an addressable platform entity (device, asset, or group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "entityType")]
    pub entity_type: String,
    pub id: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        if self.entity_type == "ENTITY_GROUP" {
            EntityKind::Group
        } else {
            EntityKind::Device
        }
    }
}

/// Coarse entity classification; drives which subscription filter is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Group,
    Device,
}

/// One configured data source, as supplied by the hosting platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasourceConfig {
    pub alias: Option<String>,
    pub name: Option<String>,
    pub entity: Option<EntityRef>,
}

/// The resolved root entity. Set once per session; drives all queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSelection {
    pub entity: EntityRef,
    pub kind: EntityKind,
    pub display_name: String,
}
