// Wire shapes of the telemetry push channel. One bidirectional connection
// per session; commands ride in a fixed envelope, responses echo the cmdId.
use crate::domain::entity::{EntityKind, EntityRef, RootSelection};
use crate::domain::telemetry::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Correlation id of the one entity-data subscription this design issues.
pub const SUBSCRIPTION_CMD_ID: i64 = 1;

/// Command envelope. The platform expects every command group to be present,
/// populated or not, so all arrays serialize even when empty.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    pub attr_sub_cmds: Vec<serde_json::Value>,
    pub ts_sub_cmds: Vec<serde_json::Value>,
    pub history_cmds: Vec<serde_json::Value>,
    pub entity_data_cmds: Vec<EntityDataCmd>,
    pub entity_data_unsubscribe_cmds: Vec<serde_json::Value>,
    pub alarm_data_cmds: Vec<serde_json::Value>,
    pub alarm_data_unsubscribe_cmds: Vec<serde_json::Value>,
    pub entity_count_cmds: Vec<serde_json::Value>,
    pub entity_count_unsubscribe_cmds: Vec<serde_json::Value>,
}

impl CommandEnvelope {
    pub fn entity_data(cmd: EntityDataCmd) -> Self {
        Self {
            entity_data_cmds: vec![cmd],
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDataCmd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<EntityDataQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_cmd: Option<LatestValueCmd>,
    pub cmd_id: i64,
}

impl EntityDataCmd {
    /// The initial entity-query subscription.
    pub fn subscribe(filter: EntityFilter, keys: Vec<KeySpec>) -> Self {
        Self {
            query: Some(EntityDataQuery::new(filter, keys)),
            latest_cmd: None,
            cmd_id: SUBSCRIPTION_CMD_ID,
        }
    }

    /// The follow-up that attaches live value push to an answered query.
    pub fn latest_values(cmd_id: i64, keys: Vec<KeySpec>) -> Self {
        Self {
            query: None,
            latest_cmd: Some(LatestValueCmd { keys }),
            cmd_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDataQuery {
    pub entity_filter: EntityFilter,
    pub page_link: PageLink,
    pub entity_fields: Vec<KeySpec>,
    pub latest_values: Vec<KeySpec>,
}

impl EntityDataQuery {
    fn new(entity_filter: EntityFilter, latest_values: Vec<KeySpec>) -> Self {
        Self {
            entity_filter,
            page_link: PageLink::default(),
            entity_fields: vec![
                KeySpec::entity_field("name"),
                KeySpec::entity_field("label"),
            ],
            latest_values,
        }
    }
}

/// Entity filter, selected once at subscribe time from the root entity kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum EntityFilter {
    /// Group-type root: resolve the members of the group.
    #[serde(rename = "entityGroupList", rename_all = "camelCase")]
    GroupList {
        resolve_multiple: bool,
        group_state_entity: bool,
        state_entity_param_name: Option<String>,
        default_state_entity: Option<String>,
        group_ids: Vec<String>,
    },
    /// Device/asset root: entities reachable via a Contains relation.
    #[serde(rename = "deviceSearchQuery", rename_all = "camelCase")]
    RelationQuery {
        resolve_multiple: bool,
        root_state_entity: bool,
        state_entity_param_name: Option<String>,
        default_state_entity: Option<String>,
        root_entity: EntityRef,
        direction: String,
        max_level: u32,
        fetch_last_level_only: bool,
        relation_type: String,
    },
}

impl EntityFilter {
    pub fn for_root(selection: &RootSelection) -> Self {
        match selection.kind {
            EntityKind::Group => EntityFilter::GroupList {
                resolve_multiple: true,
                group_state_entity: false,
                state_entity_param_name: None,
                default_state_entity: None,
                group_ids: vec![selection.entity.id.clone()],
            },
            EntityKind::Device => EntityFilter::RelationQuery {
                resolve_multiple: true,
                root_state_entity: false,
                state_entity_param_name: None,
                default_state_entity: None,
                root_entity: selection.entity.clone(),
                direction: "FROM".to_string(),
                max_level: 2,
                fetch_last_level_only: false,
                relation_type: "Contains".to_string(),
            },
        }
    }
}

/// Bounded page, ascending by creation time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    pub page_size: u32,
    pub page: u32,
    pub sort_order: SortOrder,
}

impl Default for PageLink {
    fn default() -> Self {
        Self {
            page_size: 1024,
            page: 0,
            sort_order: SortOrder {
                key: KeySpec::entity_field("createdTime"),
                direction: "ASC".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SortOrder {
    pub key: KeySpec,
    pub direction: String,
}

#[derive(Debug, Serialize)]
pub struct LatestValueCmd {
    pub keys: Vec<KeySpec>,
}

/// Field grouping a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyScope {
    TimeSeries,
    Attribute,
    EntityField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    #[serde(rename = "type")]
    pub scope: KeyScope,
    pub key: String,
}

impl KeySpec {
    pub fn time_series(key: &str) -> Self {
        Self { scope: KeyScope::TimeSeries, key: key.to_string() }
    }

    pub fn attribute(key: &str) -> Self {
        Self { scope: KeyScope::Attribute, key: key.to_string() }
    }

    pub fn entity_field(key: &str) -> Self {
        Self { scope: KeyScope::EntityField, key: key.to_string() }
    }
}

/// The full field and key set the session subscribes to. `tag` is requested
/// under both groupings because fleets store it inconsistently.
pub fn subscription_keys() -> Vec<KeySpec> {
    let mut keys: Vec<KeySpec> = [
        "totalSavedPower",
        "totalSavedCO2",
        "totalTreeCount",
        "totalSavedCost",
        "totalOriginPowerUsage",
        "totalPowerUsage",
        "deviceSavedPower",
        "savedPower",
        "powerUsage",
        "originPowerUsage",
        "temperature",
        "tag",
    ]
    .iter()
    .map(|k| KeySpec::time_series(k))
    .collect();
    for key in ["name", "tag", "status", "controlMode", "category"] {
        keys.push(KeySpec::attribute(key));
    }
    keys
}

/// One inbound message. Unknown or malformed input parses to the default
/// (empty) frame, which every consumer treats as a no-op.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InboundFrame {
    pub cmd_id: Option<i64>,
    pub data: Option<SnapshotPayload>,
    pub update: Option<Vec<EntityData>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotPayload {
    pub data: Vec<EntityData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityData {
    pub entity_id: Option<EntityRef>,
    pub entity_fields: Option<HashMap<String, ValueWrapper>>,
    pub latest: Option<LatestGroups>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LatestGroups {
    #[serde(rename = "TIME_SERIES")]
    pub time_series: Option<HashMap<String, ValueWrapper>>,
    #[serde(rename = "ATTRIBUTE")]
    pub attribute: Option<HashMap<String, ValueWrapper>>,
    #[serde(rename = "ENTITY_FIELD")]
    pub entity_field: Option<HashMap<String, ValueWrapper>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ValueWrapper {
    pub value: serde_json::Value,
}

impl EntityData {
    /// Flatten every grouping into one update list, in the frame's defined
    /// precedence: entity fields, then time-series, attributes, and entity
    /// fields of group responses. Collisions resolve last-write-wins.
    pub fn field_updates(&self) -> Vec<(String, FieldValue)> {
        let mut updates = Vec::new();
        let mut extend = |group: Option<&HashMap<String, ValueWrapper>>| {
            if let Some(fields) = group {
                updates.extend(
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), FieldValue::from_json(&v.value))),
                );
            }
        };
        extend(self.entity_fields.as_ref());
        if let Some(latest) = &self.latest {
            extend(latest.time_series.as_ref());
            extend(latest.attribute.as_ref());
            extend(latest.entity_field.as_ref());
        }
        updates
    }
}

/// Defensive frame parse: malformed text yields an empty frame, never an
/// error.
pub fn parse_frame(text: &str) -> InboundFrame {
    serde_json::from_str(text).unwrap_or_default()
}

/// Snapshot frames only enumerate membership; live pushes need one follow-up
/// "subscribe to latest values" round-trip on the same cmdId.
pub fn snapshot_followup(frame: &InboundFrame, keys: &[KeySpec]) -> Option<CommandEnvelope> {
    if frame.data.is_none() {
        return None;
    }
    let cmd_id = frame.cmd_id.unwrap_or(SUBSCRIPTION_CMD_ID);
    Some(CommandEnvelope::entity_data(EntityDataCmd::latest_values(
        cmd_id,
        keys.to_vec(),
    )))
}
