// Entity resolver - picks the root entity from the configured data sources
use crate::domain::entity::{DatasourceConfig, RootSelection};
use thiserror::Error;

/// Reserved alias naming the authoritative root data source.
pub const ROOT_ALIAS: &str = "root-way";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no resolvable root entity in configured data sources")]
    NoRootEntity,
}

/// Resolve the root entity. First match wins:
/// 1. a data source whose alias or name equals the `root-way` sentinel,
/// 2. the source at index 1 when at least two exist (index 0 is conventionally
///    a UI-only placeholder),
/// 3. the source at index 0.
/// A chosen source without an attached entity is a configuration failure, not
/// a reason to fall through to the next candidate.
pub fn resolve_root(datasources: &[DatasourceConfig]) -> Result<RootSelection, ResolveError> {
    let candidate = datasources
        .iter()
        .find(|ds| {
            ds.alias.as_deref() == Some(ROOT_ALIAS) || ds.name.as_deref() == Some(ROOT_ALIAS)
        })
        .or_else(|| {
            if datasources.len() > 1 {
                datasources.get(1)
            } else {
                datasources.first()
            }
        })
        .ok_or(ResolveError::NoRootEntity)?;

    let entity = candidate.entity.clone().ok_or(ResolveError::NoRootEntity)?;
    let display_name = candidate
        .name
        .clone()
        .or_else(|| candidate.alias.clone())
        .unwrap_or_else(|| entity.id.clone());

    let selection = RootSelection {
        kind: entity.kind(),
        entity,
        display_name,
    };
    tracing::debug!(
        root = %selection.display_name,
        entity_type = %selection.entity.entity_type,
        id = %selection.entity.id,
        "root entity resolved"
    );
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityKind, EntityRef};

    fn source(alias: Option<&str>, name: Option<&str>, id: Option<&str>) -> DatasourceConfig {
        DatasourceConfig {
            alias: alias.map(String::from),
            name: name.map(String::from),
            entity: id.map(|id| EntityRef::new("ASSET", id)),
        }
    }

    #[test]
    fn test_alias_wins_over_position() {
        let sources = vec![
            source(None, None, Some("placeholder")),
            source(None, None, Some("positional")),
            source(Some(ROOT_ALIAS), None, Some("aliased")),
        ];
        let selection = resolve_root(&sources).unwrap();
        assert_eq!(selection.entity.id, "aliased");
    }

    #[test]
    fn test_name_matches_sentinel() {
        let sources = vec![
            source(None, None, Some("placeholder")),
            source(None, Some(ROOT_ALIAS), Some("named")),
        ];
        assert_eq!(resolve_root(&sources).unwrap().entity.id, "named");
    }

    #[test]
    fn test_index_one_when_two_or_more() {
        let sources = vec![
            source(None, None, Some("placeholder")),
            source(None, None, Some("second")),
        ];
        assert_eq!(resolve_root(&sources).unwrap().entity.id, "second");
    }

    #[test]
    fn test_index_zero_as_last_resort() {
        let sources = vec![source(None, Some("only"), Some("only-entity"))];
        let selection = resolve_root(&sources).unwrap();
        assert_eq!(selection.entity.id, "only-entity");
        assert_eq!(selection.display_name, "only");
    }

    #[test]
    fn test_empty_list_fails() {
        assert_eq!(resolve_root(&[]), Err(ResolveError::NoRootEntity));
    }

    #[test]
    fn test_candidate_without_entity_fails() {
        let sources = vec![
            source(None, None, Some("placeholder")),
            source(None, None, None),
        ];
        assert_eq!(resolve_root(&sources), Err(ResolveError::NoRootEntity));
    }

    #[test]
    fn test_group_kind_recorded() {
        let sources = vec![DatasourceConfig {
            alias: Some(ROOT_ALIAS.to_string()),
            name: None,
            entity: Some(EntityRef::new("ENTITY_GROUP", "g1")),
        }];
        assert_eq!(resolve_root(&sources).unwrap().kind, EntityKind::Group);
    }

    #[test]
    fn test_deterministic() {
        let sources = vec![
            source(None, None, Some("a")),
            source(None, None, Some("b")),
            source(Some(ROOT_ALIAS), None, Some("c")),
        ];
        let first = resolve_root(&sources).unwrap();
        let second = resolve_root(&sources).unwrap();
        assert_eq!(first, second);
    }
}
