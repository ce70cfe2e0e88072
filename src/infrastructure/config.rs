// Platform connection settings and widget datasource bindings
use crate::domain::entity::DatasourceConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    pub platform: PlatformSettings,
    #[serde(default)]
    pub datasources: Vec<DatasourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformSettings {
    pub http_base_url: String,
    pub ws_base_url: String,
    pub jwt_token: String,
}

pub fn load_platform_config() -> anyhow::Result<PlatformConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/platform"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_parse_platform_config() {
        let toml = r#"
            [platform]
            http_base_url = "https://things.example"
            ws_base_url = "wss://things.example"
            jwt_token = "secret"

            [[datasources]]
            alias = "root-way"
            name = "본관"

            [datasources.entity]
            entityType = "ASSET"
            id = "abc-123"
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        let cfg: PlatformConfig = settings.try_deserialize().unwrap();

        assert_eq!(cfg.platform.ws_base_url, "wss://things.example");
        assert_eq!(cfg.datasources.len(), 1);
        assert_eq!(cfg.datasources[0].alias.as_deref(), Some("root-way"));
        assert_eq!(cfg.datasources[0].entity.as_ref().unwrap().id, "abc-123");
    }

    #[test]
    fn test_datasources_default_to_empty() {
        let toml = r#"
            [platform]
            http_base_url = "https://things.example"
            ws_base_url = "wss://things.example"
            jwt_token = "secret"
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        let cfg: PlatformConfig = settings.try_deserialize().unwrap();
        assert!(cfg.datasources.is_empty());
    }
}
