use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::HydratorConfig;

/// Load a schema file using the config crate.
/// Supports multiple formats: YAML, JSON, TOML, INI.
pub async fn load_config(config_path: &str) -> Result<HydratorConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously.
///
/// Scalar settings may be overridden from the environment with the
/// `HYDRATOR__` prefix, e.g. `HYDRATOR__LISTEN_ADDR=0.0.0.0:9000`.
pub fn load_config_sync(config_path: &str) -> Result<HydratorConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml, // Default to YAML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .add_source(Environment::with_prefix("HYDRATOR").separator("__"))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let config: HydratorConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::FieldType;

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
listen_addr: "127.0.0.1:3000"
hydration:
  strict_numbers: true
dtos:
  - name: CreateUser
    fields:
      - name: id
        source: "var:id"
        type: string
      - name: age
        source: "formdata:age"
        type: int
        nullable: true
routes:
  - path: "/users/{id}"
    methods: ["PUT"]
    dto: CreateUser
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert!(config.hydration.strict_numbers);
        assert_eq!(config.dtos.len(), 1);
        assert_eq!(config.dtos[0].fields[1].field_type, FieldType::Int);
        assert!(config.dtos[0].fields[1].nullable);
        assert_eq!(config.routes[0].methods, vec!["PUT"]);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "listen_addr": "127.0.0.1:3000",
  "dtos": [
    {
      "name": "Order",
      "fields": [
        { "name": "lines", "source": "json:lines", "type": "array", "element": "Line" }
      ]
    },
    {
      "name": "Line",
      "fields": [
        { "name": "sku", "source": "json:sku", "type": "string" }
      ]
    }
  ],
  "routes": [ { "path": "/orders", "dto": "Order" } ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.dtos.len(), 2);
        assert_eq!(config.routes[0].methods, vec!["POST"]);
        assert!(config.build_registry().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_config_sync("/nonexistent/hydrator.yaml").is_err());
    }
}
