// Binding of the reserved `flags` / `words` fields from command-line arguments
#[cfg(test)]
mod test {
    use std::sync::Arc;

    use hydrator::{
        adapters::{InMemoryRequest, ParsedCommand},
        config::models::{DtoConfig, FieldConfig, FieldType, HydratorConfig},
        core::{BindingError, DtoSchema, HydratedValue, Hydrator, SchemaRegistry, TypeDescriptor},
    };
    use serde_json::json;

    fn deploy_hydrator() -> Hydrator {
        let registry = SchemaRegistry::builder()
            .register(
                DtoSchema::builder("Deploy")
                    .command_field("flags", TypeDescriptor::object())
                    .command_field("words", TypeDescriptor::array())
                    .field("token", "header:x-token", TypeDescriptor::string().nullable())
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        Hydrator::new(Arc::new(registry))
    }

    #[test]
    fn test_flags_and_words_are_injected() {
        let command = ParsedCommand::parse(["deploy", "web", "--env=prod", "--no-cache", "-f"]);

        let dto = deploy_hydrator().hydrate_command("Deploy", &command).unwrap();

        assert_eq!(
            dto.get("flags").and_then(HydratedValue::as_json),
            Some(&json!({ "cache": false, "env": "prod", "f": true }))
        );
        assert_eq!(
            dto.get("words").and_then(HydratedValue::as_list),
            Some(&["deploy".to_string(), "web".to_string()][..])
        );
        // HTTP sources are simply absent on the command line
        assert!(dto.get("token").unwrap().is_null());
    }

    #[test]
    fn test_command_fields_need_a_command() {
        let err = deploy_hydrator()
            .hydrate("Deploy", &InMemoryRequest::new())
            .unwrap_err();

        assert!(matches!(err, BindingError::BindingSpec { ref field, .. } if field == "flags"));
    }

    #[test]
    fn test_only_reserved_names_bind_to_the_command() {
        let result = DtoSchema::builder("Bad")
            .command_field("options", TypeDescriptor::object())
            .build();
        assert!(result.is_err());

        let result = DtoSchema::builder("Bad")
            .command_field("words", TypeDescriptor::int())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_command_fields_from_config() {
        let config = HydratorConfig {
            dtos: vec![DtoConfig {
                name: "Cli".to_string(),
                fields: vec![
                    FieldConfig {
                        name: "words".to_string(),
                        source: None,
                        field_type: FieldType::Mixed,
                        nullable: false,
                        element: None,
                        dto: None,
                        format: None,
                    },
                ],
            }],
            ..HydratorConfig::default()
        };
        let hydrator = Hydrator::new(Arc::new(config.build_registry().unwrap()));

        let dto = hydrator
            .hydrate_command("Cli", &ParsedCommand::parse(["a", "--", "-b"]))
            .unwrap();

        assert_eq!(dto.to_json(), json!({ "words": ["a", "-b"] }));
    }
}
