//! Unit tests for config module

use fieldcat::Config;

#[test]
fn default_config_has_expected_values() {
    let config = Config::default();
    assert_eq!(config.analysis.agent, "claude");
    assert_eq!(config.analysis.batch_size, 40);
    assert_eq!(config.analysis.max_retries, 2);
    assert_eq!(config.analysis.timeout, 120);
    assert_eq!(config.analysis.language, "English");
    assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
    assert!(config.chunking.skip_fields.contains(&"_links".to_string()));
    assert!(config.command.program.is_empty());
}

#[test]
fn config_serialization_roundtrip() {
    let mut config = Config::default();
    config.command.program = vec!["ollama".to_string(), "run".to_string()];
    let toml_str = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn output_section_parses_from_toml() {
    let config: Config = toml::from_str("[output]\nformat = \"sse\"\n").unwrap();
    assert_eq!(config.output.format, "sse");
    assert!(config.validate().is_ok());
}

#[test]
fn agent_extra_args_by_name() {
    let config: Config = toml::from_str(
        r#"
[agents.gemini]
extra_args = ["--model", "gemini-2.5-pro"]
"#,
    )
    .unwrap();
    assert_eq!(
        config.agent_extra_args("gemini"),
        ["--model", "gemini-2.5-pro"]
    );
    assert!(config.agent_extra_args("codex").is_empty());
}
