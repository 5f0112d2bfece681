use figment::Jail;

use searchdeck_core::config::{Provider, Settings};
use searchdeck_core::error::ConnectionError;
use searchdeck_core::types::{FusionMode, MetadataFlag, SearchType};

#[test]
fn settings_from_env_build_a_connection_config() {
    Jail::expect_with(|jail| {
        jail.set_env("SEARCHDECK_STORE_HOST", "db.internal.example");
        jail.set_env("SEARCHDECK_STORE_API_KEY", "adminkey");
        let settings = Settings::load().map_err(|e| figment::Error::from(e.to_string()))?;
        let config = settings
            .connection_config()
            .map_err(|e| figment::Error::from(e.to_string()))?;
        assert_eq!(config.host, "db.internal.example");
        assert_eq!(config.port, 8080, "port defaults when unset");
        assert_eq!(config.api_key, "adminkey");
        assert!(config.provider.is_none(), "no provider key, keyword-only session");
        Ok(())
    });
}

#[test]
fn missing_host_is_misconfigured_before_any_network_attempt() {
    Jail::expect_with(|jail| {
        jail.set_env("SEARCHDECK_STORE_API_KEY", "adminkey");
        let settings = Settings::load().map_err(|e| figment::Error::from(e.to_string()))?;
        match settings.connection_config() {
            Err(ConnectionError::Misconfigured(_)) => Ok(()),
            other => Err(figment::Error::from(format!("expected Misconfigured, got {:?}", other))),
        }
    });
}

#[test]
fn deployment_profile_unlocks_only_with_the_master_password() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "searchdeck.toml",
            r#"
                master_password = "sesame"

                [deployment]
                name = "staging"
                host = "staging.example.com"
                api_key = "profile-key"
                grpc_port = 50052
            "#,
        )?;
        let settings = Settings::load().map_err(|e| figment::Error::from(e.to_string()))?;

        assert!(settings.deployment_config("wrong").is_none());
        let config = settings
            .deployment_config("sesame")
            .ok_or_else(|| figment::Error::from("profile should unlock".to_string()))?;
        assert_eq!(config.host, "staging.example.com");
        assert_eq!(config.api_key, "profile-key");
        assert_eq!(config.grpc_port, Some(50052));
        Ok(())
    });
}

#[test]
fn provider_credential_follows_the_provider_label() {
    Jail::expect_with(|jail| {
        jail.set_env("SEARCHDECK_STORE_HOST", "localhost");
        jail.set_env("SEARCHDECK_STORE_API_KEY", "adminkey");
        jail.set_env("SEARCHDECK_PROVIDER", "Gemini");
        jail.set_env("SEARCHDECK_PROVIDER_API_KEY", "llm-key");
        let settings = Settings::load().map_err(|e| figment::Error::from(e.to_string()))?;
        let config = settings
            .connection_config()
            .map_err(|e| figment::Error::from(e.to_string()))?;
        let credential = config
            .provider
            .ok_or_else(|| figment::Error::from("credential expected".to_string()))?;
        assert_eq!(credential.provider, Provider::Google);
        assert_eq!(credential.provider.header_name(), "X-Google-Studio-Api-Key");
        Ok(())
    });
}

#[test]
fn provider_parse_defaults_to_openai() {
    assert_eq!(Provider::parse("OpenAI"), Provider::OpenAi);
    assert_eq!(Provider::parse("something-new"), Provider::OpenAi);
    assert_eq!(Provider::parse("google"), Provider::Google);
    assert_eq!(Provider::parse("OpenAI").header_name(), "X-OpenAI-Api-Key");
}

#[test]
fn unknown_search_type_falls_back_to_keyword() {
    assert_eq!(SearchType::parse("hybrid"), SearchType::Hybrid);
    assert_eq!(SearchType::parse("NearText"), SearchType::Semantic);
    assert_eq!(SearchType::parse("definitely-not-a-mode"), SearchType::Keyword);
}

#[test]
fn metadata_flags_parse_by_fixed_list() {
    assert_eq!(MetadataFlag::parse("score"), Some(MetadataFlag::Score));
    assert_eq!(MetadataFlag::parse("Explain_Score"), Some(MetadataFlag::ExplainScore));
    assert_eq!(MetadataFlag::parse("vector"), None);
}

#[test]
fn fusion_parse_defaults_to_ranked() {
    assert_eq!(FusionMode::parse("relative"), FusionMode::Relative);
    assert_eq!(FusionMode::parse("ranked"), FusionMode::Ranked);
    assert_eq!(FusionMode::parse("anything"), FusionMode::Ranked);
}
