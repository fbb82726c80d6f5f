use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Map a settings key such as `provider.api_key` to the env var that sets it
pub fn to_env_var(field_path: &str) -> String {
    format!("DOCVAL_{}", field_path.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("provider.api_key"), "DOCVAL_PROVIDER__API_KEY");
        assert_eq!(to_env_var("server.port"), "DOCVAL_SERVER__PORT");
        assert_eq!(to_env_var("api_key"), "DOCVAL_API_KEY");
    }

    #[test]
    fn test_missing_env_var_message() {
        let err = ConfigError::MissingEnvVar {
            env_var: "DOCVAL_PROVIDER__API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: DOCVAL_PROVIDER__API_KEY"
        );
    }
}
