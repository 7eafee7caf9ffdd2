use secrecy::SecretString;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub store_base_url: String,
    pub store_api_token: SecretString,
    pub assessments_resource: String,
    pub sessions_resource: String,
    pub lessons_base_url: String,
    pub purchases_base_url: String,
    pub legacy_store_path: String,
    pub web_server_host: String,
    pub web_server_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            store_base_url: env::var("STORE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9090".to_string()),
            store_api_token: SecretString::from(
                env::var("STORE_API_TOKEN").unwrap_or_else(|_| "dev_store_token".to_string()),
            ),
            assessments_resource: env::var("ASSESSMENTS_RESOURCE")
                .unwrap_or_else(|_| "assessments/state".to_string()),
            sessions_resource: env::var("SESSIONS_RESOURCE")
                .unwrap_or_else(|_| "assessments/sessions".to_string()),
            lessons_base_url: env::var("LESSONS_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9091".to_string()),
            purchases_base_url: env::var("PURCHASES_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:9092".to_string()),
            legacy_store_path: env::var("LEGACY_STORE_PATH")
                .unwrap_or_else(|_| "./legacy_store.json".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let token = self.store_api_token.expose_secret();

        if token == "dev_store_token" {
            panic!(
                "FATAL: STORE_API_TOKEN is using default value! Set STORE_API_TOKEN environment variable."
            );
        }

        if self.store_base_url.starts_with("http://localhost") {
            panic!(
                "FATAL: STORE_BASE_URL points at localhost! Set STORE_BASE_URL environment variable."
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            store_base_url: "http://localhost:9090".to_string(),
            store_api_token: SecretString::from("test_store_token".to_string()),
            assessments_resource: "assessments/state".to_string(),
            sessions_resource: "assessments/sessions".to_string(),
            lessons_base_url: "http://localhost:9091".to_string(),
            purchases_base_url: "http://localhost:9092".to_string(),
            legacy_store_path: "./legacy_store_test.json".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.store_base_url.is_empty());
        assert!(!config.assessments_resource.is_empty());
        assert!(!config.sessions_resource.is_empty());
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.assessments_resource, "assessments/state");
        assert_eq!(config.sessions_resource, "assessments/sessions");
        assert_eq!(config.web_server_port, 8080);
    }
}
