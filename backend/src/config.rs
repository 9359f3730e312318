use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

const DEVELOPMENT: &str = "development";

#[derive(Clone)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub port: u16,
    pub applicationinsights_connection_string: String,
    pub storage_connection_string: String,
    pub storage_container_name: String,
    pub storage_timeout: Duration,
    pub auth_basic_username: String,
    pub auth_basic_password: String,
    pub model_path: PathBuf,
    pub class_names_path: PathBuf,
    pub predictor_command: String,
    pub predictor_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Process-wide settings, read from the environment on first use.
    pub fn global() -> &'static Settings {
        static SETTINGS: OnceLock<Settings> = OnceLock::new();
        SETTINGS.get_or_init(Settings::from_env)
    }

    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        Self {
            app_name: string("APP_NAME", defaults.app_name),
            environment: string("APP_ENV", defaults.environment),
            port: parse_or(lookup("PORT"), defaults.port),
            applicationinsights_connection_string: string(
                "APPLICATIONINSIGHTS_CONNECTION_STRING",
                defaults.applicationinsights_connection_string,
            ),
            storage_connection_string: string(
                "STORAGE_CONNECTION_STRING",
                defaults.storage_connection_string,
            ),
            storage_container_name: string("STORAGE_CONTAINER_NAME", defaults.storage_container_name),
            storage_timeout: lookup("STORAGE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.storage_timeout),
            auth_basic_username: string("AUTH_BASIC_USERNAME", defaults.auth_basic_username),
            auth_basic_password: string("AUTH_BASIC_PASSWORD", defaults.auth_basic_password),
            model_path: lookup("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            class_names_path: lookup("CLASS_NAMES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.class_names_path),
            predictor_command: string("PREDICTOR_COMMAND", defaults.predictor_command),
            predictor_timeout: lookup("PREDICTOR_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.predictor_timeout),
            allowed_origins: defaults.allowed_origins,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case(DEVELOPMENT)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "Padi Scanner Analysis API".to_string(),
            environment: DEVELOPMENT.to_string(),
            port: 8081,
            applicationinsights_connection_string: "InstrumentationKey=".to_string(),
            storage_connection_string: String::new(),
            storage_container_name: "padi".to_string(),
            storage_timeout: Duration::from_secs(30),
            auth_basic_username: "fahmi".to_string(),
            auth_basic_password: "fahmi".to_string(),
            model_path: PathBuf::from("model.pt"),
            class_names_path: PathBuf::from("class_names.txt"),
            predictor_command: "padi-predictor".to_string(),
            predictor_timeout: Duration::from_secs(120),
            allowed_origins: vec![
                "https://padi-scanner.kodesiana.com".to_string(),
                "https://kodesiana.com".to_string(),
            ],
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn global_returns_the_same_instance() {
        let first = Settings::global() as *const Settings;
        let second = Settings::global() as *const Settings;
        assert_eq!(first, second);
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.app_name, "Padi Scanner Analysis API");
        assert_eq!(settings.storage_container_name, "padi");
        assert_eq!(settings.port, 8081);
        assert!(settings.is_development());
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("APP_ENV", "production"),
            ("STORAGE_CONTAINER_NAME", "scans"),
            ("AUTH_BASIC_USERNAME", "operator"),
            ("PORT", "9000"),
            ("PREDICTOR_TIMEOUT_SECS", "5"),
        ]);
        let settings = Settings::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert!(!settings.is_development());
        assert_eq!(settings.storage_container_name, "scans");
        assert_eq!(settings.auth_basic_username, "operator");
        assert_eq!(settings.auth_basic_password, "fahmi");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.predictor_timeout, Duration::from_secs(5));
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        let settings = Settings::from_lookup(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert_eq!(settings.port, 8081);
    }
}
