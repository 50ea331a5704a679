use std::str::FromStr;

use searchstore::StoreClient;
use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub app_url: String,
    pub cors_allowed_origin_suffix: Option<String>,
    /// When set, index webhooks must carry this value in `x-webhook-secret`.
    pub webhook_secret: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct StoreSettings {
    pub url: String,
    pub tasks_index: String,
    pub organizations_index: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl StoreSettings {
    pub fn client(&self) -> StoreClient {
        let client = StoreClient::new(&self.url);
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => client.with_basic_auth(username, password),
            _ => client,
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .expect("Failed to parse APP_ENVIRONMENT");
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("SIFT")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
