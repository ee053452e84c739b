use envconfig::Envconfig;

use crate::services::ListSettings;

#[derive(Envconfig, Debug)]
pub struct Config {
    #[envconfig(from = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: String,

    #[envconfig(from = "DATABASE_URL", default = "sqlite://medstock.db")]
    pub database_url: String,

    #[envconfig(from = "PAGE_SIZE", default = "20")]
    pub page_size: u32,
}

impl Config {
    pub fn list_settings(&self) -> ListSettings {
        ListSettings::new(self.page_size)
    }
}

/// Configuration for the seed binary, which never talks to Telegram.
#[derive(Envconfig, Debug)]
pub struct SeedConfig {
    #[envconfig(from = "DATABASE_URL", default = "sqlite://medstock.db")]
    pub database_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let env = HashMap::from([("TELEGRAM_BOT_TOKEN".to_string(), "token".to_string())]);
        let config = Config::init_from_hashmap(&env).unwrap();

        assert_eq!(config.database_url, "sqlite://medstock.db");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.list_settings().page_size, 20);
    }

    #[test]
    fn page_size_is_read_and_clamped() {
        let env = HashMap::from([
            ("TELEGRAM_BOT_TOKEN".to_string(), "token".to_string()),
            ("PAGE_SIZE".to_string(), "500".to_string()),
        ]);
        let config = Config::init_from_hashmap(&env).unwrap();
        assert_eq!(config.page_size, 500);
        assert_eq!(config.list_settings().page_size, 100);
    }

    #[test]
    fn bot_token_is_required() {
        assert!(Config::init_from_hashmap(&HashMap::new()).is_err());
        assert!(SeedConfig::init_from_hashmap(&HashMap::new()).is_ok());
    }
}
