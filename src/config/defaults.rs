use super::*;

impl Default for IamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://iam.viessmann.com/idp/v3".to_string(),
            client_id: String::new(),
            redirect_uri: "http://localhost:4200/".to_string(),
            use_pkce_flow: true,
            username: String::new(),
            password: String::new(),
            strict_redirect: false,
        }
    }
}

impl Default for IotConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.viessmann.com/iot/v2".to_string(),
            installation_id: String::new(),
            gateway_id: String::new(),
        }
    }
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.1.50/api".to_string(),
            voltage: 230.0,
            min_amperage: 6,
            max_amperage: 16,
            candidates: Vec::new(),
        }
    }
}

impl Default for SocBoostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_soc: 90,
            before_hour: 15,
            boost_watts: 2500.0,
            max_power_watts: None,
        }
    }
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_soc: 50,
            // 6 A single phase at 230 V
            floor_watts: 1_380.0,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            strategy: PolicyStrategy::Standard,
            soc_boost: SocBoostConfig::default(),
            hysteresis: HysteresisConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            directory: "logs".to_string(),
            backup_count: 14,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: "Europe/Berlin".to_string(),
            http_timeout_secs: 10,
            token_file: "token.json".to_string(),
            viessmann: ViessmannConfig::default(),
            charger: ChargerConfig::default(),
            policy: PolicyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
