use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub root_domain: String,
    pub create_agent_secret: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub pinata_jwt: String,
    pub pinata_gateway_url: String,
    pub twitter_api_key: String,
    pub twitter_api_secret: String,
    pub static_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_path: env::var("DB_PATH")
                .unwrap_or_else(|_| "./static/database/mement.sqlite".to_string()),
            root_domain: env::var("ROOT_DOMAIN").expect("ROOT_DOMAIN must be set"),
            create_agent_secret: env::var("CREATE_AGENT_SECRET")
                .expect("CREATE_AGENT_SECRET must be set"),
            openai_api_key: env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            pinata_jwt: env::var("PINATA_JWT").expect("PINATA_JWT must be set"),
            pinata_gateway_url: env::var("PINATA_GATEWAY_URL")
                .expect("PINATA_GATEWAY_URL must be set"),
            twitter_api_key: env::var("TWITTER_API_KEY").expect("TWITTER_API_KEY must be set"),
            twitter_api_secret: env::var("TWITTER_API_SECRET")
                .expect("TWITTER_API_SECRET must be set"),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "./static".to_string()),
        }
    }
}
