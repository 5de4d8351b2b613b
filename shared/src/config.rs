use anyhow::Result;
use std::env;

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub bot: BotConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: env::var("DATABASE_HOST")?,
            port: env::var("DATABASE_PORT")?.parse()?,
            username: env::var("DATABASE_USERNAME")?,
            password: env::var("DATABASE_PASSWORD")?,
            database: env::var("DATABASE_NAME")?,
        };
        let redis = RedisConfig {
            host: env::var("REDIS_HOST")?,
            port: env::var("REDIS_PORT")?.parse()?,
        };
        let bot = BotConfig {
            token: env::var("BOT_TOKEN")?,
            admin_token: env::var("ADMIN_BOT_TOKEN")?,
            admin_chat_id: env::var("ADMIN_CHAT_ID")?.parse()?,
            webhook_url: env::var("WEBHOOK_URL").ok(),
        };
        Ok(Self {
            database,
            redis,
            bot,
        })
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub admin_token: String,
    pub admin_chat_id: i64,
    // 未設定の場合はロングポーリングで動かす
    pub webhook_url: Option<String>,
}
