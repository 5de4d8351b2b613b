use async_trait::async_trait;
use kernel::event::{EventBus, Topic};
use redis::{aio::PubSub, AsyncCommands, Client};
use shared::{config::RedisConfig, error::AppResult};

pub struct RedisClient {
    client: Client,
}

impl RedisClient {
    pub fn new(config: &RedisConfig) -> AppResult<Self> {
        let client = Client::open(format!("redis://{}:{}", config.host, config.port))?;
        Ok(Self { client })
    }

    pub async fn publish(&self, channel: &str, payload: &str) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.publish::<_, _, ()>(channel, payload).await?;
        Ok(())
    }

    /// 購読専用の接続を張る。購読側は通常の接続とは別のコネクションが必要
    pub async fn subscribe(&self, channels: &[&str]) -> AppResult<PubSub> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        for channel in channels {
            pubsub.subscribe(channel).await?;
        }
        Ok(pubsub)
    }
}

#[async_trait]
impl EventBus for RedisClient {
    async fn publish(&self, topic: Topic, payload: &str) -> AppResult<()> {
        RedisClient::publish(self, topic.channel(), payload).await
    }
}
