use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::redis::RedisClient;
use adapter::repository::appointment::AppointmentRepositoryImpl;
use adapter::repository::draft::{
    AppointmentDraftRepositoryImpl, ReminderDraftRepositoryImpl, SummaryDraftRepositoryImpl,
};
use adapter::repository::reminder::ReminderRepositoryImpl;
use adapter::repository::user::UserRepositoryImpl;
use adapter::repository::washer::WasherRepositoryImpl;
use adapter::telegram::TelegramApi;
use kernel::event::EventBus;
use kernel::repository::appointment::AppointmentRepository;
use kernel::repository::draft::{
    AppointmentDraftRepository, ReminderDraftRepository, SummaryDraftRepository,
};
use kernel::repository::reminder::ReminderRepository;
use kernel::repository::user::UserRepository;
use kernel::repository::washer::WasherRepository;
use kernel::transport::Messenger;
use shared::config::BotConfig;

#[derive(Clone)]
pub struct AppRegistry {
    user_repository: Arc<dyn UserRepository>,
    washer_repository: Arc<dyn WasherRepository>,
    appointment_repository: Arc<dyn AppointmentRepository>,
    appointment_draft_repository: Arc<dyn AppointmentDraftRepository>,
    reminder_draft_repository: Arc<dyn ReminderDraftRepository>,
    summary_draft_repository: Arc<dyn SummaryDraftRepository>,
    reminder_repository: Arc<dyn ReminderRepository>,
    event_bus: Arc<dyn EventBus>,
    messenger: Arc<dyn Messenger>,
    bot_config: BotConfig,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, kv: Arc<RedisClient>, bot_config: BotConfig) -> Self {
        let event_bus: Arc<dyn EventBus> = kv;
        let messenger: Arc<dyn Messenger> = Arc::new(TelegramApi::new(bot_config.token.clone()));
        Self {
            user_repository: Arc::new(UserRepositoryImpl::new(pool.clone())),
            washer_repository: Arc::new(WasherRepositoryImpl::new(pool.clone())),
            appointment_repository: Arc::new(AppointmentRepositoryImpl::new(pool.clone())),
            appointment_draft_repository: Arc::new(AppointmentDraftRepositoryImpl::new(
                pool.clone(),
            )),
            reminder_draft_repository: Arc::new(ReminderDraftRepositoryImpl::new(pool.clone())),
            summary_draft_repository: Arc::new(SummaryDraftRepositoryImpl::new(pool.clone())),
            reminder_repository: Arc::new(ReminderRepositoryImpl::new(pool)),
            event_bus,
            messenger,
            bot_config,
        }
    }

    // テストでフェイク実装を差し込むためのコンストラクタ
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        user_repository: Arc<dyn UserRepository>,
        washer_repository: Arc<dyn WasherRepository>,
        appointment_repository: Arc<dyn AppointmentRepository>,
        appointment_draft_repository: Arc<dyn AppointmentDraftRepository>,
        reminder_draft_repository: Arc<dyn ReminderDraftRepository>,
        summary_draft_repository: Arc<dyn SummaryDraftRepository>,
        reminder_repository: Arc<dyn ReminderRepository>,
        event_bus: Arc<dyn EventBus>,
        messenger: Arc<dyn Messenger>,
        bot_config: BotConfig,
    ) -> Self {
        Self {
            user_repository,
            washer_repository,
            appointment_repository,
            appointment_draft_repository,
            reminder_draft_repository,
            summary_draft_repository,
            reminder_repository,
            event_bus,
            messenger,
            bot_config,
        }
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn washer_repository(&self) -> Arc<dyn WasherRepository> {
        self.washer_repository.clone()
    }

    pub fn appointment_repository(&self) -> Arc<dyn AppointmentRepository> {
        self.appointment_repository.clone()
    }

    pub fn appointment_draft_repository(&self) -> Arc<dyn AppointmentDraftRepository> {
        self.appointment_draft_repository.clone()
    }

    pub fn reminder_draft_repository(&self) -> Arc<dyn ReminderDraftRepository> {
        self.reminder_draft_repository.clone()
    }

    pub fn summary_draft_repository(&self) -> Arc<dyn SummaryDraftRepository> {
        self.summary_draft_repository.clone()
    }

    pub fn reminder_repository(&self) -> Arc<dyn ReminderRepository> {
        self.reminder_repository.clone()
    }

    pub fn event_bus(&self) -> Arc<dyn EventBus> {
        self.event_bus.clone()
    }

    pub fn messenger(&self) -> Arc<dyn Messenger> {
        self.messenger.clone()
    }

    pub fn bot_config(&self) -> &BotConfig {
        &self.bot_config
    }
}
