//! インメモリのフェイク実装。DB やネットワーク無しで
//! フォームと突き合わせパスの挙動を通しで確認するための土台。

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use kernel::event::{EventBus, Topic};
use kernel::model::appointment::{
    event::CreateAppointment, Appointment, DayScheduleEntry,
};
use kernel::model::draft::{
    event::{CreateAppointmentDraft, CreateReminderDraft, CreateSummaryDraft},
    AppointmentDraft, ReminderDraft, SummaryDraft,
};
use kernel::model::id::{AppointmentId, DraftId, ReminderId, UserId, WasherId};
use kernel::model::reminder::{event::CreateReminder, Reminder};
use kernel::model::role::Role;
use kernel::model::user::{event::BindChat, User};
use kernel::model::washer::Washer;
use kernel::repository::appointment::AppointmentRepository;
use kernel::repository::draft::{
    AppointmentDraftRepository, ReminderDraftRepository, SummaryDraftRepository,
};
use kernel::repository::reminder::ReminderRepository;
use kernel::repository::user::UserRepository;
use kernel::repository::washer::WasherRepository;
use kernel::transport::{Messenger, SendOptions};
use registry::AppRegistry;
use shared::config::BotConfig;
use shared::error::{AppError, AppResult};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeStore {
    pub users: Mutex<Vec<User>>,
    pub washers: Mutex<Vec<Washer>>,
    pub appointments: Mutex<Vec<Appointment>>,
    pub appointment_drafts: Mutex<Vec<AppointmentDraft>>,
    pub reminder_drafts: Mutex<Vec<ReminderDraft>>,
    pub summary_drafts: Mutex<Vec<SummaryDraft>>,
    pub reminders: Mutex<Vec<Reminder>>,
}

impl FakeStore {
    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn add_washer(&self, washer: Washer) {
        self.washers.lock().unwrap().push(washer);
    }

    pub fn add_appointment_draft(&self, draft: AppointmentDraft) {
        self.appointment_drafts.lock().unwrap().push(draft);
    }

    pub fn add_summary_draft(&self, draft: SummaryDraft) {
        self.summary_drafts.lock().unwrap().push(draft);
    }

    pub fn add_appointment(&self, appointment: Appointment) {
        self.appointments.lock().unwrap().push(appointment);
    }

    pub fn add_reminder(&self, reminder: Reminder) {
        self.reminders.lock().unwrap().push(reminder);
    }

    pub fn appointment_draft(&self, draft_id: DraftId) -> Option<AppointmentDraft> {
        self.appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.draft_id == draft_id)
            .cloned()
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
            .ok_or_else(|| AppError::EntityNotFound("user not found".into()))
    }

    async fn find_by_chat_id(&self, chat_id: i64) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.chat_id == Some(chat_id))
            .cloned())
    }

    async fn find_by_identity(
        &self,
        first_name: &str,
        last_name: &str,
        order_number: &str,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| {
                u.first_name == first_name
                    && u.last_name == last_name
                    && u.order_number == order_number
            })
            .cloned())
    }

    async fn bind_chat(&self, event: BindChat) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.user_id == event.user_id)
            .ok_or_else(|| AppError::EntityNotFound("user not found".into()))?;
        user.username = event.username;
        user.chat_id = Some(event.chat_id);
        Ok(())
    }

    async fn find_by_role(&self, role: Role) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WasherRepository for FakeStore {
    async fn find_all(&self) -> AppResult<Vec<Washer>> {
        let mut washers = self.washers.lock().unwrap().clone();
        washers.sort_by(|a, b| a.washer_name.cmp(&b.washer_name));
        Ok(washers)
    }

    async fn find_by_id(&self, washer_id: WasherId) -> AppResult<Option<Washer>> {
        Ok(self
            .washers
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.washer_id == washer_id)
            .cloned())
    }
}

#[async_trait]
impl AppointmentRepository for FakeStore {
    async fn create(&self, event: CreateAppointment) -> AppResult<AppointmentId> {
        let mut appointments = self.appointments.lock().unwrap();
        let duplicate = appointments.iter().any(|a| {
            a.book_date == event.book_date
                && a.book_time == event.book_time
                && a.washer_id == event.washer_id
        });
        if duplicate {
            return Err(AppError::UnprocessableEntity("slot already booked".into()));
        }
        let appointment_id = AppointmentId::new();
        appointments.push(Appointment {
            appointment_id,
            book_date: event.book_date,
            book_time: event.book_time,
            draft_id: Some(event.draft_id),
            user_id: event.user_id,
            washer_id: event.washer_id,
        });
        Ok(appointment_id)
    }

    async fn delete(&self, appointment_id: AppointmentId) -> AppResult<()> {
        let mut appointments = self.appointments.lock().unwrap();
        let before = appointments.len();
        appointments.retain(|a| a.appointment_id != appointment_id);
        if appointments.len() == before {
            return Err(AppError::EntityNotFound("appointment not found".into()));
        }
        Ok(())
    }

    async fn find_matching(
        &self,
        book_date: NaiveDate,
        times: &[NaiveTime],
    ) -> AppResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.book_date == book_date && times.contains(&a.book_time))
            .cloned()
            .collect())
    }

    async fn find_one_at(
        &self,
        book_date: NaiveDate,
        book_time: NaiveTime,
        washer_id: WasherId,
    ) -> AppResult<Option<Appointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| {
                a.book_date == book_date && a.book_time == book_time && a.washer_id == washer_id
            })
            .cloned())
    }

    async fn find_by_draft(&self, draft_id: DraftId) -> AppResult<Vec<Appointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.draft_id == Some(draft_id))
            .cloned()
            .collect())
    }

    async fn count_planned(&self, user_id: UserId, now: NaiveDateTime) -> AppResult<i64> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id && a.start_at() >= now)
            .count() as i64)
    }

    async fn count_at(&self, start: NaiveDateTime) -> AppResult<i64> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.start_at() == start)
            .count() as i64)
    }

    async fn count_on(&self, book_date: NaiveDate) -> AppResult<i64> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.book_date == book_date)
            .count() as i64)
    }

    async fn find_day_schedule(&self, book_date: NaiveDate) -> AppResult<Vec<DayScheduleEntry>> {
        let users = self.users.lock().unwrap().clone();
        let washers = self.washers.lock().unwrap().clone();
        let mut entries: Vec<DayScheduleEntry> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.book_date == book_date)
            .filter_map(|a| {
                let user = users.iter().find(|u| u.user_id == a.user_id)?;
                let washer = washers.iter().find(|w| w.washer_id == a.washer_id)?;
                Some(DayScheduleEntry {
                    book_time: a.book_time,
                    username: user.username.clone(),
                    first_name: user.first_name.clone(),
                    washer_name: washer.washer_name.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            a.book_time
                .cmp(&b.book_time)
                .then(a.washer_name.cmp(&b.washer_name))
        });
        Ok(entries)
    }
}

#[async_trait]
impl AppointmentDraftRepository for FakeStore {
    async fn create(&self, event: CreateAppointmentDraft) -> AppResult<AppointmentDraft> {
        let draft = AppointmentDraft {
            draft_id: DraftId::new(),
            state: 0,
            book_date: None,
            book_time: None,
            reserved: false,
            user_id: event.user_id,
            message_id: None,
        };
        self.appointment_drafts
            .lock()
            .unwrap()
            .push(draft.clone());
        Ok(draft)
    }

    async fn find_by_id(&self, draft_id: DraftId) -> AppResult<AppointmentDraft> {
        self.appointment_draft(draft_id)
            .ok_or_else(|| AppError::EntityNotFound("draft not found".into()))
    }

    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<AppointmentDraft>> {
        Ok(self
            .appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.user_id == user_id && d.message_id == Some(message_id))
            .cloned())
    }

    async fn find_planned_by_user(
        &self,
        user_id: UserId,
        now: NaiveDateTime,
    ) -> AppResult<Vec<AppointmentDraft>> {
        let appointments = self.appointments.lock().unwrap().clone();
        let mut drafts: Vec<AppointmentDraft> = self
            .appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.user_id == user_id
                    && d.start_at().map(|s| s >= now).unwrap_or(false)
                    && appointments.iter().any(|a| a.draft_id == Some(d.draft_id))
            })
            .cloned()
            .collect();
        drafts.sort_by_key(|d| d.start_at());
        Ok(drafts)
    }

    async fn find_live(&self, now: NaiveDateTime) -> AppResult<Vec<AppointmentDraft>> {
        let appointments = self.appointments.lock().unwrap().clone();
        Ok(self
            .appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.message_id.is_some()
                    && d.start_at().map(|s| s >= now).unwrap_or(false)
                    && appointments.iter().any(|a| a.draft_id == Some(d.draft_id))
            })
            .cloned()
            .collect())
    }

    async fn find_superseded(
        &self,
        draft: &AppointmentDraft,
    ) -> AppResult<Vec<AppointmentDraft>> {
        Ok(self
            .appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.draft_id != draft.draft_id
                    && d.user_id == draft.user_id
                    && d.book_date == draft.book_date
                    && d.book_time == draft.book_time
            })
            .cloned()
            .collect())
    }

    async fn find_affected_by_commit(
        &self,
        draft: &AppointmentDraft,
    ) -> AppResult<Vec<AppointmentDraft>> {
        Ok(self
            .appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.draft_id != draft.draft_id
                    && ((d.book_date == draft.book_date
                        && d.book_time == draft.book_time
                        && d.state == 2)
                        || (d.book_date == draft.book_date && d.state == 1)
                        || d.state == 0)
            })
            .cloned()
            .collect())
    }

    async fn find_committed_on(&self, book_date: NaiveDate) -> AppResult<Vec<AppointmentDraft>> {
        let appointments = self.appointments.lock().unwrap().clone();
        let mut drafts: Vec<AppointmentDraft> = self
            .appointment_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.book_date == Some(book_date)
                    && appointments.iter().any(|a| a.draft_id == Some(d.draft_id))
            })
            .cloned()
            .collect();
        drafts.sort_by_key(|d| d.book_time);
        Ok(drafts)
    }

    async fn set_book_date(&self, draft_id: DraftId, book_date: NaiveDate) -> AppResult<()> {
        self.update_appointment_draft(draft_id, |d| d.book_date = Some(book_date))
    }

    async fn set_book_time(&self, draft_id: DraftId, book_time: NaiveTime) -> AppResult<()> {
        self.update_appointment_draft(draft_id, |d| d.book_time = Some(book_time))
    }

    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()> {
        self.update_appointment_draft(draft_id, |d| d.state = state)
    }

    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()> {
        self.update_appointment_draft(draft_id, |d| d.message_id = Some(message_id))
    }

    async fn set_reserved(&self, draft_id: DraftId) -> AppResult<()> {
        self.update_appointment_draft(draft_id, |d| d.reserved = true)
    }

    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()> {
        let mut appointments = self.appointments.lock().unwrap();
        for appointment in appointments.iter_mut() {
            if let Some(draft_id) = appointment.draft_id {
                if superseded.contains(&draft_id) {
                    appointment.draft_id = Some(target);
                }
            }
        }
        self.appointment_drafts
            .lock()
            .unwrap()
            .retain(|d| !superseded.contains(&d.draft_id));
        Ok(())
    }
}

impl FakeStore {
    fn update_appointment_draft(
        &self,
        draft_id: DraftId,
        apply: impl FnOnce(&mut AppointmentDraft),
    ) -> AppResult<()> {
        let mut drafts = self.appointment_drafts.lock().unwrap();
        let draft = drafts
            .iter_mut()
            .find(|d| d.draft_id == draft_id)
            .ok_or_else(|| AppError::EntityNotFound("draft not found".into()))?;
        apply(draft);
        Ok(())
    }
}

#[async_trait]
impl ReminderDraftRepository for FakeStore {
    async fn create(&self, event: CreateReminderDraft) -> AppResult<ReminderDraft> {
        let draft = ReminderDraft {
            draft_id: DraftId::new(),
            state: 0,
            user_id: event.user_id,
            message_id: None,
        };
        self.reminder_drafts.lock().unwrap().push(draft.clone());
        Ok(draft)
    }

    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<ReminderDraft>> {
        Ok(self
            .reminder_drafts
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.user_id == user_id && d.message_id == Some(message_id))
            .cloned())
    }

    async fn find_superseded(&self, draft: &ReminderDraft) -> AppResult<Vec<ReminderDraft>> {
        Ok(self
            .reminder_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.draft_id != draft.draft_id && d.user_id == draft.user_id)
            .cloned()
            .collect())
    }

    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()> {
        let mut drafts = self.reminder_drafts.lock().unwrap();
        if let Some(d) = drafts.iter_mut().find(|d| d.draft_id == draft_id) {
            d.state = state;
        }
        Ok(())
    }

    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()> {
        let mut drafts = self.reminder_drafts.lock().unwrap();
        if let Some(d) = drafts.iter_mut().find(|d| d.draft_id == draft_id) {
            d.message_id = Some(message_id);
        }
        Ok(())
    }

    async fn reallocate(&self, target: DraftId, superseded: &[DraftId]) -> AppResult<()> {
        let mut reminders = self.reminders.lock().unwrap();
        for reminder in reminders.iter_mut() {
            if let Some(draft_id) = reminder.draft_id {
                if superseded.contains(&draft_id) {
                    reminder.draft_id = Some(target);
                }
            }
        }
        self.reminder_drafts
            .lock()
            .unwrap()
            .retain(|d| !superseded.contains(&d.draft_id));
        Ok(())
    }
}

#[async_trait]
impl SummaryDraftRepository for FakeStore {
    async fn create(&self, event: CreateSummaryDraft) -> AppResult<SummaryDraft> {
        let draft = SummaryDraft {
            draft_id: DraftId::new(),
            state: event.state,
            summary_date: event.summary_date,
            user_id: event.user_id,
            message_id: None,
        };
        self.summary_drafts.lock().unwrap().push(draft.clone());
        Ok(draft)
    }

    async fn find_by_message(
        &self,
        user_id: UserId,
        message_id: i64,
    ) -> AppResult<Option<SummaryDraft>> {
        Ok(self
            .summary_drafts
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.user_id == user_id && d.message_id == Some(message_id))
            .cloned())
    }

    async fn find_superseded(&self, draft: &SummaryDraft) -> AppResult<Vec<SummaryDraft>> {
        Ok(self
            .summary_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.draft_id != draft.draft_id
                    && d.user_id == draft.user_id
                    && d.summary_date == draft.summary_date
            })
            .cloned()
            .collect())
    }

    async fn find_rendered(
        &self,
        user_id: UserId,
        summary_date: NaiveDate,
    ) -> AppResult<Vec<SummaryDraft>> {
        Ok(self
            .summary_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.user_id == user_id
                    && d.summary_date == Some(summary_date)
                    && d.message_id.is_some()
            })
            .cloned()
            .collect())
    }

    async fn find_affected_by_commit(&self, book_date: NaiveDate) -> AppResult<Vec<SummaryDraft>> {
        Ok(self
            .summary_drafts
            .lock()
            .unwrap()
            .iter()
            .filter(|d| (d.summary_date == Some(book_date) && d.state == 1) || d.state == 0)
            .cloned()
            .collect())
    }

    async fn set_summary_date(&self, draft_id: DraftId, summary_date: NaiveDate) -> AppResult<()> {
        let mut drafts = self.summary_drafts.lock().unwrap();
        if let Some(d) = drafts.iter_mut().find(|d| d.draft_id == draft_id) {
            d.summary_date = Some(summary_date);
        }
        Ok(())
    }

    async fn set_state(&self, draft_id: DraftId, state: i32) -> AppResult<()> {
        let mut drafts = self.summary_drafts.lock().unwrap();
        if let Some(d) = drafts.iter_mut().find(|d| d.draft_id == draft_id) {
            d.state = state;
        }
        Ok(())
    }

    async fn set_message(&self, draft_id: DraftId, message_id: i64) -> AppResult<()> {
        let mut drafts = self.summary_drafts.lock().unwrap();
        if let Some(d) = drafts.iter_mut().find(|d| d.draft_id == draft_id) {
            d.message_id = Some(message_id);
        }
        Ok(())
    }

    async fn reallocate(&self, _target: DraftId, superseded: &[DraftId]) -> AppResult<()> {
        self.summary_drafts
            .lock()
            .unwrap()
            .retain(|d| !superseded.contains(&d.draft_id));
        Ok(())
    }
}

#[async_trait]
impl ReminderRepository for FakeStore {
    async fn create(&self, event: CreateReminder) -> AppResult<ReminderId> {
        let reminder_id = ReminderId::new();
        self.reminders.lock().unwrap().push(Reminder {
            reminder_id,
            seconds: event.seconds,
            user_id: event.user_id,
            draft_id: event.draft_id,
        });
        Ok(reminder_id)
    }

    async fn delete(&self, reminder_id: ReminderId) -> AppResult<()> {
        let mut reminders = self.reminders.lock().unwrap();
        let before = reminders.len();
        reminders.retain(|r| r.reminder_id != reminder_id);
        if reminders.len() == before {
            return Err(AppError::EntityNotFound("reminder not found".into()));
        }
        Ok(())
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Reminder>> {
        let mut reminders: Vec<Reminder> = self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.seconds);
        Ok(reminders)
    }

    async fn find_by_user_and_seconds(
        &self,
        user_id: UserId,
        seconds: i64,
    ) -> AppResult<Option<Reminder>> {
        Ok(self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.seconds == seconds)
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingBus {
    pub events: Mutex<Vec<(&'static str, String)>>,
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn publish(&self, topic: Topic, payload: &str) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((topic.channel(), payload.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentRecord {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub reply_to: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct EditRecord {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

pub struct RecordingMessenger {
    pub sent: Mutex<Vec<SentRecord>>,
    pub edits: Mutex<Vec<EditRecord>>,
    pub deleted: Mutex<Vec<(i64, i64)>>,
    next_message_id: AtomicI64,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(100),
        }
    }
}

impl RecordingMessenger {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, chat_id: i64, text: &str, opts: SendOptions) -> AppResult<i64> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(SentRecord {
            chat_id,
            message_id,
            text: text.to_string(),
            reply_to: opts.reply_to,
        });
        Ok(message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        _opts: SendOptions,
    ) -> AppResult<()> {
        self.edits.lock().unwrap().push(EditRecord {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> AppResult<()> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str) -> AppResult<()> {
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub bus: Arc<RecordingBus>,
    pub messenger: Arc<RecordingMessenger>,
    pub registry: AppRegistry,
}

pub fn harness() -> Harness {
    let store = Arc::new(FakeStore::default());
    let bus = Arc::new(RecordingBus::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let registry = AppRegistry::from_parts(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        bus.clone(),
        messenger.clone(),
        BotConfig {
            token: "test-token".into(),
            admin_token: "admin-token".into(),
            admin_chat_id: 1,
            webhook_url: None,
        },
    );
    Harness {
        store,
        bus,
        messenger,
        registry,
    }
}

pub fn make_user(role: Role, chat_id: i64) -> User {
    User {
        user_id: UserId::new(),
        first_name: "Иван".into(),
        last_name: "Иванов".into(),
        order_number: format!("order-{}", chat_id),
        username: Some(format!("user{}", chat_id)),
        chat_id: Some(chat_id),
        role,
    }
}

pub fn make_washer(name: &str) -> Washer {
    Washer {
        washer_id: WasherId::new(),
        washer_name: name.into(),
        available: true,
    }
}
