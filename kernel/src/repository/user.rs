use crate::model::{
    id::UserId,
    role::Role,
    user::{event::BindChat, User},
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> AppResult<User>;
    // チャットに紐付け済みの利用者を引く
    async fn find_by_chat_id(&self, chat_id: i64) -> AppResult<Option<User>>;
    // 事前登録されている身元（姓・名・契約番号）から利用者を引く
    async fn find_by_identity(
        &self,
        first_name: &str,
        last_name: &str,
        order_number: &str,
    ) -> AppResult<Option<User>>;
    // 認証成功時にチャット ID とユーザー名を書き込む
    async fn bind_chat(&self, event: BindChat) -> AppResult<()>;
    async fn find_by_role(&self, role: Role) -> AppResult<Vec<User>>;
}
