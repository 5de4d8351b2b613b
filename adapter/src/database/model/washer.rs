use kernel::model::{id::WasherId, washer::Washer};

#[derive(sqlx::FromRow)]
pub struct WasherRow {
    pub washer_id: WasherId,
    pub washer_name: String,
    pub available: bool,
}

impl From<WasherRow> for Washer {
    fn from(value: WasherRow) -> Self {
        let WasherRow {
            washer_id,
            washer_name,
            available,
        } = value;
        Washer {
            washer_id,
            washer_name,
            available,
        }
    }
}
