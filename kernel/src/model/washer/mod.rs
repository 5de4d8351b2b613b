use crate::model::id::WasherId;

#[derive(Debug, Clone)]
pub struct Washer {
    pub washer_id: WasherId,
    pub washer_name: String,
    // メンテナンス中の洗濯機は false にしておく
    pub available: bool,
}
