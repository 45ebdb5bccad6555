use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Seller;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowersView {
    pub seller_id: Uuid,
    pub followers_count: i64,
    pub follower_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowedSellers {
    pub items: Vec<Seller>,
}
