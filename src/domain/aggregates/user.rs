//! Local mirror of identity-provider users and their profiles

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    #[serde(skip)]
    pub user_id: Uuid,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user together with the profile created alongside it.
#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    #[serde(flatten)]
    pub user: User,
    pub profile: UserProfile,
}
