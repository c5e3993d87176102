use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Day-month-year format used for birth dates on the wire, e.g. `07 Mar 1994`
pub const DATE_FORMAT: &str = "%d %b %Y";

/// Stored user row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub dob: NaiveDate,
    pub password: String,
    pub image_url: String,
    pub reset_code: Option<String>,
    pub created_on: NaiveDate,
}

/// Validated signup payload with the password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub dob: NaiveDate,
    pub password_hash: String,
    pub image_url: String,
    pub created_on: NaiveDate,
}

/// User fields safe to hand back to clients and to embed in tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub dob: String,
    pub created_on: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
            dob: user.dob.format(DATE_FORMAT).to_string(),
            created_on: user.created_on.format(DATE_FORMAT).to_string(),
        }
    }
}
