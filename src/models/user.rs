use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const USERS_TABLE: &str = "users";

/// Natural key of a user row; also the upsert conflict column
pub const USER_KEY: &str = "phone_no";

/// Two-dimensional `pass` grid.
///
/// Only the shape is guaranteed (an array of arrays); rows may differ in
/// length and cells are stored as given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassGrid(pub Vec<Vec<Value>>);

/// Full user payload sent on create/replace
#[derive(Clone, Debug, Serialize)]
pub struct UserRecord {
    pub phone_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Stored as received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub pass: PassGrid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_name: Option<String>,
    /// Forwarded with the client's number representation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SetPaid {
    #[serde(skip)]
    pub phone_no: String,
    pub paid: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SetAmount {
    #[serde(skip)]
    pub phone_no: String,
    pub amount: Number,
}

#[derive(Clone, Debug, Serialize)]
pub struct SetPass {
    #[serde(skip)]
    pub phone_no: String,
    pub pass: PassGrid,
}
