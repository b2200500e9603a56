use serde::Serialize;

pub const CONTACTS_TABLE: &str = "u1";

pub const CONTACT_KEY: &str = "phone";

#[derive(Clone, Debug, Serialize)]
pub struct NewContact {
    pub username: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
}

/// Partial update of a contact; only supplied fields are written.
///
/// `college: Some(None)` clears the column.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<Option<String>>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.college.is_none()
    }
}
