use crate::models::user::PassGrid;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10}$").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// A single rejected field and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check a phone number taken from the request path
pub fn validate_phone(field: &str, phone: &str) -> Result<(), Vec<FieldError>> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(vec![FieldError::new(field, format!("{} must be exactly 10 digits", field))])
    }
}

/// Reads fields out of a JSON object body, collecting every failure
///
/// Each accessor returns `None` when the field is rejected (or absent, for the
/// optional ones) and records the reason. Call [`Validator::finish`] once all
/// fields are read.
pub struct Validator<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Validator<'a> {
    pub fn new(body: &'a Value) -> Result<Self, Vec<FieldError>> {
        match body.as_object() {
            Some(body) => Ok(Self {
                body,
                errors: Vec::new(),
            }),
            None => Err(vec![FieldError::new("body", "request body must be a JSON object")]),
        }
    }

    /// Whether the field appears in the body at all (null included)
    pub fn is_present(&self, field: &str) -> bool {
        self.body.contains_key(field)
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.body.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    pub fn required_string(&mut self, field: &str) -> Option<String> {
        let Some(value) = self.present(field) else {
            self.reject(field, format!("{} is required", field));
            return None;
        };
        self.non_empty_string(field, value)
    }

    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        let value = self.present(field)?;
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.reject(field, format!("{} must be a string", field));
                None
            }
        }
    }

    fn non_empty_string(&mut self, field: &str, value: &Value) -> Option<String> {
        match value.as_str() {
            Some(s) if s.trim().is_empty() => {
                self.reject(field, format!("{} must not be empty", field));
                None
            }
            Some(s) => Some(s.to_string()),
            None => {
                self.reject(field, format!("{} must be a string", field));
                None
            }
        }
    }

    /// A natural key: a non-empty string, or an integer taken as its digits
    pub fn required_key(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Some(n.to_string()),
            Some(value) => self.non_empty_string(field, value),
            None => {
                self.reject(field, format!("{} is required", field));
                None
            }
        }
    }

    pub fn required_phone(&mut self, field: &str) -> Option<String> {
        let phone = self.required_string(field)?;
        if !is_valid_phone(&phone) {
            self.reject(field, format!("{} must be exactly 10 digits", field));
            return None;
        }
        Some(phone)
    }

    pub fn required_email(&mut self, field: &str) -> Option<String> {
        let email = self.required_string(field)?;
        self.check_email(field, email)
    }

    pub fn optional_email(&mut self, field: &str) -> Option<String> {
        let email = self.optional_string(field)?;
        self.check_email(field, email)
    }

    fn check_email(&mut self, field: &str, email: String) -> Option<String> {
        if !is_valid_email(&email) {
            self.reject(field, format!("{} must be a valid email address", field));
            return None;
        }
        Some(email)
    }

    pub fn required_bool(&mut self, field: &str) -> Option<bool> {
        match self.body.get(field) {
            Some(Value::Bool(b)) => Some(*b),
            _ => {
                self.reject(field, format!("{} must be a boolean", field));
                None
            }
        }
    }

    pub fn required_amount(&mut self, field: &str) -> Option<Number> {
        if self.present(field).is_none() {
            self.reject(field, format!("{} is required", field));
            return None;
        }
        self.optional_amount(field)
    }

    /// A finite, non-negative number, kept exactly as the client wrote it
    pub fn optional_amount(&mut self, field: &str) -> Option<Number> {
        let value = self.present(field)?;
        match value {
            Value::Number(n) if n.as_f64().is_some_and(|f| f.is_finite() && f >= 0.0) => {
                Some(n.clone())
            }
            _ => {
                self.reject(field, format!("{} must be a non-negative number", field));
                None
            }
        }
    }

    pub fn optional_integer(&mut self, field: &str) -> Option<i64> {
        let value = self.present(field)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.reject(field, format!("{} must be an integer", field));
                None
            }
        }
    }

    /// An array whose every element is itself an array
    pub fn required_grid(&mut self, field: &str) -> Option<PassGrid> {
        let rows = match self.present(field) {
            Some(Value::Array(rows)) if rows.iter().all(Value::is_array) => rows,
            _ => {
                self.reject(field, format!("{} must be a 2D array", field));
                return None;
            }
        };

        let grid = rows
            .iter()
            .filter_map(Value::as_array)
            .map(|row| row.to_vec())
            .collect();
        Some(PassGrid(grid))
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Give up with whatever has been collected so far
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}
