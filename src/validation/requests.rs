// Per-route request schemas

use crate::models::contact::{ContactPatch, NewContact};
use crate::models::user::{SetAmount, SetPaid, SetPass, UserRecord};
use crate::validation::fields::{FieldError, Validator};
use serde_json::Value;

/// A request body that can be checked and turned into a typed value
pub trait Schema: Sized {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>>;
}

impl Schema for UserRecord {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new(body)?;

        let phone_no = v.required_key("phone_no");
        let pass = v.required_grid("pass");
        let email = v.optional_email("email");
        let username = v.optional_string("username");
        let password = v.optional_string("password");
        let college_name = v.optional_string("college_name");
        let amount = v.optional_amount("amount");
        let count = v.optional_integer("count");

        let (Some(phone_no), Some(pass)) = (phone_no, pass) else {
            return Err(v.into_errors());
        };
        v.finish()?;

        Ok(UserRecord {
            phone_no,
            email,
            username,
            password,
            pass,
            college_name,
            amount,
            count,
        })
    }
}

impl Schema for SetPaid {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new(body)?;

        let phone_no = v.required_key("phone_no");
        let paid = v.required_bool("paid");

        let (Some(phone_no), Some(paid)) = (phone_no, paid) else {
            return Err(v.into_errors());
        };
        Ok(SetPaid { phone_no, paid })
    }
}

impl Schema for SetAmount {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new(body)?;

        let phone_no = v.required_key("phone_no");
        let amount = v.required_amount("amount");

        let (Some(phone_no), Some(amount)) = (phone_no, amount) else {
            return Err(v.into_errors());
        };
        Ok(SetAmount { phone_no, amount })
    }
}

impl Schema for SetPass {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new(body)?;

        let phone_no = v.required_key("phone_no");
        let pass = v.required_grid("pass");

        let (Some(phone_no), Some(pass)) = (phone_no, pass) else {
            return Err(v.into_errors());
        };
        Ok(SetPass { phone_no, pass })
    }
}

impl Schema for NewContact {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new(body)?;

        let username = v.required_string("username");
        let phone = v.required_phone("phone");
        let email = v.required_email("email");
        let college = v.optional_string("college");

        let (Some(username), Some(phone), Some(email)) = (username, phone, email) else {
            return Err(v.into_errors());
        };
        v.finish()?;

        Ok(NewContact {
            username,
            phone,
            email,
            college,
        })
    }
}

impl Schema for ContactPatch {
    fn parse(body: &Value) -> Result<Self, Vec<FieldError>> {
        let mut v = Validator::new(body)?;

        let username = if v.is_present("username") {
            v.required_string("username")
        } else {
            None
        };
        let email = v.optional_email("email");
        let college = if v.is_present("college") {
            Some(v.optional_string("college"))
        } else {
            None
        };

        v.finish()?;

        Ok(ContactPatch {
            username,
            email,
            college,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_user_record_full_body() {
        let body = json!({
            "email": "arun@example.com",
            "phone_no": "9876543210",
            "username": "arun",
            "password": "secret",
            "pass": [[true, false, true], [false, false, false]],
            "college_name": "PSG",
            "amount": 300,
            "count": 2
        });

        let user = UserRecord::parse(&body).unwrap();
        assert_eq!(user.phone_no, "9876543210");
        assert_eq!(user.pass.0.len(), 2);
        assert_eq!(user.amount, Some(serde_json::Number::from(300)));
        assert_eq!(serde_json::to_value(&user).unwrap()["amount"].to_string(), "300");
        assert_eq!(user.count, Some(2));
        assert_eq!(user.college_name.as_deref(), Some("PSG"));
    }

    #[test]
    fn test_user_record_rejects_flat_pass() {
        let body = json!({"phone_no": "9876543210", "pass": [true, false]});
        let errors = UserRecord::parse(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["pass"]);
        assert_eq!(errors[0].message, "pass must be a 2D array");
    }

    #[test]
    fn test_user_record_rejects_negative_amount_and_bad_email() {
        let body = json!({
            "phone_no": "9876543210",
            "pass": [[]],
            "amount": -5,
            "email": "not-an-email"
        });
        let errors = UserRecord::parse(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["email", "amount"]);
    }

    #[test]
    fn test_user_record_requires_key() {
        let body = json!({"pass": [[1]]});
        let errors = UserRecord::parse(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["phone_no"]);
    }

    #[test]
    fn test_set_paid() {
        let ok = SetPaid::parse(&json!({"phone_no": "9876543210", "paid": true})).unwrap();
        assert!(ok.paid);

        let errors = SetPaid::parse(&json!({"phone_no": "9876543210", "paid": "yes"})).unwrap_err();
        assert_eq!(fields(&errors), vec!["paid"]);
    }

    #[test]
    fn test_set_amount_rejects_negative_regardless_of_other_fields() {
        let errors = SetAmount::parse(&json!({"phone_no": "9876543210", "amount": -0.5})).unwrap_err();
        assert_eq!(fields(&errors), vec!["amount"]);

        let errors = SetAmount::parse(&json!({"amount": -1})).unwrap_err();
        assert_eq!(fields(&errors), vec!["phone_no", "amount"]);
    }

    #[test]
    fn test_set_pass() {
        let ok = SetPass::parse(&json!({"phone_no": 9876543210u64, "pass": [[1, 0], [0]]})).unwrap();
        assert_eq!(ok.phone_no, "9876543210");

        let errors = SetPass::parse(&json!({"phone_no": "9876543210", "pass": {"day1": [1]}})).unwrap_err();
        assert_eq!(fields(&errors), vec!["pass"]);
    }

    #[test]
    fn test_new_contact() {
        let body = json!({"username": "arun", "phone": "9876543210", "email": "arun@example.com"});
        let contact = NewContact::parse(&body).unwrap();
        assert_eq!(contact.college, None);

        let body = json!({"username": "arun", "phone": "98765", "email": "arun@", "college": 5});
        let errors = NewContact::parse(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["phone", "email", "college"]);
    }

    #[test]
    fn test_new_contact_rejects_bad_college_type() {
        let body = json!({
            "username": "arun",
            "phone": "9876543210",
            "email": "arun@example.com",
            "college": ["PSG"]
        });
        let errors = NewContact::parse(&body).unwrap_err();
        assert_eq!(fields(&errors), vec!["college"]);
    }

    #[test]
    fn test_contact_patch_supplied_fields() {
        let patch = ContactPatch::parse(&json!({"college": null})).unwrap();
        assert_eq!(patch.college, Some(None));
        assert!(patch.username.is_none());

        let patch = ContactPatch::parse(&json!({})).unwrap();
        assert!(patch.is_empty());

        let errors = ContactPatch::parse(&json!({"username": "", "email": "x@y"})).unwrap_err();
        assert_eq!(fields(&errors), vec!["username", "email"]);
    }
}
