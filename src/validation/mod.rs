pub mod fields;
pub mod requests;
