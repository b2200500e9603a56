pub mod contacts;
pub mod extract;
pub mod fallback;
pub mod health;
pub mod root;
pub mod users;
