pub mod api;
pub mod core;
pub mod handlers;
pub mod models;
pub mod stores;
pub mod validation;

#[cfg(test)]
mod test_support;
