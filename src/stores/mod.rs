pub mod memory_store;
pub mod table_store;
