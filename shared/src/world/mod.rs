pub mod entity;
pub mod entity_table;
pub mod error;
