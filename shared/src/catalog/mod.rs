pub mod asset_catalog;
pub mod catalog_receiver;
pub mod error;
pub mod paced_transfer;
pub mod string_dictionary;
