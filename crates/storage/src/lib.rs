#![forbid(unsafe_code)]

pub mod client_store;
pub mod images;
pub mod repository;
pub mod sheets;
pub mod sqlite;
