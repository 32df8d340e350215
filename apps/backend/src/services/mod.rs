pub mod cache;
pub mod password;
pub mod quiz;
