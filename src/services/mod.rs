pub mod auth;
pub mod maps;
pub mod profiles;
pub mod rows;
pub mod storage;
pub mod unconfigured;
