pub mod auth;
pub mod stats;
pub mod study;
pub mod users;
pub mod words;
