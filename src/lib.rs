pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod review;
pub mod store;
