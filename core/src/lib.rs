pub mod config;
pub mod connector;
pub mod error;
pub mod protocol;
pub mod retry;
pub mod tags;
pub mod util;
pub mod wait;
