pub mod addr;
pub mod api;
pub mod connector;
pub mod op;
pub mod resource;

#[cfg(test)]
mod fake;

pub use connector::{LogGroupConnector, MetricFilterConnector};
