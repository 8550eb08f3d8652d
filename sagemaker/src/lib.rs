pub mod api;
pub mod connector;
pub mod resource;

#[cfg(test)]
mod fake;

pub use connector::LifecycleConfigConnector;
