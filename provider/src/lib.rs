pub mod clients;
pub mod registry;
pub mod serve;

pub use registry::Provider;
