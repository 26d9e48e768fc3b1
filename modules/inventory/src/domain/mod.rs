pub mod analytics;
pub mod codec;
pub mod error;
pub mod insight;
pub mod model;
pub mod repo;
pub mod store;
