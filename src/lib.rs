pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod services;
pub mod stats;
pub mod tier;
pub mod validate;
