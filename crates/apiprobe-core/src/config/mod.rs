//! Engine configuration loading

mod loader;

pub use loader::ConfigLoader;
