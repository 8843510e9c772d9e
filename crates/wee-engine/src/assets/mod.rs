pub mod bitmap;
pub mod loader;
pub mod manifest;
pub mod registry;
