pub mod context;
pub mod game;
pub mod types;
