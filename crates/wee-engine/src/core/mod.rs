pub mod collision;
pub mod stage;
pub mod time;
