pub mod billing;
pub mod slack;
pub mod team;
