pub mod add;
pub mod common;
pub mod config;
pub mod delete;
pub mod edit;
pub mod folder;
pub mod list;
pub mod repos;
pub mod show;
pub mod sync;
