pub mod config;
pub mod logging;

pub mod list;
pub mod naming;
pub mod scheduler;
pub mod transfer;
