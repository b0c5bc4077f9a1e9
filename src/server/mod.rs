pub mod config;
pub mod overdue_monitor;
