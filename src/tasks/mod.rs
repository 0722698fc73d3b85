pub mod alert_scheduler;
