//! Timed trigger: runs the batch on a cron schedule.

pub mod cron;
pub mod engine;

pub use self::cron::CheckinSchedule;
pub use self::engine::run_scheduler_loop;
