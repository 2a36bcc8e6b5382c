pub mod daily_log;
pub mod daily_task;
pub mod stats;
pub mod timetable;
pub mod user;
