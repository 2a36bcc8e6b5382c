mod pool;

pub mod logs;
pub mod tasks;
pub mod timetable;
pub mod users;

pub use pool::create_pool;
