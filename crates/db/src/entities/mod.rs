pub mod category;
pub mod task;
pub mod task_level;
pub mod task_status;
pub mod workflow;
