pub mod category;
pub mod defaults;
pub mod guard;
pub mod ids;
pub mod task;
pub mod task_level;
pub mod task_status;
pub mod workflow;
