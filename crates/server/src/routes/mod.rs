pub mod categories;
pub mod health;
pub mod task_levels;
pub mod task_statuses;
pub mod tasks;
pub mod workflows;
