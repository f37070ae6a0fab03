mod model_loaders;

pub use model_loaders::{
    load_category_middleware, load_task_level_middleware, load_task_middleware,
    load_task_status_middleware, load_workflow_middleware,
};
