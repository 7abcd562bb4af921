pub mod todo;

pub use todo::{
    MessageResponse, NewTodoRequest, Todo, TodoId, UpdateTodoStatusRequest, ValidationError,
    is_valid_date, now_rfc3339,
};
