pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskProgress, TaskQuery, TaskUpdate};
pub use user::{User, UserInput, UserResponse};
