mod feed;
mod todo;
mod user;

pub use feed::{Activity, ActivityAction, Notification, NotificationKind};
pub use todo::{Comment, Label, Subtask, Todo, TodoStatus};
pub use user::{Tenant, User};
