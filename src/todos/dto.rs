use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::{Todo, TodoChanges};

/// Request body for creating or replacing a todo. There is deliberately no
/// owner field; ownership always comes from the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct TodoRequest {
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
}

impl TodoRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.chars().count() < 3 {
            return Err(ApiError::Validation(
                "Title must be at least 3 characters".into(),
            ));
        }
        let description_len = self.description.chars().count();
        if !(3..=100).contains(&description_len) {
            return Err(ApiError::Validation(
                "Description must be between 3 and 100 characters".into(),
            ));
        }
        if !(1..=5).contains(&self.priority) {
            return Err(ApiError::Validation(
                "Priority must be between 1 and 5".into(),
            ));
        }
        Ok(())
    }

    pub fn into_changes(self) -> TodoChanges {
        TodoChanges {
            title: self.title,
            description: self.description,
            priority: self.priority,
            complete: self.complete,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    pub owner_id: i64,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            priority: todo.priority,
            complete: todo.complete,
            owner_id: todo.owner_id,
        }
    }
}
