use std::sync::Mutex;

use async_trait::async_trait;

use super::{NewTodo, NewUser, Todo, TodoChanges, TodoStore, User, UserStore};

/// In-memory store used by tests (via `AppState::fake()`). Kept behind the
/// same traits as the Postgres store so handlers can be exercised without a
/// database. Ids count up from 1 and are never handed out twice, even after
/// a delete.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    todos: Vec<Todo>,
    next_user_id: i64,
    next_todo_id: i64,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: new.username,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TodoStore for MemStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Todo>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.todos.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Todo>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .todos
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Todo>> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.todos.clone())
    }

    async fn insert(&self, new: NewTodo) -> anyhow::Result<Todo> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_todo_id += 1;
        let todo = Todo {
            id: inner.next_todo_id,
            title: new.title,
            description: new.description,
            priority: new.priority,
            complete: new.complete,
            owner_id: new.owner_id,
        };
        inner.todos.push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: i64, changes: TodoChanges) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        match inner.todos.iter_mut().find(|t| t.id == id) {
            Some(todo) => {
                todo.title = changes.title;
                todo.description = changes.description;
                todo.priority = changes.priority;
                todo.complete = changes.complete;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.todos.len();
        inner.todos.retain(|t| t.id != id);
        Ok(inner.todos.len() < before)
    }
}
