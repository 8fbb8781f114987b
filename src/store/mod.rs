use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

pub mod memory;
pub mod postgres;

/// Access level of a user account. Anything the store hands back that is not
/// literally `admin` degrades to `User`, so an unrecognized role can never
/// grant elevated rights.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Role::parse(&s))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record as stored. The hash never leaves the server; response types
/// are built from the public fields only.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    pub owner_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
    pub owner_id: i64,
}

/// Mutable portion of a todo row. `id` and `owner_id` have no counterpart
/// here, which keeps them immutable at the type level.
#[derive(Debug, Clone)]
pub struct TodoChanges {
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub complete: bool,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Insert a new active user; the store assigns the id.
    async fn insert(&self, new: NewUser) -> anyhow::Result<User>;
    /// Replace the stored hash. Returns false when the user no longer exists.
    async fn set_password_hash(&self, id: i64, password_hash: &str) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Todo>>;
    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Todo>>;
    async fn list_all(&self) -> anyhow::Result<Vec<Todo>>;
    /// Insert a new todo; ids are assigned in insertion order and never reused.
    async fn insert(&self, new: NewTodo) -> anyhow::Result<Todo>;
    /// Single-statement write; false when the row vanished concurrently.
    async fn update(&self, id: i64, changes: TodoChanges) -> anyhow::Result<bool>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}
