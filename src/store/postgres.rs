use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{NewTodo, NewUser, Role, Todo, TodoChanges, TodoStore, User, UserStore};

/// Postgres-backed store. Writes are single statements, so concurrent
/// operations on the same row serialize inside the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: String,
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            password_hash: r.password_hash,
            role: Role::parse(&r.role),
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: String,
    priority: i32,
    complete: bool,
    owner_id: i64,
}

impl From<TodoRow> for Todo {
    fn from(r: TodoRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            priority: r.priority,
            complete: r.complete,
            owner_id: r.owner_id,
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, role, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, role, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash, role, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, username, email, first_name, last_name, password_hash, role, is_active
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, description, priority, complete, owner_id
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Todo::from))
    }

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Todo>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, description, priority, complete, owner_id
            FROM todos
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Todo>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, description, priority, complete, owner_id
            FROM todos
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn insert(&self, new: NewTodo) -> anyhow::Result<Todo> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            INSERT INTO todos (title, description, priority, complete, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, priority, complete, owner_id
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.priority)
        .bind(new.complete)
        .bind(new.owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: i64, changes: TodoChanges) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = $2, description = $3, priority = $4, complete = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.priority)
        .bind(changes.complete)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
