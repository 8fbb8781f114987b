use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::CurrentUser,
        policy::{authorize, Access, TodoAction},
    },
    error::ApiError,
    state::AppState,
    store::{NewTodo, TodoStore},
};

use super::dto::{TodoRequest, TodoResponse};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos))
        .route("/todos/:id", get(get_todo))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", post(create_todo))
        .route("/todos/:id", axum::routing::put(update_todo).delete(delete_todo))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/todos", get(admin_list_todos))
        .route("/admin/todos/:id", delete(admin_delete_todo))
}

#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.list_by_owner(identity.id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

/// Foreign ownership answers exactly like absence so ids cannot be probed.
#[instrument(skip(state))]
pub async fn get_todo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state
        .todos
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Todo"))?;
    if authorize(&identity, Some(todo.owner_id), TodoAction::Read) == Access::Deny {
        warn!(user_id = identity.id, todo_id = id, "read denied");
        return Err(ApiError::NotFound("Todo"));
    }
    Ok(Json(todo.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(payload): Json<TodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    payload.validate()?;
    let todo = state
        .todos
        .insert(NewTodo {
            title: payload.title,
            description: payload.description,
            priority: payload.priority,
            complete: payload.complete,
            // Ownership always comes from the token, never the body.
            owner_id: identity.id,
        })
        .await?;
    info!(user_id = identity.id, todo_id = todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(todo.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<TodoRequest>,
) -> Result<StatusCode, ApiError> {
    payload.validate()?;
    let todo = state
        .todos
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Todo"))?;
    if authorize(&identity, Some(todo.owner_id), TodoAction::Update) == Access::Deny {
        warn!(user_id = identity.id, todo_id = id, "update denied");
        return Err(ApiError::NotFound("Todo"));
    }
    // The row may have been deleted since the ownership check.
    if !state.todos.update(id, payload.into_changes()).await? {
        return Err(ApiError::NotFound("Todo"));
    }
    info!(user_id = identity.id, todo_id = id, "todo updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let todo = state
        .todos
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("Todo"))?;
    if authorize(&identity, Some(todo.owner_id), TodoAction::Delete) == Access::Deny {
        warn!(user_id = identity.id, todo_id = id, "delete denied");
        return Err(ApiError::NotFound("Todo"));
    }
    if !state.todos.delete(id).await? {
        return Err(ApiError::NotFound("Todo"));
    }
    info!(user_id = identity.id, todo_id = id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn admin_list_todos(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    if authorize(&identity, None, TodoAction::ListAll) == Access::Deny {
        warn!(user_id = identity.id, "admin listing denied");
        return Err(ApiError::Forbidden);
    }
    let todos = state.todos.list_all().await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn admin_delete_todo(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if authorize(&identity, None, TodoAction::Delete) == Access::Deny {
        warn!(user_id = identity.id, todo_id = id, "admin delete denied");
        return Err(ApiError::Forbidden);
    }
    if !state.todos.delete(id).await? {
        return Err(ApiError::NotFound("Todo"));
    }
    info!(admin_id = identity.id, todo_id = id, "todo deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Identity;
    use crate::auth::password::hash_password;
    use crate::store::{NewUser, Role, UserStore};

    async fn seed_user(state: &AppState, username: &str, role: Role) -> Identity {
        let user = state
            .users
            .insert(NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                first_name: "Test".into(),
                last_name: "User".into(),
                password_hash: hash_password("pw123456").expect("hash"),
                role,
            })
            .await
            .expect("insert");
        Identity {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }

    fn todo_request() -> TodoRequest {
        TodoRequest {
            title: "Buy milk".into(),
            description: "2% milk".into(),
            priority: 3,
            complete: false,
        }
    }

    async fn create(state: &AppState, identity: &Identity, request: TodoRequest) -> TodoResponse {
        let (status, Json(todo)) = create_todo(
            State(state.clone()),
            CurrentUser(identity.clone()),
            Json(request),
        )
        .await
        .expect("create");
        assert_eq!(status, StatusCode::CREATED);
        todo
    }

    #[tokio::test]
    async fn create_assigns_id_and_forces_owner() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;

        let todo = create(&state, &alice, todo_request()).await;
        assert_eq!(todo.id, 1);
        assert_eq!(todo.owner_id, alice.id);
        assert_eq!(todo.title, "Buy milk");
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let created = create(&state, &alice, todo_request()).await;

        let Json(fetched) = get_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(created.id),
        )
        .await
        .expect("get");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.description, created.description);
        assert_eq!(fetched.priority, created.priority);
        assert_eq!(fetched.complete, created.complete);
        assert_eq!(fetched.owner_id, alice.id);
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;

        let mut request = todo_request();
        request.priority = 6;
        let err = create_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Json(request),
        )
        .await
        .err()
        .expect("validation");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn rows_are_invisible_across_users() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let bob = seed_user(&state, "bob", Role::User).await;
        let todo = create(&state, &alice, todo_request()).await;

        // List shows bob nothing.
        let Json(listed) = list_todos(State(state.clone()), CurrentUser(bob.clone()))
            .await
            .expect("list");
        assert!(listed.is_empty());

        // Get, update and delete all answer as if the row did not exist.
        let err = get_todo(State(state.clone()), CurrentUser(bob.clone()), Path(todo.id))
            .await
            .err()
            .expect("denied");
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = update_todo(
            State(state.clone()),
            CurrentUser(bob.clone()),
            Path(todo.id),
            Json(todo_request()),
        )
        .await
        .err()
        .expect("denied");
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = delete_todo(State(state.clone()), CurrentUser(bob.clone()), Path(todo.id))
            .await
            .err()
            .expect("denied");
        assert!(matches!(err, ApiError::NotFound(_)));

        // The row is still there for its owner.
        let Json(listed) = list_todos(State(state.clone()), CurrentUser(alice.clone()))
            .await
            .expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_fields_but_not_owner_or_id() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let todo = create(&state, &alice, todo_request()).await;

        let status = update_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(todo.id),
            Json(TodoRequest {
                title: "Buy oat milk".into(),
                description: "the other kind".into(),
                priority: 1,
                complete: true,
            }),
        )
        .await
        .expect("update");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(fetched) = get_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(todo.id),
        )
        .await
        .expect("get");
        assert_eq!(fetched.title, "Buy oat milk");
        assert_eq!(fetched.priority, 1);
        assert!(fetched.complete);
        assert_eq!(fetched.id, todo.id);
        assert_eq!(fetched.owner_id, alice.id);
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;

        let err = update_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(999),
            Json(todo_request()),
        )
        .await
        .err()
        .expect("missing");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_twice_yields_not_found() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let todo = create(&state, &alice, todo_request()).await;

        let status = delete_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(todo.id),
        )
        .await
        .expect("delete");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(todo.id),
        )
        .await
        .err()
        .expect("second delete");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_lists_all_and_deletes_any() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let admin = seed_user(&state, "root", Role::Admin).await;
        let todo = create(&state, &alice, todo_request()).await;

        let Json(all) = admin_list_todos(State(state.clone()), CurrentUser(admin.clone()))
            .await
            .expect("admin list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].owner_id, alice.id);

        let status = admin_delete_todo(
            State(state.clone()),
            CurrentUser(admin.clone()),
            Path(todo.id),
        )
        .await
        .expect("admin delete");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = admin_delete_todo(State(state.clone()), CurrentUser(admin), Path(todo.id))
            .await
            .err()
            .expect("gone");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn admin_endpoints_forbidden_for_plain_users() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let todo = create(&state, &alice, todo_request()).await;

        let err = admin_list_todos(State(state.clone()), CurrentUser(alice.clone()))
            .await
            .err()
            .expect("forbidden");
        assert!(matches!(err, ApiError::Forbidden));

        // Even for their own row: the admin surface requires the role.
        let err = admin_delete_todo(
            State(state.clone()),
            CurrentUser(alice.clone()),
            Path(todo.id),
        )
        .await
        .err()
        .expect("forbidden");
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn admin_cannot_read_or_update_foreign_rows_directly() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let admin = seed_user(&state, "root", Role::Admin).await;
        let todo = create(&state, &alice, todo_request()).await;

        let err = get_todo(
            State(state.clone()),
            CurrentUser(admin.clone()),
            Path(todo.id),
        )
        .await
        .err()
        .expect("denied");
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = update_todo(
            State(state.clone()),
            CurrentUser(admin.clone()),
            Path(todo.id),
            Json(todo_request()),
        )
        .await
        .err()
        .expect("denied");
        assert!(matches!(err, ApiError::NotFound(_)));

        // Create always lands on the caller, so an admin cannot plant a todo
        // in someone else's list.
        let own = create(&state, &admin, todo_request()).await;
        assert_eq!(own.owner_id, admin.id);
    }

    #[tokio::test]
    async fn registered_scenario_alice_and_bob() {
        let state = AppState::fake();
        let alice = seed_user(&state, "alice", Role::User).await;
        let bob = seed_user(&state, "bob", Role::User).await;

        let todo = create(&state, &alice, todo_request()).await;
        assert_eq!(todo.id, 1);
        assert_eq!(todo.owner_id, alice.id);

        let err = get_todo(State(state.clone()), CurrentUser(bob), Path(1))
            .await
            .err()
            .expect("bob sees nothing");
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
