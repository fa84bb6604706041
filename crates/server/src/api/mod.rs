use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use list_store::{
    add_todo, complete_all_todos, create_list, delete_list, delete_todos_named, load_list,
    rename_list, set_todo_completed, StoreContext, LIST_NOT_FOUND,
};
use shared::{
    domain::{ListId, TodoId},
    error::ApiError,
    protocol::{CompletionForm, ListNameForm, TodoForm},
};
use storage::SessionData;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;

use crate::{
    app_state::AppState,
    session::{is_async_request, SessionScope},
    views,
};

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/", get(index).fallback(http_unmatched))
        .route("/healthz", get(healthz).fallback(http_unmatched))
        .route(
            "/lists",
            get(http_lists)
                .post(http_create_list)
                .fallback(http_unmatched),
        )
        .route("/lists/new", get(http_new_list).fallback(http_unmatched))
        .route(
            "/list/:id",
            get(http_show_list)
                .post(http_rename_list)
                .fallback(http_unmatched),
        )
        .route("/list/:id/edit", get(http_edit_list).fallback(http_unmatched))
        .route("/list/:id/delete", post(http_delete_list).fallback(http_unmatched))
        .route("/list/:id/todos", post(http_add_todo).fallback(http_unmatched))
        .route(
            "/list/:id/delete_todo/:name",
            post(http_delete_todo).fallback(http_unmatched),
        )
        .route(
            "/list/:id/todos/:todo_id",
            post(http_update_todo).fallback(http_unmatched),
        )
        .route(
            "/list/:id/complete_all",
            post(http_complete_all).fallback(http_unmatched),
        )
        .fallback(http_unmatched)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Redirect {
    Redirect::to("/lists")
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_lists(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let response = session
        .run(&state, |data| {
            let flash = data.take_flash();
            views::lists_page(&data.lists, flash)
        })
        .await;
    session.respond(&state, response)
}

async fn http_new_list(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let response = session
        .run(&state, |data| {
            views::new_list_page(data.take_flash(), "", StatusCode::OK)
        })
        .await;
    session.respond(&state, response)
}

async fn http_create_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ListNameForm>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let response = session
        .run(&state, |data| {
            let result = create_list(&mut store(data), &form.list_name);
            match result {
                Ok(_) => {
                    data.set_success("The list has been created.");
                    Redirect::to("/lists").into_response()
                }
                Err(err) => views::new_list_page(
                    flash_with_error(data, err),
                    &form.list_name,
                    StatusCode::UNPROCESSABLE_ENTITY,
                ),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_show_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let response = session
        .run(&state, |data| {
            let loaded = load_list(&store(data), list_id).cloned();
            match loaded {
                Ok(list) => views::list_page(&list, data.take_flash(), "", StatusCode::OK),
                Err(err) => redirect_with_error(data, err, "/"),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_edit_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let response = session
        .run(&state, |data| {
            let loaded = load_list(&store(data), list_id).cloned();
            match loaded {
                Ok(list) => {
                    views::edit_list_page(&list, data.take_flash(), &list.name, StatusCode::OK)
                }
                Err(err) => redirect_with_error(data, err, "/"),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_rename_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ListNameForm>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let response = session
        .run(&state, |data| {
            let result = rename_list(&mut store(data), list_id, &form.list_name);
            match result {
                Ok(()) => {
                    data.set_success("The name has been updated.");
                    Redirect::to(&list_path(list_id)).into_response()
                }
                Err(err) if err.is_not_found() => redirect_with_error(data, err, "/"),
                Err(err) => {
                    let loaded = load_list(&store(data), list_id).cloned();
                    match loaded {
                        Ok(list) => views::edit_list_page(
                            &list,
                            flash_with_error(data, err),
                            &form.list_name,
                            StatusCode::UNPROCESSABLE_ENTITY,
                        ),
                        Err(err) => redirect_with_error(data, err, "/"),
                    }
                }
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_delete_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let is_async = is_async_request(&headers);
    let response = session
        .run(&state, |data| {
            let result = delete_list(&mut store(data), list_id);
            match result {
                Ok(_) if is_async => "/lists".into_response(),
                Ok(removed) => {
                    data.set_success(format!(
                        "List '{}' has been successfully deleted.",
                        removed.name
                    ));
                    Redirect::to("/lists").into_response()
                }
                Err(err) => redirect_with_error(data, err, "/"),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_add_todo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let response = session
        .run(&state, |data| {
            let result = add_todo(&mut store(data), list_id, &form.todo);
            match result {
                Ok(_) => {
                    data.set_success("New todo has been added.");
                    Redirect::to(&list_path(list_id)).into_response()
                }
                Err(err) if err.is_not_found() => redirect_with_error(data, err, "/"),
                Err(err) => {
                    let loaded = load_list(&store(data), list_id).cloned();
                    match loaded {
                        Ok(list) => views::list_page(
                            &list,
                            flash_with_error(data, err),
                            &form.todo,
                            StatusCode::UNPROCESSABLE_ENTITY,
                        ),
                        Err(err) => redirect_with_error(data, err, "/"),
                    }
                }
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_delete_todo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, name)): Path<(String, String)>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let is_async = is_async_request(&headers);
    let response = session
        .run(&state, |data| {
            let result = delete_todos_named(&mut store(data), list_id, &name);
            match result {
                Ok(_) if is_async => StatusCode::NO_CONTENT.into_response(),
                Ok(_) => {
                    data.set_success("List item deleted.");
                    Redirect::to(&list_path(list_id)).into_response()
                }
                Err(err) => redirect_with_error(data, err, "/"),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_update_todo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, todo_id)): Path<(String, String)>,
    Form(form): Form<CompletionForm>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let todo_id = TodoId(parse_id(&todo_id));
    let response = session
        .run(&state, |data| {
            let missing_list = load_list(&store(data), list_id).err();
            if let Some(err) = missing_list {
                return redirect_with_error(data, err, "/");
            }
            let result =
                set_todo_completed(&mut store(data), list_id, todo_id, form.is_completed());
            match result {
                Ok(_) => {
                    data.set_success("Todo has been updated.");
                    Redirect::to(&list_path(list_id)).into_response()
                }
                Err(err) => redirect_with_error(data, err, &list_path(list_id)),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_complete_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let list_id = parse_list_id(&id);
    let response = session
        .run(&state, |data| {
            let result = complete_all_todos(&mut store(data), list_id);
            match result {
                Ok(()) => {
                    data.set_success("Todos have been updated.");
                    Redirect::to(&list_path(list_id)).into_response()
                }
                Err(err) => redirect_with_error(data, err, "/"),
            }
        })
        .await;
    session.respond(&state, response)
}

async fn http_unmatched(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = SessionScope::open(&state, &headers).await;
    let response = session
        .run(&state, |data| {
            redirect_with_error(data, ApiError::not_found(LIST_NOT_FOUND), "/")
        })
        .await;
    session.respond(&state, response)
}

fn store(data: &mut SessionData) -> StoreContext<'_> {
    StoreContext::new(&mut data.lists)
}

/// Non-numeric ids map to 0, which no list or todo ever carries.
fn parse_id(raw: &str) -> i64 {
    raw.trim().parse().unwrap_or(0)
}

fn parse_list_id(raw: &str) -> ListId {
    ListId(parse_id(raw))
}

fn list_path(list_id: ListId) -> String {
    format!("/list/{list_id}")
}

fn flash_with_error(data: &mut SessionData, err: ApiError) -> shared::protocol::Flash {
    let mut flash = data.take_flash();
    flash.error = Some(err.message);
    flash
}

fn redirect_with_error(data: &mut SessionData, err: ApiError, to: &str) -> Response {
    warn!(code = ?err.code, message = %err.message, to, "redirecting after failed lookup");
    data.set_error(err.message);
    Redirect::to(to).into_response()
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
