use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use list_store::sort_by_completion;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use shared::{domain::TodoList, error::ApiError, protocol::Flash};
use tracing::error;

struct FlashView {
    error: String,
    success: String,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        Self {
            error: flash.error.unwrap_or_default(),
            success: flash.success.unwrap_or_default(),
        }
    }
}

struct ListRow {
    index: usize,
    id: i64,
    name: String,
    class: &'static str,
    remaining: usize,
    total: usize,
}

struct TodoRow {
    index: usize,
    id: i64,
    name: String,
    encoded_name: String,
    completed: bool,
    toggle_to: &'static str,
}

#[derive(Template)]
#[template(path = "lists.html")]
struct ListsTemplate {
    flash: FlashView,
    rows: Vec<ListRow>,
}

#[derive(Template)]
#[template(path = "new_list.html")]
struct NewListTemplate {
    flash: FlashView,
    list_name: String,
}

#[derive(Template)]
#[template(path = "list.html")]
struct ListTemplate {
    flash: FlashView,
    list_id: i64,
    name: String,
    class: &'static str,
    remaining: usize,
    total: usize,
    todos: Vec<TodoRow>,
    todo_text: String,
}

#[derive(Template)]
#[template(path = "edit_list.html")]
struct EditListTemplate {
    flash: FlashView,
    list_id: i64,
    current_name: String,
    list_name: String,
}

pub(crate) fn lists_page(lists: &[TodoList], flash: Flash) -> Response {
    let rows = sort_by_completion(lists)
        .into_iter()
        .map(|(index, list)| ListRow {
            index,
            id: list.id.0,
            name: list.name.clone(),
            class: list.css_class().unwrap_or_default(),
            remaining: list.remaining_count(),
            total: list.todo_count(),
        })
        .collect();
    render(
        &ListsTemplate {
            flash: flash.into(),
            rows,
        },
        StatusCode::OK,
    )
}

pub(crate) fn new_list_page(flash: Flash, list_name: &str, status: StatusCode) -> Response {
    render(
        &NewListTemplate {
            flash: flash.into(),
            list_name: list_name.to_string(),
        },
        status,
    )
}

pub(crate) fn list_page(
    list: &TodoList,
    flash: Flash,
    todo_text: &str,
    status: StatusCode,
) -> Response {
    let todos = sort_by_completion(&list.todos)
        .into_iter()
        .map(|(index, todo)| TodoRow {
            index,
            id: todo.id.0,
            name: todo.name.clone(),
            encoded_name: utf8_percent_encode(&todo.name, NON_ALPHANUMERIC).to_string(),
            completed: todo.completed,
            toggle_to: if todo.completed { "false" } else { "true" },
        })
        .collect();
    render(
        &ListTemplate {
            flash: flash.into(),
            list_id: list.id.0,
            name: list.name.clone(),
            class: list.css_class().unwrap_or_default(),
            remaining: list.remaining_count(),
            total: list.todo_count(),
            todos,
            todo_text: todo_text.to_string(),
        },
        status,
    )
}

pub(crate) fn edit_list_page(
    list: &TodoList,
    flash: Flash,
    list_name: &str,
    status: StatusCode,
) -> Response {
    render(
        &EditListTemplate {
            flash: flash.into(),
            list_id: list.id.0,
            current_name: list.name.clone(),
            list_name: list_name.to_string(),
        },
        status,
    )
}

fn render<T: Template>(template: &T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            let failure = ApiError::internal(format!("failed to render page: {err}"));
            error!(code = ?failure.code, message = %failure.message, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, failure.message).into_response()
        }
    }
}
