use shared::{
    domain::{Completable, ListId, Todo, TodoId, TodoList},
    error::ApiError,
};
use tracing::debug;

pub const MAX_NAME_CHARS: usize = 100;

pub const LIST_NOT_FOUND: &str = "The specified list was not found.";
pub const TODO_NOT_FOUND: &str = "The specified todo was not found.";
pub const LIST_NAME_LENGTH: &str = "The list name must be between 1 and 100 characters.";
pub const LIST_NAME_UNIQUE: &str = "The list name must be unique.";
pub const TODO_LENGTH: &str = "Todo must be between 1 and 100 characters.";

/// The lists owned by one session, borrowed for the duration of a request.
pub struct StoreContext<'a> {
    pub lists: &'a mut Vec<TodoList>,
}

impl<'a> StoreContext<'a> {
    pub fn new(lists: &'a mut Vec<TodoList>) -> Self {
        Self { lists }
    }
}

pub fn load_list<'c>(ctx: &'c StoreContext<'_>, list_id: ListId) -> Result<&'c TodoList, ApiError> {
    ctx.lists
        .iter()
        .find(|list| list.id == list_id)
        .ok_or_else(|| ApiError::not_found(LIST_NOT_FOUND))
}

fn load_list_mut<'c>(
    ctx: &'c mut StoreContext<'_>,
    list_id: ListId,
) -> Result<&'c mut TodoList, ApiError> {
    ctx.lists
        .iter_mut()
        .find(|list| list.id == list_id)
        .ok_or_else(|| ApiError::not_found(LIST_NOT_FOUND))
}

pub fn create_list(ctx: &mut StoreContext<'_>, name: &str) -> Result<ListId, ApiError> {
    let name = name.trim();
    if let Some(message) = error_for_list_name(ctx.lists.as_slice(), name, None) {
        return Err(ApiError::validation(message));
    }

    let list_id = next_list_id(ctx.lists.as_slice());
    ctx.lists.push(TodoList::new(list_id, name));
    debug!(%list_id, name, "list created");
    Ok(list_id)
}

pub fn rename_list(
    ctx: &mut StoreContext<'_>,
    list_id: ListId,
    name: &str,
) -> Result<(), ApiError> {
    let name = name.trim();
    load_list(ctx, list_id)?;
    if let Some(message) = error_for_list_name(ctx.lists.as_slice(), name, Some(list_id)) {
        return Err(ApiError::validation(message));
    }

    let list = load_list_mut(ctx, list_id)?;
    list.name = name.to_string();
    debug!(%list_id, name, "list renamed");
    Ok(())
}

/// Removes the list and hands it back so callers can report its name.
pub fn delete_list(ctx: &mut StoreContext<'_>, list_id: ListId) -> Result<TodoList, ApiError> {
    let index = ctx
        .lists
        .iter()
        .position(|list| list.id == list_id)
        .ok_or_else(|| ApiError::not_found(LIST_NOT_FOUND))?;
    let removed = ctx.lists.remove(index);
    debug!(%list_id, name = %removed.name, "list deleted");
    Ok(removed)
}

pub fn add_todo(
    ctx: &mut StoreContext<'_>,
    list_id: ListId,
    text: &str,
) -> Result<TodoId, ApiError> {
    let text = text.trim();
    let list = load_list_mut(ctx, list_id)?;
    if let Some(message) = error_for_todo(text) {
        return Err(ApiError::validation(message));
    }

    let todo_id = next_todo_id(&list.todos);
    list.todos.push(Todo::new(todo_id, text));
    list.refresh_completed();
    debug!(%list_id, %todo_id, "todo added");
    Ok(todo_id)
}

/// Deletes every todo in the list whose name matches exactly; returns how many went.
pub fn delete_todos_named(
    ctx: &mut StoreContext<'_>,
    list_id: ListId,
    name: &str,
) -> Result<usize, ApiError> {
    let list = load_list_mut(ctx, list_id)?;
    let before = list.todos.len();
    list.todos.retain(|todo| todo.name != name);
    list.refresh_completed();
    let removed = before - list.todos.len();
    debug!(%list_id, removed, "todos deleted by name");
    Ok(removed)
}

/// Returns the list's completed state after the update.
pub fn set_todo_completed(
    ctx: &mut StoreContext<'_>,
    list_id: ListId,
    todo_id: TodoId,
    completed: bool,
) -> Result<bool, ApiError> {
    let list = load_list_mut(ctx, list_id)?;
    let todo = list
        .todo_mut(todo_id)
        .ok_or_else(|| ApiError::not_found(TODO_NOT_FOUND))?;
    todo.completed = completed;
    list.refresh_completed();
    debug!(%list_id, %todo_id, completed, "todo updated");
    Ok(list.completed)
}

pub fn complete_all_todos(ctx: &mut StoreContext<'_>, list_id: ListId) -> Result<(), ApiError> {
    let list = load_list_mut(ctx, list_id)?;
    for todo in &mut list.todos {
        todo.completed = true;
    }
    list.refresh_completed();
    debug!(%list_id, count = list.todos.len(), "all todos completed");
    Ok(())
}

/// `renaming` excludes that list from the uniqueness check so a list may keep its own name.
pub fn error_for_list_name(
    lists: &[TodoList],
    name: &str,
    renaming: Option<ListId>,
) -> Option<&'static str> {
    if !name_length_ok(name) {
        Some(LIST_NAME_LENGTH)
    } else if lists
        .iter()
        .any(|list| list.name == name && Some(list.id) != renaming)
    {
        Some(LIST_NAME_UNIQUE)
    } else {
        None
    }
}

pub fn error_for_todo(text: &str) -> Option<&'static str> {
    (!name_length_ok(text)).then_some(TODO_LENGTH)
}

fn name_length_ok(value: &str) -> bool {
    (1..=MAX_NAME_CHARS).contains(&value.chars().count())
}

pub fn next_list_id(lists: &[TodoList]) -> ListId {
    ListId(next_id(lists.iter().map(|list| list.id.0)))
}

pub fn next_todo_id(todos: &[Todo]) -> TodoId {
    TodoId(next_id(todos.iter().map(|todo| todo.id.0)))
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

/// Incomplete items first, complete items last, each group in its original
/// order. Every item is paired with its index in `items`.
pub fn sort_by_completion<T: Completable>(items: &[T]) -> Vec<(usize, &T)> {
    let (complete, mut incomplete): (Vec<_>, Vec<_>) = items
        .iter()
        .enumerate()
        .partition(|(_, item)| item.is_complete());
    incomplete.extend(complete);
    incomplete
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
