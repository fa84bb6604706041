use storage::Storage;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) storage: Storage,
    pub(crate) cookie_name: String,
    pub(crate) max_body_bytes: usize,
}
