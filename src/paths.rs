const TASKS_ROOT: &str = "tasks";

pub fn tasks_path(user_id: &str) -> String {
    format!("{TASKS_ROOT}/{user_id}")
}

pub fn task_path(user_id: &str, task_id: &str) -> String {
    format!("{TASKS_ROOT}/{user_id}/{task_id}")
}

/// Splits `a/b/c` into (`a/b`, `c`).
///
/// Returns `None` for a single segment or when any segment is empty, so
/// `tasks/u1/` (a record path with an empty key) never names the collection.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.split('/').any(str::is_empty) {
        return None;
    }
    path.rsplit_once('/')
}
