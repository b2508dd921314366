use std::sync::Arc;

use serde_json::Value;

use crate::errors::{StoreError, TaskListError};
use crate::models::{Session, Task, TaskId, TaskListView, TaskRecord};
use crate::paths::{task_path, tasks_path};
use crate::presenter::Presenter;
use crate::store::{Fields, TaskStore};

pub const DEFAULT_TITLE: &str = "Task Board";
pub const ALERT_ERROR_TITLE: &str = "Error";
pub const DELETE_PROMPT_TITLE: &str = "Attention";
pub const DELETE_PROMPT_MESSAGE: &str = "Delete this task?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Input was empty; nothing happened.
    Skipped,
    Created(Task),
    Updated(Task),
    /// The remote write failed and the user was alerted.
    Failed(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(TaskId),
    Failed(StoreError),
}

/// A delete the user has asked for but not yet confirmed.
///
/// Consumed by either [`TaskListController::confirm_delete`] or
/// [`TaskListController::cancel_delete`], so a prompt resolves at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteConfirmation {
    task_id: TaskId,
}

impl DeleteConfirmation {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn title(&self) -> &'static str {
        DELETE_PROMPT_TITLE
    }

    pub fn message(&self) -> &'static str {
        DELETE_PROMPT_MESSAGE
    }
}

/// Keeps one user's task list in step with the remote store and tracks which task,
/// if any, the input form is editing.
///
/// Every mutating call awaits its single remote operation before touching local
/// state, so local state only ever changes after the store has answered. Dropping
/// an in-flight future (the screen went away) simply skips the local update.
pub struct TaskListController<P: Presenter> {
    store: Arc<dyn TaskStore>,
    presenter: P,
    session: Option<Session>,
    tasks: Vec<Task>,
    loading: bool,
    current_text: String,
    edit_selection: Option<TaskId>,
}

impl<P: Presenter> TaskListController<P> {
    pub fn new(store: Arc<dyn TaskStore>, presenter: P) -> Self {
        Self {
            store,
            presenter,
            session: None,
            tasks: Vec::new(),
            loading: false,
            current_text: String::new(),
            edit_selection: None,
        }
    }

    pub async fn initialize(&mut self, session: Session) -> Result<(), TaskListError> {
        if session.user_id().is_none() {
            log::warn!("task list opened without a user id; returning to first screen");
            self.presenter.navigate_back();
            return Err(TaskListError::MissingSession);
        }
        self.session = Some(session);
        self.load_all().await
    }

    /// Replaces the local list with whatever the store holds for this user.
    ///
    /// A failed read is logged and leaves the list empty; the user is not alerted.
    pub async fn load_all(&mut self) -> Result<(), TaskListError> {
        let user_id = self.user_id()?.to_string();
        self.loading = true;
        self.render();

        self.tasks = match self.store.children(&tasks_path(&user_id)).await {
            Ok(Some(children)) => children
                .into_iter()
                .map(|(id, record)| Task::from_record(id, record))
                .collect(),
            Ok(None) => Vec::new(),
            Err(error) => {
                log::error!("failed to load tasks user={user_id}: {error}");
                Vec::new()
            }
        };
        log::debug!("loaded {} tasks user={user_id}", self.tasks.len());

        if let Some(selected) = self.edit_selection.clone() {
            if !self.contains(&selected) {
                log::debug!("edit selection id={selected} dropped by reload");
                self.current_text.clear();
                self.edit_selection = None;
            }
        }

        self.loading = false;
        self.render();
        Ok(())
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.current_text = text.into();
    }

    /// Creates a task from the input text, or rewrites the selected task's
    /// description when an edit is active. Afterwards the form is back in create
    /// mode whatever the result.
    pub async fn save(&mut self) -> Result<SaveOutcome, TaskListError> {
        if self.current_text.is_empty() {
            return Ok(SaveOutcome::Skipped);
        }
        let user_id = self.user_id()?.to_string();
        let description = self.current_text.clone();

        let outcome = match self.edit_selection.clone() {
            None => self.create(&user_id, description).await,
            Some(task_id) => self.update(&user_id, task_id, description).await,
        };

        if let SaveOutcome::Failed(error) = &outcome {
            log::warn!("failed to save task user={user_id}: {error}");
            self.presenter
                .alert(ALERT_ERROR_TITLE, &format!("Failed to save task: {error}"));
        }
        self.reset();
        Ok(outcome)
    }

    async fn create(&mut self, user_id: &str, description: String) -> SaveOutcome {
        let key = self.store.generate_key();
        let record = TaskRecord { description };
        if let Err(error) = self.store.set(&task_path(user_id, &key), &record).await {
            return SaveOutcome::Failed(error);
        }
        let task = Task::from_record(key, record);
        log::info!("created task id={} user={user_id}", task.id);
        self.tasks.push(task.clone());
        SaveOutcome::Created(task)
    }

    async fn update(&mut self, user_id: &str, task_id: TaskId, description: String) -> SaveOutcome {
        let mut fields = Fields::new();
        fields.insert("description".to_string(), Value::from(description.clone()));
        if let Err(error) = self.store.update(&task_path(user_id, &task_id), fields).await {
            return SaveOutcome::Failed(error);
        }
        if !self.tasks.iter().any(|task| task.id == task_id) {
            log::warn!("updated task id={task_id} is not in the local list");
        }
        self.tasks = with_description(&self.tasks, &task_id, &description);
        log::info!("updated task id={task_id} user={user_id}");
        SaveOutcome::Updated(Task {
            id: task_id,
            description,
        })
    }

    /// Starts the two-step delete. Returns `None` for an id not in the list.
    pub fn request_delete(&self, task_id: &str) -> Option<DeleteConfirmation> {
        if !self.contains(task_id) {
            log::warn!("delete requested for unknown task id={task_id:?}");
            return None;
        }
        Some(DeleteConfirmation {
            task_id: task_id.to_string(),
        })
    }

    pub fn cancel_delete(&self, confirmation: DeleteConfirmation) {
        log::debug!("delete cancelled id={}", confirmation.task_id);
    }

    pub async fn confirm_delete(
        &mut self,
        confirmation: DeleteConfirmation,
    ) -> Result<DeleteOutcome, TaskListError> {
        let user_id = self.user_id()?.to_string();
        let DeleteConfirmation { task_id } = confirmation;

        if let Err(error) = self.store.remove(&task_path(&user_id, &task_id)).await {
            log::warn!("failed to delete task id={task_id} user={user_id}: {error}");
            self.presenter
                .alert(ALERT_ERROR_TITLE, &format!("Failed to delete task: {error}"));
            return Ok(DeleteOutcome::Failed(error));
        }

        self.tasks = self
            .tasks
            .iter()
            .filter(|task| task.id != task_id)
            .cloned()
            .collect();
        if self.edit_selection.as_deref() == Some(task_id.as_str()) {
            // The form must not keep pointing at a task that no longer exists.
            self.reset();
        } else {
            self.render();
        }
        log::info!("deleted task id={task_id} user={user_id}");
        Ok(DeleteOutcome::Deleted(task_id))
    }

    /// Puts the task's text in the input and switches the form to edit mode,
    /// replacing any previous selection. Tasks not in the list are ignored.
    pub fn begin_edit(&mut self, task: &Task) {
        if !self.contains(&task.id) {
            log::warn!("edit requested for unknown task id={:?}", task.id);
            return;
        }
        self.current_text = task.description.clone();
        self.edit_selection = Some(task.id.clone());
        self.presenter.focus_input();
        self.render();
    }

    pub fn cancel_edit(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.current_text.clear();
        self.edit_selection = None;
        self.presenter.dismiss_input();
        self.render();
    }

    fn contains(&self, task_id: &str) -> bool {
        !task_id.is_empty() && self.tasks.iter().any(|task| task.id == task_id)
    }

    fn render(&self) {
        self.presenter.render(&self.view());
    }

    fn user_id(&self) -> Result<&str, TaskListError> {
        self.session
            .as_ref()
            .and_then(Session::user_id)
            .ok_or(TaskListError::MissingSession)
    }

    pub fn view(&self) -> TaskListView {
        TaskListView {
            loading: self.loading,
            tasks: self.tasks.clone(),
            current_text: self.current_text.clone(),
            editing: self.edit_selection.is_some(),
        }
    }

    pub fn title(&self) -> String {
        match &self.session {
            Some(session) if !session.email.is_empty() => format!("Welcome: {}", session.email),
            _ => DEFAULT_TITLE.to_string(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn edit_selection(&self) -> Option<&str> {
        self.edit_selection.as_deref()
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

fn with_description(tasks: &[Task], task_id: &str, description: &str) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            if task.id == task_id {
                Task {
                    id: task.id.clone(),
                    description: description.to_string(),
                }
            } else {
                task.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum UiEvent {
        NavigateBack,
        Alert(String, String),
        Focus,
        Dismiss,
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: Mutex<Vec<UiEvent>>,
        renders: Mutex<Vec<TaskListView>>,
    }

    impl RecordingPresenter {
        fn events(&self) -> Vec<UiEvent> {
            self.events.lock().unwrap().clone()
        }

        fn renders(&self) -> Vec<TaskListView> {
            self.renders.lock().unwrap().clone()
        }

        fn alerts(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    UiEvent::Alert(_, message) => Some(message),
                    _ => None,
                })
                .collect()
        }
    }

    impl Presenter for RecordingPresenter {
        fn navigate_back(&self) {
            self.events.lock().unwrap().push(UiEvent::NavigateBack);
        }

        fn alert(&self, title: &str, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(UiEvent::Alert(title.to_string(), message.to_string()));
        }

        fn focus_input(&self) {
            self.events.lock().unwrap().push(UiEvent::Focus);
        }

        fn dismiss_input(&self) {
            self.events.lock().unwrap().push(UiEvent::Dismiss);
        }

        fn render(&self, view: &TaskListView) {
            self.renders.lock().unwrap().push(view.clone());
        }
    }

    /// Memory store with switchable failures and a call counter.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        calls: AtomicUsize,
    }

    impl FlakyStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn check(&self, fail: &AtomicBool) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if fail.load(Ordering::SeqCst) {
                return Err(StoreError::Network("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TaskStore for FlakyStore {
        fn generate_key(&self) -> String {
            self.inner.generate_key()
        }

        async fn set(&self, path: &str, record: &TaskRecord) -> Result<(), StoreError> {
            self.check(&self.fail_writes)?;
            self.inner.set(path, record).await
        }

        async fn update(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
            self.check(&self.fail_writes)?;
            self.inner.update(path, fields).await
        }

        async fn remove(&self, path: &str) -> Result<(), StoreError> {
            self.check(&self.fail_writes)?;
            self.inner.remove(path).await
        }

        async fn children(
            &self,
            path: &str,
        ) -> Result<Option<Vec<(String, TaskRecord)>>, StoreError> {
            self.check(&self.fail_reads)?;
            self.inner.children(path).await
        }
    }

    fn task(id: &str, description: &str) -> Task {
        Task {
            id: id.to_string(),
            description: description.to_string(),
        }
    }

    async fn seeded_store(tasks: &[Task]) -> Arc<FlakyStore> {
        let store = Arc::new(FlakyStore::default());
        for t in tasks {
            store
                .inner
                .set(&task_path("u1", &t.id), &t.record())
                .await
                .unwrap();
        }
        store
    }

    async fn ready_controller(
        tasks: &[Task],
    ) -> (Arc<FlakyStore>, TaskListController<RecordingPresenter>) {
        let store = seeded_store(tasks).await;
        let mut controller =
            TaskListController::new(store.clone(), RecordingPresenter::default());
        controller
            .initialize(Session::new("u1", "me@example.com"))
            .await
            .unwrap();
        (store, controller)
    }

    #[tokio::test]
    async fn initialize_without_user_id_navigates_back() {
        let store = Arc::new(FlakyStore::default());
        let mut controller =
            TaskListController::new(store.clone(), RecordingPresenter::default());

        let result = controller.initialize(Session::default()).await;

        assert_eq!(result, Err(TaskListError::MissingSession));
        assert_eq!(controller.presenter().events(), vec![UiEvent::NavigateBack]);
        assert!(controller.tasks().is_empty());
        assert!(controller.presenter().renders().iter().all(|v| !v.loading));
        assert!(!controller.is_loading());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn operations_without_session_are_refused() {
        let store = Arc::new(FlakyStore::default());
        let mut controller =
            TaskListController::new(store.clone(), RecordingPresenter::default());
        controller.set_text("buy milk");

        assert_eq!(controller.save().await, Err(TaskListError::MissingSession));
        assert_eq!(controller.load_all().await, Err(TaskListError::MissingSession));
        let confirmation = DeleteConfirmation {
            task_id: "a".to_string(),
        };
        assert_eq!(
            controller.confirm_delete(confirmation).await,
            Err(TaskListError::MissingSession)
        );
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn initialize_loads_tasks_in_store_order() {
        let (_, controller) =
            ready_controller(&[task("a", "buy milk"), task("b", "walk dog")]).await;

        assert_eq!(
            controller.tasks(),
            &[task("a", "buy milk"), task("b", "walk dog")]
        );
        assert!(!controller.is_loading());
        assert_eq!(controller.title(), "Welcome: me@example.com");
    }

    #[tokio::test]
    async fn loading_flag_is_raised_once_and_cleared_per_load() {
        let (_, controller) = ready_controller(&[task("a", "buy milk")]).await;
        let renders = controller.presenter().renders();

        assert_eq!(renders.iter().filter(|v| v.loading).count(), 1);
        assert!(renders.first().is_some_and(|v| v.loading));
        assert!(renders.last().is_some_and(|v| !v.loading && v.tasks.len() == 1));
    }

    #[tokio::test]
    async fn load_failure_is_silent_and_leaves_list_empty() {
        let store = seeded_store(&[task("a", "buy milk")]).await;
        store.fail_reads.store(true, Ordering::SeqCst);
        let mut controller =
            TaskListController::new(store.clone(), RecordingPresenter::default());

        controller.initialize(Session::new("u1", "")).await.unwrap();

        assert!(controller.tasks().is_empty());
        assert!(!controller.is_loading());
        assert!(controller.presenter().alerts().is_empty());
        let renders = controller.presenter().renders();
        assert_eq!(renders.iter().filter(|v| v.loading).count(), 1);
        assert!(renders.first().is_some_and(|v| v.loading));
        assert!(renders.last().is_some_and(|v| !v.loading && v.tasks.is_empty()));
        assert_eq!(controller.title(), DEFAULT_TITLE);

        // A later successful reload picks the data up again.
        store.fail_reads.store(false, Ordering::SeqCst);
        controller.load_all().await.unwrap();
        assert_eq!(controller.tasks().len(), 1);
    }

    #[tokio::test]
    async fn save_with_empty_text_is_a_no_op() {
        let (store, mut controller) = ready_controller(&[task("a", "buy milk")]).await;
        controller.begin_edit(&task("a", "buy milk"));
        controller.set_text("");
        let calls_before = store.calls();

        let outcome = controller.save().await.unwrap();

        assert_eq!(outcome, SaveOutcome::Skipped);
        assert_eq!(store.calls(), calls_before);
        assert_eq!(controller.tasks(), &[task("a", "buy milk")]);
        assert_eq!(controller.edit_selection(), Some("a"));
    }

    #[tokio::test]
    async fn save_without_selection_appends_new_task() {
        let (store, mut controller) = ready_controller(&[task("a", "buy milk")]).await;
        controller.set_text("buy milk");

        let outcome = controller.save().await.unwrap();

        let SaveOutcome::Created(created) = outcome else {
            panic!("expected a created task, got {outcome:?}");
        };
        assert_eq!(created.description, "buy milk");
        assert_ne!(created.id, "a");
        assert_eq!(controller.tasks().len(), 2);
        assert_eq!(controller.tasks()[0], task("a", "buy milk"));
        assert_eq!(controller.tasks()[1], created);
        assert_eq!(
            store.inner.get(&task_path("u1", &created.id)),
            Some(created.record())
        );
        assert_eq!(controller.current_text(), "");
        assert_eq!(controller.edit_selection(), None);
        assert_eq!(controller.presenter().events().last(), Some(&UiEvent::Dismiss));
    }

    #[tokio::test]
    async fn created_tasks_survive_a_reload_in_creation_order() {
        let (_, mut controller) = ready_controller(&[]).await;
        for text in ["one", "two", "three"] {
            controller.set_text(text);
            controller.save().await.unwrap();
        }
        let before: Vec<Task> = controller.tasks().to_vec();

        controller.load_all().await.unwrap();

        assert_eq!(controller.tasks(), before.as_slice());
    }

    #[tokio::test]
    async fn save_with_selection_updates_in_place() {
        let (store, mut controller) =
            ready_controller(&[task("a", "buy milk"), task("b", "walk dog")]).await;
        controller.begin_edit(&task("a", "buy milk"));
        assert_eq!(controller.current_text(), "buy milk");
        controller.set_text("buy bread");

        let outcome = controller.save().await.unwrap();

        assert_eq!(outcome, SaveOutcome::Updated(task("a", "buy bread")));
        assert_eq!(
            controller.tasks(),
            &[task("a", "buy bread"), task("b", "walk dog")]
        );
        assert_eq!(
            store.inner.get(&task_path("u1", "a")),
            Some(task("a", "buy bread").record())
        );
        assert_eq!(controller.edit_selection(), None);
        assert!(!controller.view().editing);
    }

    #[tokio::test]
    async fn failed_create_alerts_and_resets_form() {
        let (store, mut controller) = ready_controller(&[task("a", "buy milk")]).await;
        store.fail_writes.store(true, Ordering::SeqCst);
        controller.set_text("new thing");

        let outcome = controller.save().await.unwrap();

        assert!(matches!(outcome, SaveOutcome::Failed(StoreError::Network(_))));
        assert_eq!(controller.tasks(), &[task("a", "buy milk")]);
        assert_eq!(
            controller.presenter().alerts(),
            vec!["Failed to save task: network error: connection reset".to_string()]
        );
        assert_eq!(controller.current_text(), "");
        assert_eq!(controller.edit_selection(), None);
    }

    #[tokio::test]
    async fn failed_update_keeps_list_and_clears_selection() {
        let (store, mut controller) = ready_controller(&[task("a", "buy milk")]).await;
        controller.begin_edit(&task("a", "buy milk"));
        controller.set_text("buy bread");
        store.fail_writes.store(true, Ordering::SeqCst);

        let outcome = controller.save().await.unwrap();

        assert!(matches!(outcome, SaveOutcome::Failed(_)));
        assert_eq!(controller.tasks(), &[task("a", "buy milk")]);
        assert_eq!(controller.presenter().alerts().len(), 1);
        assert_eq!(controller.edit_selection(), None);
    }

    #[tokio::test]
    async fn begin_edit_overwrites_previous_selection() {
        let (_, mut controller) =
            ready_controller(&[task("a", "buy milk"), task("b", "walk dog")]).await;

        controller.begin_edit(&task("a", "buy milk"));
        controller.begin_edit(&task("b", "walk dog"));

        assert_eq!(controller.edit_selection(), Some("b"));
        assert_eq!(controller.current_text(), "walk dog");
        assert!(controller.view().editing);
        assert_eq!(
            controller
                .presenter()
                .events()
                .iter()
                .filter(|e| **e == UiEvent::Focus)
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn cancel_edit_clears_form_without_store_calls() {
        let (store, mut controller) = ready_controller(&[task("a", "buy milk")]).await;
        controller.begin_edit(&task("a", "buy milk"));
        let calls_before = store.calls();

        controller.cancel_edit();

        assert_eq!(controller.current_text(), "");
        assert_eq!(controller.edit_selection(), None);
        assert_eq!(store.calls(), calls_before);
        assert_eq!(controller.presenter().events().last(), Some(&UiEvent::Dismiss));
    }

    #[tokio::test]
    async fn confirmed_delete_removes_only_that_task() {
        let (store, mut controller) = ready_controller(&[
            task("a", "one"),
            task("b", "two"),
            task("c", "three"),
        ])
        .await;

        let confirmation = controller.request_delete("b").unwrap();
        assert_eq!(confirmation.task_id(), "b");
        assert_eq!(confirmation.message(), DELETE_PROMPT_MESSAGE);
        let outcome = controller.confirm_delete(confirmation).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted("b".to_string()));
        assert_eq!(controller.tasks(), &[task("a", "one"), task("c", "three")]);
        assert_eq!(store.inner.get(&task_path("u1", "b")), None);
    }

    #[tokio::test]
    async fn cancelled_delete_changes_nothing() {
        let (store, controller) = ready_controller(&[task("a", "one")]).await;
        let calls_before = store.calls();

        let confirmation = controller.request_delete("a").unwrap();
        controller.cancel_delete(confirmation);

        assert_eq!(controller.tasks(), &[task("a", "one")]);
        assert_eq!(store.calls(), calls_before);
        assert!(store.inner.get(&task_path("u1", "a")).is_some());
    }

    #[tokio::test]
    async fn failed_delete_alerts_and_keeps_list() {
        let (store, mut controller) =
            ready_controller(&[task("a", "one"), task("b", "two")]).await;
        store.fail_writes.store(true, Ordering::SeqCst);

        let confirmation = controller.request_delete("a").unwrap();
        let outcome = controller.confirm_delete(confirmation).await.unwrap();

        assert!(matches!(outcome, DeleteOutcome::Failed(_)));
        assert_eq!(controller.tasks(), &[task("a", "one"), task("b", "two")]);
        assert_eq!(
            controller.presenter().alerts(),
            vec!["Failed to delete task: network error: connection reset".to_string()]
        );
    }

    #[tokio::test]
    async fn deleting_the_task_under_edit_leaves_create_mode() {
        let (_, mut controller) = ready_controller(&[task("a", "one"), task("b", "two")]).await;
        controller.begin_edit(&task("a", "one"));

        let confirmation = controller.request_delete("a").unwrap();
        controller.confirm_delete(confirmation).await.unwrap();

        assert_eq!(controller.edit_selection(), None);
        assert_eq!(controller.current_text(), "");
    }

    #[tokio::test]
    async fn delete_request_for_unknown_or_empty_id_is_refused() {
        let (store, controller) = ready_controller(&[task("a", "one"), task("b", "two")]).await;

        assert_eq!(controller.request_delete(""), None);
        assert_eq!(controller.request_delete("ghost"), None);
        assert_eq!(store.inner.count(&tasks_path("u1")), 2);
    }

    #[tokio::test]
    async fn empty_id_delete_never_reaches_the_collection() {
        let (store, mut controller) =
            ready_controller(&[task("a", "one"), task("b", "two")]).await;
        let confirmation = DeleteConfirmation {
            task_id: String::new(),
        };

        let outcome = controller.confirm_delete(confirmation).await.unwrap();

        assert!(matches!(outcome, DeleteOutcome::Failed(StoreError::InvalidPath(_))));
        assert_eq!(store.inner.count(&tasks_path("u1")), 2);
        assert_eq!(controller.tasks().len(), 2);
    }

    #[tokio::test]
    async fn begin_edit_ignores_tasks_not_in_the_list() {
        let (store, mut controller) =
            ready_controller(&[task("a", "one"), task("b", "two")]).await;

        controller.begin_edit(&task("ghost", "boo"));
        assert_eq!(controller.edit_selection(), None);
        assert_eq!(controller.current_text(), "");

        controller.set_text("boo");
        let outcome = controller.save().await.unwrap();

        let SaveOutcome::Created(created) = outcome else {
            panic!("expected a create, got {outcome:?}");
        };
        assert_ne!(created.id, "ghost");
        assert_eq!(store.inner.get(&task_path("u1", "ghost")), None);
        assert_eq!(store.inner.count(&tasks_path("u1")), 3);
        assert_eq!(controller.tasks().len(), 3);
    }

    #[tokio::test]
    async fn reload_drops_selection_of_a_vanished_task() {
        let (store, mut controller) =
            ready_controller(&[task("a", "one"), task("b", "two")]).await;
        controller.begin_edit(&task("a", "one"));
        store.inner.remove(&task_path("u1", "a")).await.unwrap();

        controller.load_all().await.unwrap();

        assert_eq!(controller.tasks(), &[task("b", "two")]);
        assert_eq!(controller.edit_selection(), None);
        assert_eq!(controller.current_text(), "");
        assert!(!controller.view().editing);
    }

    #[tokio::test]
    async fn reload_keeps_selection_of_a_surviving_task() {
        let (_, mut controller) = ready_controller(&[task("a", "one")]).await;
        controller.begin_edit(&task("a", "one"));
        controller.set_text("one!");

        controller.load_all().await.unwrap();

        assert_eq!(controller.edit_selection(), Some("a"));
        assert_eq!(controller.current_text(), "one!");
    }

    #[test]
    fn with_description_touches_only_the_matching_task() {
        let tasks = vec![task("a", "one"), task("b", "two")];
        let next = with_description(&tasks, "b", "TWO");
        assert_eq!(next, vec![task("a", "one"), task("b", "TWO")]);
        assert_eq!(tasks[1].description, "two");

        let unchanged = with_description(&tasks, "missing", "x");
        assert_eq!(unchanged, tasks);
    }
}
