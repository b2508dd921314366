use crate::models::TaskListView;

/// What the screen controllers need from whatever draws them.
pub trait Presenter {
    /// Leave the current screen and return to the first one.
    fn navigate_back(&self);
    /// Blocking message box with a title and body.
    fn alert(&self, title: &str, message: &str);
    fn focus_input(&self);
    fn dismiss_input(&self);
    fn render(&self, view: &TaskListView);
}
