pub mod auth;
pub mod backend;
pub mod config;
pub mod controller;
pub mod errors;
pub mod logging;
pub mod login;
pub mod models;
pub mod paths;
pub mod presenter;
pub mod push_id;
#[cfg(feature = "app")]
pub mod rest;
pub mod store;

pub use backend::{Backend, BackendCell};
pub use controller::{DeleteConfirmation, DeleteOutcome, SaveOutcome, TaskListController};
pub use login::{LoginController, LoginMode, LoginOutcome};
pub use models::{Session, Task, TaskListView};
