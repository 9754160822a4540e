//!  Storage is organized through [local_store::LocalStore].
//!  The basic idea is:
//!   - Every entity class lives under a single key, like a browser's local storage.
//!   - Tasks and month records are JSON, the user id and the title are raw strings.
//!   - A month is the unit of persistence: touching one day rewrites the whole month.

pub mod entities;
pub mod local_store;

pub const USER_ID_KEY: &str = "userId";
pub const TASKS_KEY: &str = "userTasks";
pub const TITLE_KEY: &str = "appTitle";
