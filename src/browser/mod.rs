//! The admin record browser: one parameterized component that lists,
//! searches, moderates and exports the records of a configured collection.

pub mod catalog;
pub mod controller;
pub mod entity;
pub mod export;
pub mod notify;
pub mod present;
pub mod store;
pub mod view;

pub use catalog::Catalog;
pub use controller::{MutationError, QueryController, QueryOutcome, StatusChange};
pub use entity::{ActionOrigin, ActionPolicy, EntityConfig, ExportSource, FailurePolicy};
pub use notify::Notification;
pub use store::RecordStore;
pub use view::{BrowserView, ViewRegistry};
