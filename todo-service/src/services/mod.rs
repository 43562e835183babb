pub mod database;
pub mod error;
pub mod metrics;
pub mod mock;
pub mod store;

pub use database::MongoDb;
pub use error::StoreError;
pub use metrics::{get_metrics, init_metrics, record_operation};
pub use mock::MockTodoStore;
pub use store::{MongoTodoStore, TodoStore, UnavailableStore};
