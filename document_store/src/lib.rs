pub mod mock;
pub mod models;
pub mod ops;
pub mod store_error;

pub use models::{RecordData, RecordRef};
pub use ops::{DocumentStoreOps, WriteBatchOps};
pub use store_error::StoreError;
