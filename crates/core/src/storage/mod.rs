pub mod model;
pub mod model_store;
pub mod object_store;

pub use model::StoredModel;
pub use model_store::{ModelStore, RemoteLoad};
pub use object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
