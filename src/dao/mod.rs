/// Server-side entities.
pub mod models;
/// Room snapshot storage backends.
pub mod room_store;
/// Storage abstraction layer errors.
pub mod storage;
