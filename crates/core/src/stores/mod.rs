pub mod firestore;
pub mod local;

pub use firestore::FirestoreStore;
pub use local::LocalStore;
