pub mod manager;
pub mod observers;
pub mod replies;
pub mod scheduler;

pub use manager::ChatManager;
