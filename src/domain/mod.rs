pub mod entry;
pub mod message;
pub mod state;

pub use entry::{FeedDocument, FeedEntry};
pub use message::{NotificationMessage, NO_DESCRIPTION};
pub use state::DeliveryState;
