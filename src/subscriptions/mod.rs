//! Topic subscriptions.
//!
//! A [`SubscriptionManager`] owns one upstream link and one [`TopicHandler`].
//! The handler owns its store scopes and turns each frame into an optional
//! value for the downstream [`ContentStream`].
//!
//! Streams carry:
//! - `Connected` once upstream accepts the topic
//! - `ContentUpdate` for each built value
//! - `Disconnected` when upstream closes the topic (terminal)
//! - `Err` on transport failure (terminal)
//!
//! # Example
//!
//! ```ignore
//! let manager = SubscriptionManager::new(SportsHandler::new(&router, SportsScope::All), transport);
//! let stream = manager.subscribe();
//!
//! loop {
//!     match stream.recv() {
//!         Ok(Ok(SubscribableContent::ContentUpdate(sports))) => println!("{} sports", sports.len()),
//!         Ok(Ok(SubscribableContent::Disconnected)) | Ok(Err(_)) | Err(_) => break,
//!         Ok(Ok(_)) => {}
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::{SubscriptionManager, TopicHandler};
pub use types::{ContentItem, ContentStream, ManagerState, SubscribableContent};
