//! Business logic services.

pub mod event_publisher;
pub mod following;
pub mod interaction;
pub mod messaging;
pub mod post;
pub mod presence;
pub mod user;

pub use event_publisher::{EventPublisher, EventPublisherService, NoOpEventPublisher};
pub use following::FollowingService;
pub use interaction::InteractionService;
pub use messaging::{ConversationSummary, MessagingService};
pub use post::PostService;
pub use presence::{ChannelId, ConnectionId, PresenceRouter, StreamEvent};
pub use user::UserService;
