//! Database entities.

pub mod comment;
pub mod following;
pub mod like;
pub mod message;
pub mod post;
pub mod user;

pub use comment::Entity as Comment;
pub use following::Entity as Following;
pub use like::Entity as Like;
pub use message::Entity as Message;
pub use post::Entity as Post;
pub use user::Entity as User;
