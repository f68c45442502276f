//! Database entities.

pub mod category;
pub mod comment;
pub mod like;
pub mod notification;
pub mod notification_preference;
pub mod password_reset;
pub mod post;
pub mod post_tag;
pub mod tag;
pub mod user;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use like::Entity as Like;
pub use notification::Entity as Notification;
pub use notification_preference::Entity as NotificationPreference;
pub use password_reset::Entity as PasswordReset;
pub use post::Entity as Post;
pub use post_tag::Entity as PostTag;
pub use tag::Entity as Tag;
pub use user::Entity as User;
