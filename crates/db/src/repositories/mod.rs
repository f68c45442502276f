//! Database repositories.

pub mod category;
pub mod comment;
pub mod like;
pub mod notification;
pub mod notification_preference;
pub mod password_reset;
pub mod post;
pub mod tag;
pub mod user;

pub use category::CategoryRepository;
pub use comment::CommentRepository;
pub use like::LikeRepository;
pub use notification::NotificationRepository;
pub use notification_preference::NotificationPreferenceRepository;
pub use password_reset::PasswordResetRepository;
pub use post::{PostFilter, PostRepository};
pub use tag::TagRepository;
pub use user::UserRepository;
