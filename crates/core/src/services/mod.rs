//! Business logic services.

pub mod account;
pub mod comment;
pub mod guard;
pub mod like;
pub mod mailer;
pub mod notification;
pub mod post;
pub mod stats;
pub mod taxonomy;
pub mod token;

pub use account::{AccountService, ResetConfirmInput, SignupInput};
pub use comment::{CommentNode, CommentService, CreateCommentInput};
pub use like::LikeService;
pub use mailer::MailerService;
pub use notification::{NotificationService, NotifyInput, UpdatePreferencesInput};
pub use post::{CreatePostInput, PostDetail, PostService, UpdatePostInput};
pub use stats::{MostViewedPost, StatsOverview, StatsService};
pub use taxonomy::TaxonomyService;
pub use token::{Claims, TokenPair, TokenService};
