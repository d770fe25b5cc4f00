//! Typed ID definitions for registration entities.
//!
//! ```rust
//! use registration_core::common::{MemberId, PendingPostId};
//!
//! let member_id = MemberId::new();
//! let post_id = PendingPostId::new();
//! // let wrong: PendingPostId = member_id; // does not compile
//! ```

pub use super::id::{Id, V7};

/// Marker type for Member entities.
pub struct Member;

/// Marker type for posts written by guests before they registered.
pub struct PendingPost;

/// Typed ID for Member entities.
pub type MemberId = Id<Member>;

/// Typed ID for pending guest posts.
pub type PendingPostId = Id<PendingPost>;
