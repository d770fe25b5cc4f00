pub mod history;
pub mod member;
pub mod pending_post;
pub mod profile_field;
pub mod security_answer;
pub mod validation;

pub use history::HistoryEntry;
pub use member::{Member, MemberBitOptions, MemberFlag};
pub use pending_post::PendingPost;
pub use profile_field::{ProfileField, ProfileFieldType};
pub use security_answer::SecurityAnswer;
pub use validation::MemberValidation;
