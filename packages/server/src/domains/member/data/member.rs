use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::member::models::{Member as MemberModel, MemberFlag};

/// Member API data type
///
/// Public representation of a member returned by the registration endpoint.
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberData {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    pub email: String,

    /// Group assigned at registration
    pub member_group_id: i32,

    /// Preferred locale, if one was picked
    pub language: Option<String>,

    pub timezone: Option<String>,

    /// Account still needs email or admin validation
    pub validating: bool,

    /// When the member registered
    pub joined_at: DateTime<Utc>,
}

impl From<MemberModel> for MemberData {
    fn from(member: MemberModel) -> Self {
        Self {
            id: member.id.to_string(),
            validating: member.bit_options.contains(MemberFlag::Validating),
            name: member.name,
            email: member.email,
            member_group_id: member.member_group_id,
            language: member.language,
            timezone: member.timezone,
            joined_at: member.joined_at,
        }
    }
}
