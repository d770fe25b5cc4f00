use anyhow::Result;
use sqlx::PgPool;

use crate::common::MemberId;

/// Input types a custom profile field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFieldType {
    Text,
    TextArea,
    /// Rich text; may carry uploaded attachments.
    Editor,
    Url,
    Select,
    Other,
}

impl ProfileFieldType {
    fn from_column(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "textarea" => Self::TextArea,
            "editor" => Self::Editor,
            "url" => Self::Url,
            "select" => Self::Select,
            _ => Self::Other,
        }
    }
}

/// Custom profile field definition
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ProfileField {
    pub id: i32,
    pub name: String,
    pub field_type: String,
}

impl ProfileField {
    pub fn kind(&self) -> ProfileFieldType {
        ProfileFieldType::from_column(&self.field_type)
    }

    pub async fn find_by_id(id: i32, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT id, name, field_type FROM profile_fields WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Hand attachments uploaded under `upload_key` over to the member.
    pub async fn claim_attachments(
        upload_key: &str,
        member_id: MemberId,
        pool: &PgPool,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE attachments
             SET member_id = $1, upload_key = NULL
             WHERE upload_key = $2 AND member_id IS NULL",
        )
        .bind(member_id)
        .bind(upload_key)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Upsert every value for one member in a single statement
    pub async fn upsert_values(
        member_id: MemberId,
        values: &[(i32, String)],
        pool: &PgPool,
    ) -> Result<u64> {
        if values.is_empty() {
            return Ok(0);
        }

        let field_ids: Vec<i32> = values.iter().map(|(id, _)| *id).collect();
        let contents: Vec<String> = values.iter().map(|(_, v)| v.clone()).collect();

        let result = sqlx::query(
            "INSERT INTO profile_field_values (member_id, field_id, value)
             SELECT $1, t.field_id, t.value FROM UNNEST($2::int4[], $3::text[]) AS t(field_id, value)
             ON CONFLICT (member_id, field_id) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(member_id)
        .bind(field_ids)
        .bind(contents)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Key that editor uploads for `field_id` were filed under during `session`.
pub fn attachment_upload_key(field_id: i32, session: &str) -> String {
    format!("{:x}", md5::compute(format!("profile-field-{}-{}", field_id, session)))
}
