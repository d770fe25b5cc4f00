use anyhow::Result;
use sqlx::PgPool;

use crate::common::MemberId;

/// Encrypted answer to one security question.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct SecurityAnswer {
    pub question_id: i32,
    pub member_id: MemberId,
    /// Ciphertext tag produced by the answer encryptor, never plaintext.
    pub answer: String,
}

impl SecurityAnswer {
    /// Insert all answers in a single statement
    pub async fn insert_batch(answers: &[SecurityAnswer], pool: &PgPool) -> Result<u64> {
        if answers.is_empty() {
            return Ok(0);
        }

        let question_ids: Vec<i32> = answers.iter().map(|a| a.question_id).collect();
        let member_ids: Vec<uuid::Uuid> = answers.iter().map(|a| a.member_id.into_uuid()).collect();
        let ciphertexts: Vec<String> = answers.iter().map(|a| a.answer.clone()).collect();

        let result = sqlx::query(
            "INSERT INTO security_answers (question_id, member_id, answer)
             SELECT * FROM UNNEST($1::int4[], $2::uuid[], $3::text[])
             ON CONFLICT (question_id, member_id) DO UPDATE SET answer = EXCLUDED.answer",
        )
        .bind(question_ids)
        .bind(member_ids)
        .bind(ciphertexts)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_by_member(member_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT question_id, member_id, answer FROM security_answers
             WHERE member_id = $1 ORDER BY question_id",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
