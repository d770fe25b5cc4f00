//! Security question answers submitted with the registration form

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use tracing::{info, warn};

use crate::domains::member::models::{HistoryEntry, Member, MemberFlag, SecurityAnswer};
use crate::domains::member::values::{
    RegistrationValues, SECURITY_QUESTIONS_OPT_OUT, SECURITY_QUESTIONS_OPT_OUT_TITLE,
};
use crate::kernel::ServerDeps;

lazy_static! {
    static ref QUESTION_KEY: Regex =
        Regex::new(r"^security_question_q_(\d+)$").expect("valid question key regex");
}

/// Store answers (or the opt-out) and log the MFA change.
///
/// Returns how many answer rows were written.
pub async fn record_security_questions(
    values: &RegistrationValues,
    member: &mut Member,
    deps: &ServerDeps,
) -> Result<usize> {
    if values.contains(SECURITY_QUESTIONS_OPT_OUT) || values.contains(SECURITY_QUESTIONS_OPT_OUT_TITLE) {
        member
            .bit_options
            .set(MemberFlag::SecurityQuestionsOptOut, true);

        deps.history
            .log(HistoryEntry::core(
                member.id,
                "mfa",
                json!({ "handler": "questions", "enable": false, "optout": true }),
            ))
            .await?;

        info!(member_id = %member.id, "Member opted out of security questions");
        return Ok(0);
    }

    // Keyed by question id so a question answered twice keeps the last answer
    let mut answers: BTreeMap<i32, SecurityAnswer> = BTreeMap::new();

    for (key, question) in values.iter() {
        let Some(slot) = QUESTION_KEY.captures(key).map(|c| c[1].to_string()) else {
            continue;
        };

        let Ok(question_id) = question.trim().parse::<i32>() else {
            warn!(member_id = %member.id, key = %key, "Skipping non-numeric security question id");
            continue;
        };

        let Some(answer) = values.get_trimmed(&format!("security_question_a_{}", slot)) else {
            warn!(member_id = %member.id, question_id, "Skipping security question without answer");
            continue;
        };

        let ciphertext = deps
            .encryptor
            .encrypt(answer)
            .context("Failed to encrypt security answer")?;

        answers.insert(
            question_id,
            SecurityAnswer {
                question_id,
                member_id: member.id,
                answer: ciphertext,
            },
        );
    }

    if answers.is_empty() {
        return Ok(0);
    }

    let rows: Vec<SecurityAnswer> = answers.into_values().collect();
    deps.store.insert_security_answers(&rows).await?;

    member.bit_options.set(MemberFlag::HasSecurityAnswers, true);

    deps.history
        .log(HistoryEntry::core(
            member.id,
            "mfa",
            json!({ "handler": "questions", "enable": true }),
        ))
        .await?;

    info!(member_id = %member.id, count = rows.len(), "Security answers stored");
    Ok(rows.len())
}
