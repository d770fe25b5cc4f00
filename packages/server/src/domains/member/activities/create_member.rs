//! Create member activity - turns a submitted registration form into an account

use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::common::MemberId;
use crate::config::{EmailCheckFailurePolicy, PrivacyPolicyMode, RegistrationSettings};
use crate::domains::member::activities::security_questions::record_security_questions;
use crate::domains::member::errors::RegistrationError;
use crate::domains::member::models::profile_field::attachment_upload_key;
use crate::domains::member::models::{
    HistoryEntry, Member, MemberBitOptions, MemberFlag, PendingPost, ProfileField,
    ProfileFieldType,
};
use crate::domains::member::values::{
    profile_field_id, ProfileFieldValues, RegistrationValues, RequestContext, ADMIN_MAILS,
    EMAIL_ADDRESS, PASSWORD, USERNAME,
};
use crate::kernel::{auto_detect_language, hash_password, EmailVerdict, ServerDeps};

/// Create a member from a registration form.
///
/// Steps, in order:
/// 1. Require an email address and screen it for disposable providers
/// 2. Resolve submitted profile fields
/// 3. Reserve the member identity so extensions can reference its id
/// 4. Run profile steps (only while registration is enabled)
/// 5. Store security answers or the opt-out
/// 6. Claim editor attachments and upsert profile field values
/// 7. Log consent, finalize the member, run the post-registration hook
///
/// Validation failures return before anything is written. Later failures
/// leave already-persisted rows in place.
pub async fn create_member(
    mut values: RegistrationValues,
    profile_fields: ProfileFieldValues,
    pending_post: Option<PendingPost>,
    request: &RequestContext,
    deps: &ServerDeps,
) -> Result<Member, RegistrationError> {
    let email = values
        .get_trimmed(EMAIL_ADDRESS)
        .map(str::to_string)
        .ok_or(RegistrationError::EmailRequired)?;

    screen_email(&email, deps).await?;

    let fields = resolve_profile_fields(&profile_fields, deps).await?;

    let draft = build_member(&values, email, request, &deps.settings)?;
    let mut member = deps.store.reserve_identity(&draft).await?;
    info!(member_id = %member.id, name = %member.name, "Member identity reserved");

    if deps.settings.registration_mode.is_enabled() {
        for step in deps.profile_steps.iter() {
            debug!(member_id = %member.id, step = step.key(), "Running profile step");
            step.augment_registration(&mut values, &mut member)
                .await
                .with_context(|| format!("Profile step '{}' failed", step.key()))?;
        }
    }

    if deps.settings.security_questions_at_registration() {
        record_security_questions(&values, &mut member, deps).await?;
    }

    claim_editor_attachments(&fields, &member, request, deps).await?;

    if !fields.is_empty() {
        let rows: Vec<(i32, String)> = fields
            .iter()
            .map(|(field, value)| (field.id, value.clone()))
            .collect();
        deps.store.upsert_profile_values(member.id, &rows).await?;
        debug!(member_id = %member.id, count = rows.len(), "Profile field values saved");
    }

    log_consent(&member, deps).await?;

    deps.store.finalize(&member).await?;

    deps.post_registration
        .after_registration(&mut member, pending_post.as_ref(), request.referrer.as_deref())
        .await?;

    info!(member_id = %member.id, "Member registered successfully");
    Ok(member)
}

async fn screen_email(email: &str, deps: &ServerDeps) -> Result<(), RegistrationError> {
    match deps.email_verifier.verify(email).await {
        EmailVerdict::Deliverable => Ok(()),
        EmailVerdict::Disposable => {
            info!("Rejected registration with disposable email address");
            Err(RegistrationError::DisposableEmail)
        }
        EmailVerdict::Unknown => match deps.settings.email_check_failure_policy {
            EmailCheckFailurePolicy::FailOpen => {
                warn!("Disposable email check unavailable, accepting address");
                Ok(())
            }
            EmailCheckFailurePolicy::FailClosed => {
                warn!("Disposable email check unavailable, rejecting registration");
                Err(RegistrationError::EmailCheckUnavailable)
            }
        },
    }
}

async fn resolve_profile_fields(
    submitted: &ProfileFieldValues,
    deps: &ServerDeps,
) -> Result<Vec<(ProfileField, String)>, RegistrationError> {
    let mut resolved = Vec::with_capacity(submitted.len());

    for (key, value) in submitted.iter() {
        let id = profile_field_id(key)
            .ok_or_else(|| RegistrationError::UnknownProfileField(key.to_string()))?;

        let field = deps
            .store
            .find_profile_field(id)
            .await?
            .ok_or_else(|| RegistrationError::UnknownProfileField(key.to_string()))?;

        resolved.push((field, value.to_string()));
    }

    Ok(resolved)
}

fn build_member(
    values: &RegistrationValues,
    email: String,
    request: &RequestContext,
    settings: &RegistrationSettings,
) -> Result<Member, RegistrationError> {
    let password_hash = match values.get(PASSWORD).filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password).context("Failed to hash password")?),
        None => None,
    };

    let mut bit_options = MemberBitOptions::default();
    bit_options.set(MemberFlag::ViewSigs, true);

    let now = Utc::now();

    Ok(Member {
        id: MemberId::new(),
        name: values.get_trimmed(USERNAME).unwrap_or_default().to_string(),
        email,
        password_hash,
        member_group_id: settings.default_member_group,
        bit_options,
        allow_admin_mails: values.is_checked(ADMIN_MAILS),
        language: pick_language(request, settings),
        timezone: None,
        last_visit: now,
        joined_at: now,
    })
}

fn pick_language(request: &RequestContext, settings: &RegistrationSettings) -> Option<String> {
    if let Some(cookie) = request
        .language_cookie
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        return Some(cookie.to_string());
    }

    request
        .accept_language
        .as_deref()
        .and_then(|header| auto_detect_language(header, &settings.installed_languages))
}

async fn claim_editor_attachments(
    fields: &[(ProfileField, String)],
    member: &Member,
    request: &RequestContext,
    deps: &ServerDeps,
) -> Result<(), RegistrationError> {
    let editors = fields
        .iter()
        .filter(|(field, _)| field.kind() == ProfileFieldType::Editor);

    for (field, _) in editors {
        let Some(session) = request.upload_session.as_deref() else {
            debug!(member_id = %member.id, field_id = field.id, "No upload session, nothing to claim");
            continue;
        };

        let key = attachment_upload_key(field.id, session);
        let claimed = deps.store.claim_attachments(&key, member.id).await?;
        debug!(member_id = %member.id, field_id = field.id, claimed, "Claimed editor attachments");
    }

    Ok(())
}

async fn log_consent(member: &Member, deps: &ServerDeps) -> Result<(), RegistrationError> {
    deps.history
        .log(HistoryEntry::core(
            member.id,
            "admin_mails",
            json!({ "enabled": member.allow_admin_mails }),
        ))
        .await?;

    if deps.settings.privacy_policy_mode != PrivacyPolicyMode::None {
        deps.history
            .log(HistoryEntry::core(
                member.id,
                "terms_acceptance",
                json!({ "type": "privacy" }),
            ))
            .await?;
    }

    deps.history
        .log(HistoryEntry::core(
            member.id,
            "terms_acceptance",
            json!({ "type": "terms" }),
        ))
        .await?;

    Ok(())
}
