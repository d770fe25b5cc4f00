//! Integration tests for the Postgres registration store.
//!
//! Runs every store query and the migration against a real database.

mod common;

use std::sync::Arc;

use crate::common::{form_with, PgHarness};
use registration_core::common::{MemberId, PendingPostId};
use registration_core::config::{RegistrationSettings, SecurityQuestionPrompt, ValidationMode};
use registration_core::domains::member::activities::ValidationPostRegistration;
use registration_core::domains::member::models::profile_field::attachment_upload_key;
use registration_core::domains::member::models::{
    HistoryEntry, Member, MemberFlag, MemberValidation, ProfileFieldType, SecurityAnswer,
};
use registration_core::domains::member::profile_steps::ProfileStepRegistry;
use registration_core::domains::member::{create_member, ProfileFieldValues, RequestContext};
use registration_core::kernel::test_dependencies::{sample_member, MockEmailVerifier};
use registration_core::kernel::{
    AesGcmEncryptor, BaseHistoryLog, BaseRegistrationStore, ServerDeps,
};
use serde_json::json;
use sqlx::PgPool;
use test_context::test_context;

const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Member with an email no other test uses
fn fresh_member() -> Member {
    let mut member = sample_member();
    member.email = format!("member-{}@example.org", member.id);
    member
}

async fn reserved_member(ctx: &PgHarness) -> Member {
    ctx.store
        .reserve_identity(&fresh_member())
        .await
        .expect("reserve member")
}

async fn create_profile_field(pool: &PgPool, name: &str, field_type: &str) -> i32 {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO profile_fields (name, field_type) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(field_type)
    .fetch_one(pool)
    .await
    .expect("create profile field")
}

async fn create_pending_post(pool: &PgPool, email: &str) -> PendingPostId {
    let id = PendingPostId::new();
    sqlx::query(
        "INSERT INTO posts_before_registering (id, email, content_class, content_id)
         VALUES ($1, $2, 'topic', 42)",
    )
    .bind(id)
    .bind(email)
    .execute(pool)
    .await
    .expect("create pending post");
    id
}

async fn create_attachment(pool: &PgPool, upload_key: &str, owner: Option<MemberId>) {
    sqlx::query("INSERT INTO attachments (location, upload_key, member_id) VALUES ($1, $2, $3)")
        .bind(format!("uploads/{}.png", MemberId::new()))
        .bind(upload_key)
        .bind(owner)
        .execute(pool)
        .await
        .expect("create attachment");
}

// =============================================================================
// Members
// =============================================================================

#[test_context(PgHarness)]
#[tokio::test]
async fn reserve_identity_returns_stored_row(ctx: &PgHarness) {
    let mut member = fresh_member();
    member.password_hash = Some("pbkdf2_sha256$100000$c2FsdA==$aGFzaA==".to_string());
    member.allow_admin_mails = true;
    member.language = Some("de-DE".to_string());
    member.bit_options.set(MemberFlag::ViewSigs, true);

    let stored = ctx.store.reserve_identity(&member).await.unwrap();

    assert_eq!(stored.id, member.id);
    assert_eq!(stored.email, member.email);
    assert_eq!(stored.password_hash, member.password_hash);
    assert_eq!(stored.member_group_id, 3);
    assert!(stored.allow_admin_mails);
    assert_eq!(stored.language.as_deref(), Some("de-DE"));
    assert_eq!(stored.bit_options, member.bit_options);

    let found = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(found.name, member.name);
    assert!(found.bit_options.contains(MemberFlag::ViewSigs));
}

#[test_context(PgHarness)]
#[tokio::test]
async fn reserving_the_same_id_twice_fails(ctx: &PgHarness) {
    let member = reserved_member(ctx).await;

    assert!(ctx.store.reserve_identity(&member).await.is_err());
}

#[test_context(PgHarness)]
#[tokio::test]
async fn finalize_writes_back_mutations(ctx: &PgHarness) {
    let mut member = reserved_member(ctx).await;

    member.timezone = Some("Europe/Berlin".to_string());
    member.bit_options.set(MemberFlag::HasSecurityAnswers, true);
    member.bit_options.set(MemberFlag::Validating, true);
    ctx.store.finalize(&member).await.unwrap();

    let found = Member::find_by_email(&member.email.to_uppercase(), &ctx.db_pool)
        .await
        .unwrap()
        .expect("member found by email");
    assert_eq!(found.id, member.id);
    assert_eq!(found.timezone.as_deref(), Some("Europe/Berlin"));
    assert!(found.bit_options.contains(MemberFlag::HasSecurityAnswers));
    assert!(found.bit_options.contains(MemberFlag::Validating));
    assert!(!found.bit_options.contains(MemberFlag::SecurityQuestionsOptOut));
}

#[test_context(PgHarness)]
#[tokio::test]
async fn unknown_email_finds_nothing(ctx: &PgHarness) {
    let found = Member::find_by_email("nobody-here@example.org", &ctx.db_pool)
        .await
        .unwrap();

    assert!(found.is_none());
}

// =============================================================================
// Security answers
// =============================================================================

#[test_context(PgHarness)]
#[tokio::test]
async fn security_answers_insert_in_one_batch_and_upsert(ctx: &PgHarness) {
    let member = reserved_member(ctx).await;
    let answer = |question_id, answer: &str| SecurityAnswer {
        question_id,
        member_id: member.id,
        answer: answer.to_string(),
    };

    ctx.store
        .insert_security_answers(&[answer(9, "cipher-b"), answer(4, "cipher-a")])
        .await
        .unwrap();
    ctx.store
        .insert_security_answers(&[answer(4, "cipher-c")])
        .await
        .unwrap();

    let stored = SecurityAnswer::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(stored, vec![answer(4, "cipher-c"), answer(9, "cipher-b")]);
}

// =============================================================================
// Profile fields and attachments
// =============================================================================

#[test_context(PgHarness)]
#[tokio::test]
async fn profile_fields_are_found_by_id(ctx: &PgHarness) {
    let id = create_profile_field(&ctx.db_pool, "Bio", "editor").await;

    let field = ctx.store.find_profile_field(id).await.unwrap().unwrap();
    assert_eq!(field.name, "Bio");
    assert_eq!(field.kind(), ProfileFieldType::Editor);

    assert!(ctx.store.find_profile_field(i32::MAX).await.unwrap().is_none());
}

#[test_context(PgHarness)]
#[tokio::test]
async fn profile_values_upsert_per_member_and_field(ctx: &PgHarness) {
    let member = reserved_member(ctx).await;
    let bio = create_profile_field(&ctx.db_pool, "Bio", "textarea").await;
    let site = create_profile_field(&ctx.db_pool, "Website", "url").await;

    ctx.store
        .upsert_profile_values(
            member.id,
            &[(bio, "first".to_string()), (site, "https://jane.dev".to_string())],
        )
        .await
        .unwrap();
    ctx.store
        .upsert_profile_values(member.id, &[(bio, "second".to_string())])
        .await
        .unwrap();

    let rows = sqlx::query_as::<_, (i32, String)>(
        "SELECT field_id, value FROM profile_field_values WHERE member_id = $1 ORDER BY field_id",
    )
    .bind(member.id)
    .fetch_all(&ctx.db_pool)
    .await
    .unwrap();

    assert_eq!(
        rows,
        vec![(bio, "second".to_string()), (site, "https://jane.dev".to_string())]
    );
}

#[test_context(PgHarness)]
#[tokio::test]
async fn claim_attachments_takes_only_unowned_uploads(ctx: &PgHarness) {
    let member = reserved_member(ctx).await;
    let someone_else = reserved_member(ctx).await;
    let key = attachment_upload_key(1, &format!("sess-{}", member.id));

    create_attachment(&ctx.db_pool, &key, None).await;
    create_attachment(&ctx.db_pool, &key, None).await;
    create_attachment(&ctx.db_pool, &key, Some(someone_else.id)).await;
    create_attachment(&ctx.db_pool, "unrelated-key", None).await;

    assert_eq!(ctx.store.claim_attachments(&key, member.id).await.unwrap(), 2);
    assert_eq!(ctx.store.claim_attachments(&key, member.id).await.unwrap(), 0);

    let owned: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attachments WHERE member_id = $1 AND upload_key IS NULL",
    )
    .bind(member.id)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(owned, 2);
}

// =============================================================================
// History, pending posts, validation
// =============================================================================

#[test_context(PgHarness)]
#[tokio::test]
async fn history_entries_keep_order_and_payload(ctx: &PgHarness) {
    let member = reserved_member(ctx).await;

    ctx.store
        .log(HistoryEntry::core(member.id, "admin_mails", json!({ "enabled": true })))
        .await
        .unwrap();
    ctx.store
        .log(HistoryEntry::core(member.id, "terms_acceptance", json!({ "type": "terms" })))
        .await
        .unwrap();

    let entries = HistoryEntry::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    let logged: Vec<(&str, &str, serde_json::Value)> = entries
        .iter()
        .map(|e| (e.app.as_str(), e.log_type.as_str(), e.data.clone()))
        .collect();

    assert_eq!(
        logged,
        vec![
            ("core", "admin_mails", json!({ "enabled": true })),
            ("core", "terms_acceptance", json!({ "type": "terms" })),
        ]
    );
}

#[test_context(PgHarness)]
#[tokio::test]
async fn pending_post_is_attached_only_once(ctx: &PgHarness) {
    let jane = reserved_member(ctx).await;
    let mallory = reserved_member(ctx).await;
    let post_id = create_pending_post(&ctx.db_pool, &jane.email).await;

    let post = ctx.store.find_pending_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.email, jane.email);
    assert_eq!(post.member_id, None);

    assert!(ctx.store.attach_pending_post(post_id, jane.id).await.unwrap());
    assert!(!ctx.store.attach_pending_post(post_id, mallory.id).await.unwrap());

    let post = ctx.store.find_pending_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.member_id, Some(jane.id));

    let missing = PendingPostId::new();
    assert!(ctx.store.find_pending_post(missing).await.unwrap().is_none());
    assert!(!ctx.store.attach_pending_post(missing, jane.id).await.unwrap());
}

#[test_context(PgHarness)]
#[tokio::test]
async fn validations_are_stored(ctx: &PgHarness) {
    let member = reserved_member(ctx).await;
    let validation = MemberValidation::new(member.id, "user_admin").unwrap();

    ctx.store.insert_validation(&validation).await.unwrap();

    let stored = sqlx::query_as::<_, MemberValidation>(
        "SELECT token, member_id, kind, created_at FROM member_validating WHERE member_id = $1",
    )
    .bind(member.id)
    .fetch_one(&ctx.db_pool)
    .await
    .unwrap();
    assert_eq!(stored.token, validation.token);
    assert_eq!(stored.kind, "user_admin");
}

// =============================================================================
// Full registration
// =============================================================================

#[test_context(PgHarness)]
#[tokio::test]
async fn create_member_persists_everything(ctx: &PgHarness) {
    let encryptor = Arc::new(AesGcmEncryptor::from_hex(KEY).unwrap());
    let settings = RegistrationSettings {
        security_questions_enabled: true,
        security_questions_prompt: SecurityQuestionPrompt::Register,
        ..RegistrationSettings::default()
    };
    let deps = ServerDeps::new(
        ctx.store.clone(),
        ctx.store.clone(),
        Arc::new(MockEmailVerifier::new()),
        encryptor.clone(),
        ProfileStepRegistry::builtin(),
        Arc::new(ValidationPostRegistration::new(
            ctx.store.clone(),
            ValidationMode::User,
        )),
        settings,
    );

    let email = format!("jane-{}@example.org", MemberId::new());
    let field_id = create_profile_field(&ctx.db_pool, "Bio", "editor").await;
    let session = format!("sess-{}", MemberId::new());
    create_attachment(&ctx.db_pool, &attachment_upload_key(field_id, &session), None).await;
    let post_id = create_pending_post(&ctx.db_pool, &email).await;
    let post = ctx.store.find_pending_post(post_id).await.unwrap();

    let fields: ProfileFieldValues = [(format!("field_{}", field_id), "<p>Hi</p>".to_string())]
        .into_iter()
        .collect();
    let request = RequestContext {
        upload_session: Some(session),
        ..Default::default()
    };

    let member = create_member(
        form_with(&[
            ("email_address", email.as_str()),
            ("timezone", "Europe/Berlin"),
            ("security_question_q_1", "4"),
            ("security_question_a_1", "Rex"),
        ]),
        fields,
        post,
        &request,
        &deps,
    )
    .await
    .unwrap();

    let stored = Member::find_by_id(member.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.email, email);
    assert_eq!(stored.timezone.as_deref(), Some("Europe/Berlin"));
    assert!(stored.bit_options.contains(MemberFlag::ViewSigs));
    assert!(stored.bit_options.contains(MemberFlag::HasSecurityAnswers));
    assert!(stored.bit_options.contains(MemberFlag::Validating));

    let answers = SecurityAnswer::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(encryptor.open(&answers[0].answer).unwrap(), "Rex");

    let log_types: Vec<String> = HistoryEntry::find_by_member(member.id, &ctx.db_pool)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.log_type)
        .collect();
    assert_eq!(
        log_types,
        vec!["mfa", "admin_mails", "terms_acceptance", "terms_acceptance"]
    );

    let claimed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachments WHERE member_id = $1")
        .bind(member.id)
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(claimed, 1);

    let post = ctx.store.find_pending_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.member_id, Some(member.id));
}
