use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::ProfileStep;
use crate::domains::member::models::Member;
use crate::domains::member::values::RegistrationValues;

const TIMEZONE: &str = "timezone";
const MAX_LEN: usize = 64;

lazy_static! {
    static ref IANA_ZONE: Regex =
        Regex::new(r"^(UTC|[A-Za-z]+(/[A-Za-z0-9_+\-]+){1,2})$").expect("valid timezone regex");
}

/// Stores the browser-reported timezone on the member.
pub struct TimezoneStep;

#[async_trait]
impl ProfileStep for TimezoneStep {
    fn key(&self) -> &'static str {
        "timezone"
    }

    async fn augment_registration(
        &self,
        values: &mut RegistrationValues,
        member: &mut Member,
    ) -> Result<()> {
        let Some(zone) = values.get_trimmed(TIMEZONE) else {
            return Ok(());
        };

        if zone.len() > MAX_LEN || !IANA_ZONE.is_match(zone) {
            debug!(member_id = %member.id, timezone = %zone, "Ignoring malformed timezone");
            return Ok(());
        }

        member.timezone = Some(zone.to_string());
        Ok(())
    }
}
