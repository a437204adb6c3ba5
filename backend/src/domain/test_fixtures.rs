//! Shared fixtures for service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{EmailAddress, Profile, Role, UserId};

pub(crate) struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    clock_at(fixture_timestamp())
}

pub(crate) fn clock_at(utc_now: DateTime<Utc>) -> Arc<dyn Clock> {
    Arc::new(FixtureClock { utc_now })
}

pub(crate) fn profile_with_role(id: &UserId, role: Role) -> Profile {
    Profile {
        id: id.clone(),
        name: Some("Fixture Person".to_owned()),
        email: Some(EmailAddress::syntactic("fixture@nitm.ac.in").expect("valid email")),
        role,
        department: Some("CSE".to_owned()),
        roll_number: None,
        faculty_id: None,
        admin_id: None,
        is_verified: true,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    }
}
