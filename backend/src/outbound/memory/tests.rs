//! Behavioural coverage for the in-memory store.

use chrono::Duration;
use rstest::{fixture, rstest};
use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::domain::test_fixtures::fixture_timestamp;
use crate::domain::{
    FeedbackId, NewProfile, Ordering, OtpCode, RegistrationRequest, Role, seed_catalogue,
};

fn email(raw: &str) -> EmailAddress {
    EmailAddress::syntactic(raw).expect("valid email")
}

fn account(raw_email: &str) -> NewAccount {
    NewAccount {
        user: User::new(UserId::random(), email(raw_email)),
        password_hash: "$2b$10$hash".to_owned(),
        profile: NewProfile {
            name: Some("Asha".to_owned()),
            roll_number: Some("b22cs001".to_owned()),
            ..NewProfile::default()
        },
        created_at: fixture_timestamp(),
    }
}

fn feedback_for(user: &UserId, minutes: i64) -> Feedback {
    let at = fixture_timestamp() + Duration::minutes(minutes);
    Feedback {
        id: FeedbackId::random(),
        user_id: user.clone(),
        content: json!({"programme": "B.Tech"}),
        attachment_url: None,
        created_at: at,
        updated_at: at,
    }
}

fn registration(user: &UserId, codes: &[&str]) -> NewRegistration {
    NewRegistration {
        id: Uuid::new_v4(),
        user_id: user.clone(),
        request: RegistrationRequest {
            student_id: "b22cs001".to_owned(),
            student_name: "Asha".to_owned(),
            semester: "Fall".to_owned(),
            year: "2025".to_owned(),
            course_codes: codes.iter().map(|c| (*c).to_owned()).collect(),
        },
        total_credits: 7,
        created_at: fixture_timestamp(),
    }
}

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

#[rstest]
#[tokio::test]
async fn account_creation_writes_user_and_profile(store: MemoryStore) {
    let new_account = account("asha@nitm.ac.in");
    store.create_account(&new_account).await.expect("created");

    let found = store
        .find_by_email(&email("asha@nitm.ac.in"))
        .await
        .expect("lookup")
        .expect("account present");
    assert_eq!(found.user, new_account.user);

    let profile = ProfileRepository::find(&store, new_account.user.id())
        .await
        .expect("lookup")
        .expect("profile present");
    assert_eq!(profile.role, Role::Student);
    assert_eq!(profile.created_at, fixture_timestamp());
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_are_rejected(store: MemoryStore) {
    store
        .create_account(&account("asha@nitm.ac.in"))
        .await
        .expect("first account");
    let err = store
        .create_account(&account("asha@nitm.ac.in"))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, UserPersistenceError::DuplicateEmail { .. }));
}

#[rstest]
#[tokio::test]
async fn profile_inserts_need_an_account(store: MemoryStore) {
    let orphan = NewProfile::default().into_profile(UserId::random(), fixture_timestamp());
    let err = ProfileRepository::insert(&store, &orphan)
        .await
        .expect_err("no account");
    assert!(matches!(err, ProfileRepositoryError::MissingUser { .. }));
}

#[rstest]
#[tokio::test]
async fn profile_updates_touch_only_matching_rows(store: MemoryStore) {
    let first = account("asha@nitm.ac.in");
    let second = account("ravi@nitm.ac.in");
    store.create_account(&first).await.expect("first");
    store.create_account(&second).await.expect("second");

    let patch = ProfilePatch {
        department: Some("ECE".to_owned()),
        ..ProfilePatch::default()
    };
    let later = fixture_timestamp() + Duration::hours(1);
    let count = ProfileRepository::update(
        &store,
        &[ProfileFilter::Id(first.user.id().clone())],
        &patch,
        later,
    )
    .await
    .expect("update");
    assert_eq!(count, 1);

    let untouched = ProfileRepository::find(&store, second.user.id())
        .await
        .expect("lookup")
        .expect("profile");
    assert_eq!(untouched.department, None);
    assert_eq!(untouched.updated_at, fixture_timestamp());
}

#[rstest]
#[tokio::test]
async fn unfiltered_writes_are_refused(store: MemoryStore) {
    let err = FeedbackRepository::delete(&store, &[])
        .await
        .expect_err("refused");
    assert!(matches!(err, FeedbackRepositoryError::Query { .. }));
}

#[rstest]
#[tokio::test]
async fn feedback_selects_filter_and_order(store: MemoryStore) {
    let owner = UserId::random();
    let other = UserId::random();
    for row in [
        feedback_for(&owner, 0),
        feedback_for(&other, 5),
        feedback_for(&owner, 10),
    ] {
        FeedbackRepository::insert(&store, &row).await.expect("insert");
    }

    let selection = Selection {
        filters: vec![FeedbackFilter::UserId(owner.clone())],
        order: Some(Ordering {
            column: FeedbackColumn::CreatedAt,
            ascending: false,
        }),
    };
    let rows = FeedbackRepository::select(&store, &selection)
        .await
        .expect("select");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.user_id == owner));
    assert!(rows[0].created_at > rows[1].created_at);
}

#[rstest]
#[tokio::test]
async fn otp_rows_are_replaced_per_email(store: MemoryStore) {
    let address = email("asha@nitm.ac.in");
    let first = OtpChallenge::issue(
        address.clone(),
        OtpCode::parse("123456").expect("code"),
        fixture_timestamp(),
        Duration::minutes(10),
    );
    let second = OtpChallenge::issue(
        address.clone(),
        OtpCode::parse("654321").expect("code"),
        fixture_timestamp(),
        Duration::minutes(10),
    );
    store.replace(&first).await.expect("first");
    store.replace(&second).await.expect("second");
    store.mark_verified(&address).await.expect("verify");

    let stored = OtpRepository::find(&store, &address)
        .await
        .expect("lookup")
        .expect("row");
    assert_eq!(stored.code.as_ref(), "654321");
    assert!(stored.verified);

    OtpRepository::delete(&store, &address).await.expect("delete");
    assert!(OtpRepository::find(&store, &address).await.expect("lookup").is_none());
}

#[rstest]
#[tokio::test]
async fn seeding_is_idempotent(store: MemoryStore) {
    let catalogue = seed_catalogue();
    assert_eq!(store.seed(&catalogue).await.expect("seed"), catalogue.len());
    assert_eq!(store.seed(&catalogue).await.expect("reseed"), 0);

    let listed = store.list().await.expect("list");
    assert_eq!(listed.len(), catalogue.len());
    assert!(listed.windows(2).all(|pair| pair[0].code < pair[1].code));
}

#[rstest]
#[tokio::test]
async fn registration_bumps_enrolment_once_per_term(store: MemoryStore) {
    store.seed(&seed_catalogue()).await.expect("seed");
    let user = UserId::random();

    store
        .register(&registration(&user, &["CS201", "MATH101"]))
        .await
        .expect("registered");
    let err = store
        .register(&registration(&user, &["PHYS101"]))
        .await
        .expect_err("same term");
    assert!(matches!(err, CourseRepositoryError::AlreadyRegistered));

    let courses = store.list().await.expect("list");
    let cs201 = courses.iter().find(|c| c.code == "CS201").expect("CS201");
    let phys101 = courses.iter().find(|c| c.code == "PHYS101").expect("PHYS101");
    assert_eq!(cs201.enrolled, 36);
    assert_eq!(phys101.enrolled, 42);
    assert_eq!(store.registrations_for(&user).await.expect("list").len(), 1);
}

#[rstest]
#[tokio::test]
async fn full_courses_are_refused(store: MemoryStore) {
    let mut catalogue = seed_catalogue();
    for course in &mut catalogue {
        course.enrolled = course.capacity;
    }
    store.seed(&catalogue).await.expect("seed");

    let err = store
        .register(&registration(&UserId::random(), &["CS201"]))
        .await
        .expect_err("full");
    assert!(matches!(err, CourseRepositoryError::CourseFull { code } if code == "CS201"));
}
