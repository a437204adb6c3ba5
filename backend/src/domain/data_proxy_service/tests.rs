//! Regression coverage for proxy authorisation.

use super::*;
use crate::domain::ports::{MockFeedbackRepository, MockProfileRepository, MockUserRepository};
use crate::domain::test_fixtures::{fixture_clock, fixture_timestamp, profile_with_role};
use crate::domain::{
    EmailAddress, ErrorCode, InstructorFeedback, Ordering, QUESTION_COUNT, User, UserFilter,
};
use rstest::{fixture, rstest};
use serde_json::json;

type TestService =
    DataProxyService<MockUserRepository, MockProfileRepository, MockFeedbackRepository>;

struct Mocks {
    users: MockUserRepository,
    profiles: MockProfileRepository,
    feedbacks: MockFeedbackRepository,
}

impl Mocks {
    /// Mocks whose profile lookup answers with `role` for every id.
    fn for_role(role: Option<Role>) -> Self {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find()
            .returning(move |id| Ok(role.map(|role| profile_with_role(id, role))));
        Self {
            users: MockUserRepository::new(),
            profiles,
            feedbacks: MockFeedbackRepository::new(),
        }
    }

    fn into_service(self) -> TestService {
        DataProxyService::new(
            Arc::new(self.users),
            Arc::new(self.profiles),
            Arc::new(self.feedbacks),
            fixture_clock(),
        )
    }
}

#[fixture]
fn caller() -> UserId {
    UserId::random()
}

fn content() -> FeedbackContent {
    FeedbackContent {
        programme: "B.Tech".to_owned(),
        department: "CSE".to_owned(),
        semester: "5th".to_owned(),
        instructors: vec![InstructorFeedback {
            course_code: "CS301".to_owned(),
            name: "Prof. Johnson".to_owned(),
            ratings: vec![5; QUESTION_COUNT],
            ..InstructorFeedback::default()
        }],
    }
}

#[rstest]
#[case(Some(Role::Student), "Forbidden - admin only")]
#[case(Some(Role::Faculty), "Forbidden - admin only")]
#[case(None, "Forbidden")]
#[tokio::test]
async fn deletes_are_admin_only(
    caller: UserId,
    #[case] role: Option<Role>,
    #[case] message: &str,
) {
    let mut mocks = Mocks::for_role(role);
    mocks.profiles.expect_delete().never();

    let err = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::DeleteProfiles {
                filters: vec![ProfileFilter::Role(Role::Student)],
            },
        )
        .await
        .expect_err("refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.message(), message);
}

#[rstest]
#[tokio::test]
async fn admin_delete_reports_count(caller: UserId) {
    let mut mocks = Mocks::for_role(Some(Role::Admin));
    mocks
        .feedbacks
        .expect_delete()
        .times(1)
        .return_once(|_| Ok(3));

    let outcome = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::DeleteFeedbacks {
                filters: vec![FeedbackFilter::UserId(UserId::random())],
            },
        )
        .await
        .expect("delete runs");

    assert_eq!(outcome, DataOutcome::Count { count: 3 });
}

#[rstest]
#[tokio::test]
async fn students_cannot_promote_themselves(caller: UserId) {
    let mut mocks = Mocks::for_role(Some(Role::Student));
    mocks.profiles.expect_update().never();

    let err = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::UpdateProfiles {
                filters: vec![ProfileFilter::Id(caller.clone())],
                patch: ProfilePatch {
                    role: Some(Role::Admin),
                    ..ProfilePatch::default()
                },
            },
        )
        .await
        .expect_err("escalation refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn student_updates_are_pinned_to_their_own_row(caller: UserId) {
    let expected = vec![
        ProfileFilter::Department("CSE".to_owned()),
        ProfileFilter::Id(caller.clone()),
    ];
    let mut mocks = Mocks::for_role(Some(Role::Student));
    mocks
        .profiles
        .expect_update()
        .withf(move |filters, _, now| filters == expected.as_slice() && *now == fixture_timestamp())
        .times(1)
        .return_once(|_, _, _| Ok(1));

    let outcome = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::UpdateProfiles {
                filters: vec![ProfileFilter::Department("CSE".to_owned())],
                patch: ProfilePatch {
                    name: Some("Renamed".to_owned()),
                    ..ProfilePatch::default()
                },
            },
        )
        .await
        .expect("update runs");

    assert_eq!(outcome, DataOutcome::Count { count: 1 });
}

#[rstest]
#[tokio::test]
async fn profile_insert_for_someone_else_needs_admin(caller: UserId) {
    let mut mocks = Mocks::for_role(Some(Role::Faculty));
    mocks.profiles.expect_insert().never();

    let err = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::InsertProfile {
                id: Some(UserId::random()),
                profile: NewProfile::default(),
            },
        )
        .await
        .expect_err("refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn own_profile_insert_is_never_pre_verified(caller: UserId) {
    let mut mocks = Mocks::for_role(None);
    mocks
        .profiles
        .expect_insert()
        .withf(|profile| !profile.is_verified)
        .times(1)
        .return_once(|_| Ok(()));

    let outcome = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::InsertProfile {
                id: None,
                profile: NewProfile {
                    name: Some("Asha".to_owned()),
                    is_verified: true,
                    ..NewProfile::default()
                },
            },
        )
        .await
        .expect("insert runs");

    let DataOutcome::Row(Some(row)) = outcome else {
        panic!("expected the created row");
    };
    assert_eq!(row["id"], json!(caller.as_ref()));
    assert_eq!(row["role"], json!("student"));
    assert_eq!(row["is_verified"], json!(false));
}

#[rstest]
#[tokio::test]
async fn feedback_insert_cannot_claim_another_owner(caller: UserId) {
    let mut mocks = Mocks::for_role(Some(Role::Student));
    mocks.feedbacks.expect_insert().never();

    let err = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::InsertFeedback {
                user_id: Some(UserId::random()),
                content: content(),
                attachment_url: None,
            },
        )
        .await
        .expect_err("refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn feedback_insert_is_owned_by_caller(caller: UserId) {
    let owner = caller.clone();
    let mut mocks = Mocks::for_role(Some(Role::Student));
    mocks
        .feedbacks
        .expect_insert()
        .withf(move |row| row.user_id == owner)
        .times(1)
        .return_once(|_| Ok(()));

    let outcome = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::InsertFeedback {
                user_id: None,
                content: content(),
                attachment_url: Some("/uploads/1-form.pdf".to_owned()),
            },
        )
        .await
        .expect("insert runs");

    let DataOutcome::Row(Some(row)) = outcome else {
        panic!("expected the created row");
    };
    assert_eq!(row["user_id"], json!(caller.as_ref()));
    assert_eq!(row["attachment_url"], json!("/uploads/1-form.pdf"));
}

#[rstest]
#[tokio::test]
async fn student_feedback_reads_are_scoped(caller: UserId) {
    let owner = caller.clone();
    let mut mocks = Mocks::for_role(Some(Role::Student));
    mocks
        .feedbacks
        .expect_select()
        .withf(move |selection| {
            selection.filters.contains(&FeedbackFilter::UserId(owner.clone()))
                && selection.order
                    == Some(Ordering {
                        column: FeedbackColumn::CreatedAt,
                        ascending: false,
                    })
        })
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let outcome = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::SelectFeedbacks {
                selection: Selection::default(),
                single: true,
            },
        )
        .await
        .expect("select runs");

    assert_eq!(outcome, DataOutcome::Row(None));
}

#[rstest]
#[tokio::test]
async fn user_rows_are_projected(caller: UserId) {
    let listed = User::new(
        caller.clone(),
        EmailAddress::syntactic("test.student@nitm.ac.in").expect("valid email"),
    );
    let mut mocks = Mocks::for_role(Some(Role::Faculty));
    mocks
        .users
        .expect_select()
        .return_once(move |_| Ok(vec![listed]));

    let outcome = mocks
        .into_service()
        .execute(
            &caller,
            DataCommand::SelectUsers {
                selection: Selection {
                    filters: vec![UserFilter::Id(caller.clone())],
                    order: None,
                },
                single: false,
            },
        )
        .await
        .expect("select runs");

    assert_eq!(
        outcome,
        DataOutcome::Rows(vec![json!({
            "id": caller.as_ref(),
            "email": "test.student@nitm.ac.in",
        })])
    );
}
