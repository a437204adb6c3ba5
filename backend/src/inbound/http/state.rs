//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountQuery, AttachmentCommand, AttachmentStore, AuthCommand, CourseCommand, CourseQuery,
    CourseRepository, DataProxyCommand, FeedbackCommand, FeedbackQuery, FeedbackRepository,
    OtpCommand, OtpNotifier, OtpRepository, PasswordHasher, ProfileRepository, UserRepository,
};
use crate::domain::{
    AttachmentService, AuthService, AuthSettings, CourseService, DataProxyService, EmailPolicy,
    FeedbackService, OtpService, OtpSettings,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub auth: Arc<dyn AuthCommand>,
    pub accounts: Arc<dyn AccountQuery>,
    pub otp: Arc<dyn OtpCommand>,
    pub feedback: Arc<dyn FeedbackCommand>,
    pub feedback_query: Arc<dyn FeedbackQuery>,
    pub courses: Arc<dyn CourseCommand>,
    pub courses_query: Arc<dyn CourseQuery>,
    pub data: Arc<dyn DataProxyCommand>,
    pub attachments: Arc<dyn AttachmentCommand>,
    /// Which email addresses sign-up and OTP requests accept.
    pub email_policy: EmailPolicy,
}

/// Behaviour switches applied when wiring the services.
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    pub auth: AuthSettings,
    pub otp: OtpSettings,
    pub email_policy: EmailPolicy,
}

/// Driven adapters the services are built over.
pub struct Adapters<U, P, F, O, C, H, N, S> {
    pub users: Arc<U>,
    pub profiles: Arc<P>,
    pub feedbacks: Arc<F>,
    pub otps: Arc<O>,
    pub courses: Arc<C>,
    pub hasher: Arc<H>,
    pub notifier: Arc<N>,
    pub attachments: Arc<S>,
}

impl<U, P, F, O, C, H, N, S> Adapters<U, P, F, O, C, H, N, S>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    F: FeedbackRepository + 'static,
    O: OtpRepository + 'static,
    C: CourseRepository + 'static,
    H: PasswordHasher + 'static,
    N: OtpNotifier + 'static,
    S: AttachmentStore + 'static,
{
    /// Build every service over these adapters.
    pub fn into_state(self, settings: ServiceSettings, clock: Arc<dyn Clock>) -> HttpState {
        let Self {
            users,
            profiles,
            feedbacks,
            otps,
            courses,
            hasher,
            notifier,
            attachments,
        } = self;

        let auth = Arc::new(AuthService::new(
            users.clone(),
            profiles.clone(),
            otps.clone(),
            hasher,
            clock.clone(),
            settings.auth,
        ));
        let feedback = Arc::new(FeedbackService::new(
            feedbacks.clone(),
            profiles.clone(),
            clock.clone(),
        ));
        let course = Arc::new(CourseService::new(courses, clock.clone()));

        HttpState {
            auth: auth.clone(),
            accounts: auth,
            otp: Arc::new(OtpService::new(otps, notifier, clock.clone(), settings.otp)),
            feedback: feedback.clone(),
            feedback_query: feedback,
            courses: course.clone(),
            courses_query: course,
            data: Arc::new(DataProxyService::new(
                users,
                profiles,
                feedbacks,
                clock.clone(),
            )),
            attachments: Arc::new(AttachmentService::new(attachments, clock)),
            email_policy: settings.email_policy,
        }
    }
}
