//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. `diesel print-schema`
//! against a migrated database regenerates them.

diesel::table! {
    /// Login accounts. `email` is stored lower-cased and is unique.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One role-bearing profile per account, keyed by the user id.
    profiles (id) {
        id -> Uuid,
        name -> Nullable<Text>,
        email -> Nullable<Varchar>,
        role -> Varchar,
        department -> Nullable<Text>,
        roll_number -> Nullable<Text>,
        faculty_id -> Nullable<Text>,
        admin_id -> Nullable<Text>,
        is_verified -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Feedback submissions; `content` holds the questionnaire document.
    feedbacks (id) {
        id -> Uuid,
        user_id -> Uuid,
        content -> Jsonb,
        attachment_url -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Live OTP challenge per email.
    otp_verifications (email) {
        email -> Varchar,
        code -> Varchar,
        expires_at -> Timestamptz,
        verified -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    courses (code) {
        code -> Varchar,
        name -> Text,
        credits -> Int4,
        instructor -> Text,
        schedule -> Text,
        prerequisites -> Array<Text>,
        capacity -> Int4,
        enrolled -> Int4,
    }
}

diesel::table! {
    /// Semester registrations; unique per user, semester and year.
    course_registrations (id) {
        id -> Uuid,
        user_id -> Uuid,
        student_id -> Text,
        student_name -> Text,
        semester -> Text,
        year -> Text,
        course_codes -> Array<Text>,
        total_credits -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(profiles -> users (id));
diesel::joinable!(feedbacks -> users (user_id));
diesel::joinable!(course_registrations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    profiles,
    feedbacks,
    otp_verifications,
    courses,
    course_registrations,
);
