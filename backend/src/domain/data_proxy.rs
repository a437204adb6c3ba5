//! Typed form of the table proxy the dashboards talk to.
//!
//! Clients post a query-builder state (`table`, `op`, equality filters,
//! payload, ordering). [`DataCommand::parse`] turns it into a closed set of
//! commands over the exposed tables, with every column checked against a
//! per-table allowlist, so adapters never interpolate caller-supplied names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;

use super::{
    EmailAddress, Error, FeedbackContent, FeedbackId, FeedbackPatch, FeedbackValidationError,
    NewProfile, ProfilePatch, Role, UserId,
};

/// Proxy request as posted by clients.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, ToSchema)]
pub struct DataRequest {
    #[serde(default)]
    #[schema(example = "profiles")]
    pub table: Option<String>,
    #[serde(default)]
    #[schema(example = "select")]
    pub op: Option<String>,
    #[serde(default)]
    pub filters: Vec<DataFilterInput>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
    #[serde(default)]
    pub order: Option<DataOrderInput>,
    #[serde(default)]
    pub single: bool,
}

/// Equality filter as posted by clients.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct DataFilterInput {
    #[schema(example = "id")]
    pub k: String,
    #[serde(default = "default_filter_op")]
    #[schema(example = "eq")]
    pub op: String,
    #[schema(value_type = Object)]
    pub v: Value,
}

fn default_filter_op() -> String {
    "eq".to_owned()
}

/// Ordering as posted by clients.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct DataOrderInput {
    #[schema(example = "created_at")]
    pub column: String,
    #[serde(default)]
    pub opts: DataOrderOptions,
}

/// Sort direction; a missing or `false` flag sorts descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct DataOrderOptions {
    #[serde(default)]
    pub ascending: bool,
}

/// Reasons a proxy request is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataProxyError {
    #[error("Invalid request")]
    InvalidRequest,
    #[error("Unknown table {0}")]
    UnknownTable(String),
    #[error("Unsupported operation")]
    UnsupportedOperation,
    #[error("Unsupported filter operator {op}")]
    UnsupportedFilter { op: String },
    #[error("Unknown column {column} for {table}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("Invalid value for {column}: {reason}")]
    InvalidValue { column: String, reason: String },
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },
    #[error("{op} needs at least one filter")]
    FiltersRequired { op: &'static str },
    #[error("Forbidden")]
    TableNotExposed { table: &'static str },
    #[error("Forbidden")]
    ReadOnlyTable { table: &'static str },
    #[error("{0}")]
    Feedback(#[from] FeedbackValidationError),
}

impl DataProxyError {
    /// Whether the refusal is an authorisation matter rather than bad input.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::TableNotExposed { .. } | Self::ReadOnlyTable { .. })
    }

    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnknownTable(_) => "unknown_table",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::UnsupportedFilter { .. } => "unsupported_filter",
            Self::UnknownColumn { .. } => "unknown_column",
            Self::InvalidValue { .. } => "invalid_value",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::FiltersRequired { .. } => "filters_required",
            Self::TableNotExposed { .. } => "table_not_exposed",
            Self::ReadOnlyTable { .. } => "read_only_table",
            Self::Feedback(inner) => inner.code(),
        }
    }
}

/// Tables known to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTable {
    Profiles,
    Feedbacks,
    Users,
    OtpVerifications,
}

impl DataTable {
    /// Parse a table name.
    pub fn parse(raw: &str) -> Result<Self, DataProxyError> {
        match raw {
            "profiles" => Ok(Self::Profiles),
            "feedbacks" => Ok(Self::Feedbacks),
            "users" => Ok(Self::Users),
            "otp_verifications" => Ok(Self::OtpVerifications),
            other => Err(DataProxyError::UnknownTable(other.to_owned())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Feedbacks => "feedbacks",
            Self::Users => "users",
            Self::OtpVerifications => "otp_verifications",
        }
    }
}

/// Operations known to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOperation {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
}

impl DataOperation {
    pub fn parse(raw: &str) -> Result<Self, DataProxyError> {
        match raw {
            "select" => Ok(Self::Select),
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "upsert" => Ok(Self::Upsert),
            _ => Err(DataProxyError::UnsupportedOperation),
        }
    }
}

/// Requested ordering over a typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering<C> {
    pub column: C,
    pub ascending: bool,
}

/// Filters and ordering for a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<F, C> {
    pub filters: Vec<F>,
    pub order: Option<Ordering<C>>,
}

impl<F, C> Default for Selection<F, C> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            order: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileFilter {
    Id(UserId),
    Email(EmailAddress),
    Role(Role),
    Department(String),
    RollNumber(String),
    FacultyId(String),
    AdminId(String),
    IsVerified(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileColumn {
    Name,
    Email,
    Role,
    RollNumber,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackFilter {
    Id(FeedbackId),
    UserId(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackColumn {
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Id(UserId),
    Email(EmailAddress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Email,
    CreatedAt,
}

/// Validated proxy command.
#[derive(Debug, Clone, PartialEq)]
pub enum DataCommand {
    SelectProfiles {
        selection: Selection<ProfileFilter, ProfileColumn>,
        single: bool,
    },
    InsertProfile {
        id: Option<UserId>,
        profile: NewProfile,
    },
    UpdateProfiles {
        filters: Vec<ProfileFilter>,
        patch: ProfilePatch,
    },
    DeleteProfiles {
        filters: Vec<ProfileFilter>,
    },
    SelectFeedbacks {
        selection: Selection<FeedbackFilter, FeedbackColumn>,
        single: bool,
    },
    InsertFeedback {
        user_id: Option<UserId>,
        content: FeedbackContent,
        attachment_url: Option<String>,
    },
    UpdateFeedbacks {
        filters: Vec<FeedbackFilter>,
        patch: FeedbackPatch,
    },
    DeleteFeedbacks {
        filters: Vec<FeedbackFilter>,
    },
    SelectUsers {
        selection: Selection<UserFilter, UserColumn>,
        single: bool,
    },
}

/// Result of a proxy command.
///
/// Serialises as a row list, a single row (or `null`), or `{"count": n}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataOutcome {
    Rows(Vec<Value>),
    Row(Option<Value>),
    Count { count: usize },
}

/// Columns the server maintains itself; clients may send them but they are
/// ignored on writes.
const SERVER_MANAGED: [&str; 2] = ["created_at", "updated_at"];

impl DataCommand {
    /// Validate a raw request.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::{DataCommand, DataRequest};
    /// use serde_json::json;
    ///
    /// let request: DataRequest = serde_json::from_value(json!({
    ///     "table": "profiles",
    ///     "op": "select",
    ///     "filters": [{"k": "role", "op": "eq", "v": "faculty"}],
    ///     "order": {"column": "created_at", "opts": {"ascending": false}}
    /// })).unwrap();
    /// assert!(matches!(
    ///     DataCommand::parse(request),
    ///     Ok(DataCommand::SelectProfiles { single: false, .. })
    /// ));
    /// ```
    pub fn parse(request: DataRequest) -> Result<Self, DataProxyError> {
        let (Some(table), Some(op)) = (request.table.as_deref(), request.op.as_deref()) else {
            return Err(DataProxyError::InvalidRequest);
        };
        let table = DataTable::parse(table.trim())?;
        let op = DataOperation::parse(op.trim())?;
        match table {
            DataTable::Profiles => parse_profiles(op, request),
            DataTable::Feedbacks => parse_feedbacks(op, request),
            DataTable::Users if op == DataOperation::Select => Ok(Self::SelectUsers {
                selection: selection(&request, user_filter, user_column)?,
                single: request.single,
            }),
            DataTable::Users => Err(DataProxyError::ReadOnlyTable {
                table: table.as_str(),
            }),
            DataTable::OtpVerifications => Err(DataProxyError::TableNotExposed {
                table: table.as_str(),
            }),
        }
    }
}

fn parse_profiles(op: DataOperation, request: DataRequest) -> Result<DataCommand, DataProxyError> {
    match op {
        DataOperation::Select => Ok(DataCommand::SelectProfiles {
            selection: selection(&request, profile_filter, profile_column)?,
            single: request.single,
        }),
        DataOperation::Insert => {
            let (id, fields) = split_payload(request.payload)?;
            Ok(DataCommand::InsertProfile {
                id: id.map(|raw| user_id_value("id", &raw)).transpose()?,
                profile: from_fields::<NewProfile>(fields)?,
            })
        }
        DataOperation::Update => Ok(DataCommand::UpdateProfiles {
            filters: required_filters(&request, "update", profile_filter)?,
            patch: profile_patch(split_payload(request.payload)?.1)?,
        }),
        DataOperation::Delete => Ok(DataCommand::DeleteProfiles {
            filters: required_filters(&request, "delete", profile_filter)?,
        }),
        DataOperation::Upsert => {
            let (id, fields) = split_payload(request.payload)?;
            match id {
                Some(raw) => Ok(DataCommand::UpdateProfiles {
                    filters: vec![ProfileFilter::Id(user_id_value("id", &raw)?)],
                    patch: profile_patch(fields)?,
                }),
                None => Ok(DataCommand::InsertProfile {
                    id: None,
                    profile: from_fields::<NewProfile>(fields)?,
                }),
            }
        }
    }
}

fn parse_feedbacks(op: DataOperation, request: DataRequest) -> Result<DataCommand, DataProxyError> {
    match op {
        DataOperation::Select => Ok(DataCommand::SelectFeedbacks {
            selection: selection(&request, feedback_filter, feedback_column)?,
            single: request.single,
        }),
        DataOperation::Insert => {
            let (id, fields) = split_payload(request.payload)?;
            if id.is_some() {
                return Err(DataProxyError::InvalidPayload {
                    reason: "id is assigned by the server".to_owned(),
                });
            }
            feedback_insert(fields)
        }
        DataOperation::Update => Ok(DataCommand::UpdateFeedbacks {
            filters: required_filters(&request, "update", feedback_filter)?,
            patch: feedback_patch(split_payload(request.payload)?.1)?,
        }),
        DataOperation::Delete => Ok(DataCommand::DeleteFeedbacks {
            filters: required_filters(&request, "delete", feedback_filter)?,
        }),
        DataOperation::Upsert => {
            let (id, fields) = split_payload(request.payload)?;
            match id {
                Some(raw) => Ok(DataCommand::UpdateFeedbacks {
                    filters: vec![FeedbackFilter::Id(feedback_id_value("id", &raw)?)],
                    patch: feedback_patch(fields)?,
                }),
                None => feedback_insert(fields),
            }
        }
    }
}

type FilterParser<F> = fn(&str, &Value) -> Result<F, DataProxyError>;
type ColumnParser<C> = fn(&str) -> Result<C, DataProxyError>;

fn filters<F>(request: &DataRequest, parse: FilterParser<F>) -> Result<Vec<F>, DataProxyError> {
    request
        .filters
        .iter()
        .map(|filter| {
            if filter.op != "eq" {
                return Err(DataProxyError::UnsupportedFilter {
                    op: filter.op.clone(),
                });
            }
            parse(filter.k.trim(), &filter.v)
        })
        .collect()
}

fn required_filters<F>(
    request: &DataRequest,
    op: &'static str,
    parse: FilterParser<F>,
) -> Result<Vec<F>, DataProxyError> {
    let parsed = filters(request, parse)?;
    if parsed.is_empty() {
        return Err(DataProxyError::FiltersRequired { op });
    }
    Ok(parsed)
}

fn selection<F, C>(
    request: &DataRequest,
    parse_filter: FilterParser<F>,
    parse_column: ColumnParser<C>,
) -> Result<Selection<F, C>, DataProxyError> {
    let order = request
        .order
        .as_ref()
        .map(|order| {
            parse_column(order.column.trim()).map(|column| Ordering {
                column,
                ascending: order.opts.ascending,
            })
        })
        .transpose()?;
    Ok(Selection {
        filters: filters(request, parse_filter)?,
        order,
    })
}

fn text_value(column: &str, value: &Value) -> Result<String, DataProxyError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(invalid_value(column, "expected a scalar")),
    }
}

fn bool_value(column: &str, value: &Value) -> Result<bool, DataProxyError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => text
            .parse()
            .map_err(|_| invalid_value(column, "expected true or false")),
        _ => Err(invalid_value(column, "expected true or false")),
    }
}

fn user_id_value(column: &str, value: &Value) -> Result<UserId, DataProxyError> {
    UserId::new(text_value(column, value)?).map_err(|err| invalid_value(column, &err.to_string()))
}

fn feedback_id_value(column: &str, value: &Value) -> Result<FeedbackId, DataProxyError> {
    FeedbackId::parse(&text_value(column, value)?)
        .map_err(|_| invalid_value(column, "expected a UUID"))
}

fn email_value(column: &str, value: &Value) -> Result<EmailAddress, DataProxyError> {
    EmailAddress::syntactic(&text_value(column, value)?)
        .map_err(|err| invalid_value(column, &err.to_string()))
}

fn invalid_value(column: &str, reason: &str) -> DataProxyError {
    DataProxyError::InvalidValue {
        column: column.to_owned(),
        reason: reason.to_owned(),
    }
}

fn unknown_column(table: DataTable, column: &str) -> DataProxyError {
    DataProxyError::UnknownColumn {
        table: table.as_str(),
        column: column.to_owned(),
    }
}

fn profile_filter(column: &str, value: &Value) -> Result<ProfileFilter, DataProxyError> {
    Ok(match column {
        "id" => ProfileFilter::Id(user_id_value(column, value)?),
        "email" => ProfileFilter::Email(email_value(column, value)?),
        "role" => ProfileFilter::Role(
            text_value(column, value)?
                .parse()
                .map_err(|err: super::UnknownRole| invalid_value(column, &err.to_string()))?,
        ),
        "department" => ProfileFilter::Department(text_value(column, value)?),
        "roll_number" => ProfileFilter::RollNumber(text_value(column, value)?),
        "faculty_id" => ProfileFilter::FacultyId(text_value(column, value)?),
        "admin_id" => ProfileFilter::AdminId(text_value(column, value)?),
        "is_verified" => ProfileFilter::IsVerified(bool_value(column, value)?),
        other => return Err(unknown_column(DataTable::Profiles, other)),
    })
}

fn profile_column(column: &str) -> Result<ProfileColumn, DataProxyError> {
    match column {
        "name" => Ok(ProfileColumn::Name),
        "email" => Ok(ProfileColumn::Email),
        "role" => Ok(ProfileColumn::Role),
        "roll_number" => Ok(ProfileColumn::RollNumber),
        "created_at" => Ok(ProfileColumn::CreatedAt),
        "updated_at" => Ok(ProfileColumn::UpdatedAt),
        other => Err(unknown_column(DataTable::Profiles, other)),
    }
}

fn feedback_filter(column: &str, value: &Value) -> Result<FeedbackFilter, DataProxyError> {
    match column {
        "id" => Ok(FeedbackFilter::Id(feedback_id_value(column, value)?)),
        "user_id" => Ok(FeedbackFilter::UserId(user_id_value(column, value)?)),
        other => Err(unknown_column(DataTable::Feedbacks, other)),
    }
}

fn feedback_column(column: &str) -> Result<FeedbackColumn, DataProxyError> {
    match column {
        "created_at" => Ok(FeedbackColumn::CreatedAt),
        "updated_at" => Ok(FeedbackColumn::UpdatedAt),
        other => Err(unknown_column(DataTable::Feedbacks, other)),
    }
}

fn user_filter(column: &str, value: &Value) -> Result<UserFilter, DataProxyError> {
    match column {
        "id" => Ok(UserFilter::Id(user_id_value(column, value)?)),
        "email" => Ok(UserFilter::Email(email_value(column, value)?)),
        other => Err(unknown_column(DataTable::Users, other)),
    }
}

fn user_column(column: &str) -> Result<UserColumn, DataProxyError> {
    match column {
        "email" => Ok(UserColumn::Email),
        "created_at" => Ok(UserColumn::CreatedAt),
        other => Err(unknown_column(DataTable::Users, other)),
    }
}

/// Split the payload into its `id` (if any) and the remaining writable fields.
fn split_payload(payload: Option<Value>) -> Result<(Option<Value>, Map<String, Value>), DataProxyError> {
    let mut fields = match payload {
        Some(Value::Object(fields)) => fields,
        Some(_) | None => {
            return Err(DataProxyError::InvalidPayload {
                reason: "payload must be an object".to_owned(),
            });
        }
    };
    for key in SERVER_MANAGED {
        fields.remove(key);
    }
    let id = fields.remove("id").filter(|value| !value.is_null());
    Ok((id, fields))
}

fn from_fields<T: serde::de::DeserializeOwned>(fields: Map<String, Value>) -> Result<T, DataProxyError> {
    serde_json::from_value(Value::Object(fields)).map_err(|err| DataProxyError::InvalidPayload {
        reason: err.to_string(),
    })
}

fn profile_patch(fields: Map<String, Value>) -> Result<ProfilePatch, DataProxyError> {
    let patch: ProfilePatch = from_fields(fields)?;
    if patch.is_empty() {
        return Err(DataProxyError::InvalidPayload {
            reason: "payload must set at least one column".to_owned(),
        });
    }
    Ok(patch)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FeedbackFields {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    attachment_url: Option<String>,
}

fn feedback_insert(fields: Map<String, Value>) -> Result<DataCommand, DataProxyError> {
    let fields: FeedbackFields = from_fields(fields)?;
    let content = fields.content.ok_or_else(|| DataProxyError::InvalidPayload {
        reason: "content is required".to_owned(),
    })?;
    Ok(DataCommand::InsertFeedback {
        user_id: fields.user_id,
        content: FeedbackContent::from_value(content)?,
        attachment_url: fields.attachment_url,
    })
}

fn feedback_patch(fields: Map<String, Value>) -> Result<FeedbackPatch, DataProxyError> {
    let fields: FeedbackFields = from_fields(fields)?;
    if fields.user_id.is_some() {
        return Err(DataProxyError::InvalidPayload {
            reason: "user_id cannot be changed".to_owned(),
        });
    }
    let patch = FeedbackPatch {
        content: fields.content.map(FeedbackContent::from_value).transpose()?,
        attachment_url: fields.attachment_url,
    };
    if patch.is_empty() {
        return Err(DataProxyError::InvalidPayload {
            reason: "payload must set at least one column".to_owned(),
        });
    }
    Ok(patch)
}

impl From<DataProxyError> for Error {
    fn from(error: DataProxyError) -> Self {
        if error.is_forbidden() {
            return Self::forbidden(error.to_string());
        }
        Self::invalid_request(error.to_string()).with_details(json!({ "code": error.code() }))
    }
}
