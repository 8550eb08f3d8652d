//! AWS error classification.
//!
//! SDK errors are classified once, at the API seam, into a closed set of
//! kinds. Connectors match on [`AwsErrorKind`] instead of re-parsing error
//! codes at every call site.

use std::fmt;

use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AwsErrorKind {
    /// The addressed resource does not exist (or no longer exists).
    NotFound,
    AlreadyExists,
    Throttled,
    /// Eventual consistency or a conflicting in-flight operation. Safe to retry.
    Transient,
    Validation,
    Other,
}

impl fmt::Display for AwsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AwsErrorKind::NotFound => "not found",
            AwsErrorKind::AlreadyExists => "already exists",
            AwsErrorKind::Throttled => "throttled",
            AwsErrorKind::Transient => "transient",
            AwsErrorKind::Validation => "validation",
            AwsErrorKind::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("AWS error ({kind}){}: {message}", code_suffix(.code))]
pub struct AwsError {
    pub kind:    AwsErrorKind,
    pub code:    Option<String>,
    pub message: String,
}

impl AwsError {
    pub fn new(kind: AwsErrorKind, code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.map(String::from),
            message: message.into(),
        }
    }

    /// Classifies any SDK error that carries AWS error metadata.
    ///
    /// Errors without a service error code (dispatch failures, timeouts) are
    /// classified as `Other` and keep the full error context as the message.
    pub fn from_sdk<E>(err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let code = err.code().map(String::from);
        let message = match err.message() {
            Some(m) => m.to_string(),
            None => DisplayErrorContext(&err).to_string(),
        };
        Self {
            kind: classify_aws_error(code.as_deref(), Some(&message)),
            code,
            message,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(AwsErrorKind::Other, None, message)
    }

    pub fn kind(&self) -> AwsErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == AwsErrorKind::NotFound
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, AwsErrorKind::Throttled | AwsErrorKind::Transient)
    }
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" {c}")).unwrap_or_default()
}

/// Finds an [`AwsError`] anywhere in an anyhow error chain.
pub fn find_aws_error(err: &anyhow::Error) -> Option<&AwsError> {
    err.chain().find_map(|cause| cause.downcast_ref::<AwsError>())
}

/// True when the error chain contains an AWS "not found" classification.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    find_aws_error(err).is_some_and(AwsError::is_not_found)
}

const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "NotFoundException",
    "NoSuchBucket",
    "NoSuchBucketPolicy",
    "NoSuchEntity",
    "NoSuchKey",
];

const ALREADY_EXISTS_CODES: &[&str] = &[
    "ResourceAlreadyExistsException",
    "EntityAlreadyExists",
    "BucketAlreadyOwnedByYou",
];

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "SlowDown",
];

const TRANSIENT_CODES: &[&str] = &[
    "OperationAbortedException",
    "ConcurrentModificationException",
    "OperationAborted",
];

const VALIDATION_CODES: &[&str] = &[
    "ValidationException",
    "InvalidParameterException",
    "InvalidArgumentException",
    "InvalidParameterValue",
    "MalformedPolicy",
    "DirectConnectClientException",
];

/// Codes some services overload for "not found", and the message fragment
/// that marks the not-found case. Checked before the plain code tables.
const NOT_FOUND_MESSAGE_RULES: &[(&str, &str)] = &[
    ("ValidationException", "Unable to describe"),
    ("ValidationException", "does not exist"),
    ("DirectConnectClientException", "Could not find"),
];

/// Codes whose message marks an eventual-consistency failure.
const TRANSIENT_MESSAGE_RULES: &[(&str, &str)] = &[
    ("MalformedPolicy", "Invalid principal"),
    ("InvalidParameterValue", "iamInstanceProfile"),
];

pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsErrorKind {
    let Some(code) = code else {
        return AwsErrorKind::Other;
    };
    let message = message.unwrap_or_default();

    let message_rule = |rules: &[(&str, &str)]| {
        rules
            .iter()
            .any(|(rule_code, fragment)| *rule_code == code && message.contains(fragment))
    };

    if message_rule(NOT_FOUND_MESSAGE_RULES) {
        AwsErrorKind::NotFound
    } else if message_rule(TRANSIENT_MESSAGE_RULES) {
        AwsErrorKind::Transient
    } else if NOT_FOUND_CODES.contains(&code) {
        AwsErrorKind::NotFound
    } else if ALREADY_EXISTS_CODES.contains(&code) {
        AwsErrorKind::AlreadyExists
    } else if THROTTLING_CODES.contains(&code) {
        AwsErrorKind::Throttled
    } else if TRANSIENT_CODES.contains(&code) {
        AwsErrorKind::Transient
    } else if VALIDATION_CODES.contains(&code) {
        AwsErrorKind::Validation
    } else {
        AwsErrorKind::Other
    }
}
