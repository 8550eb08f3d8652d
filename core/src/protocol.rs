//! Wire format between the host and a resource connector.
//!
//! Requests and responses are RON. Configurations and states travel as
//! nested RON strings so the envelope does not depend on any one resource
//! type.

use serde::{Deserialize, Serialize};

use crate::{
    connector::{IdError, ResourceConnector, ResourceData, ResourceId},
    error::{AwsError, AwsErrorKind},
    util::{PrettyConfig, RON},
    wait::WaitError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub resource_type: String,
    pub region: String,
    pub verb: Verb,
}

impl Request {
    pub fn from_ron(s: &str) -> anyhow::Result<Self> {
        Ok(RON.from_str(s)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verb {
    Validate { config: String },
    Plan { current: String, desired: String },
    Create { config: String },
    Read { id: String },
    Update { id: String, current: String, desired: String },
    Delete { id: String },
    Import { id: String },
}

impl Verb {
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Validate { .. } => "validate",
            Verb::Plan { .. } => "plan",
            Verb::Create { .. } => "create",
            Verb::Read { .. } => "read",
            Verb::Update { .. } => "update",
            Verb::Delete { .. } => "delete",
            Verb::Import { .. } => "import",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// A state-change poll ran out of time.
    Timeout,
    Aws(AwsErrorKind),
    /// The request itself was malformed or failed validation.
    Invalid,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Valid,
    Plan { replace: Vec<String> },
    Applied { id: String, state: String },
    /// Read or Import found nothing.
    Gone,
    Deleted,
    Failed { kind: FailureKind, message: String },
}

impl Response {
    pub fn to_ron(&self) -> anyhow::Result<String> {
        Ok(RON.to_string(self)?)
    }

    fn failed(kind: FailureKind, err: &anyhow::Error) -> Self {
        Response::Failed {
            kind,
            message: format!("{err:#}"),
        }
    }
}

/// Finds the most specific failure classification in an error chain.
pub fn classify_failure(err: &anyhow::Error) -> FailureKind {
    for cause in err.chain() {
        if let Some(wait_err) = cause.downcast_ref::<WaitError>() {
            return match wait_err {
                WaitError::Timeout { .. } => FailureKind::Timeout,
                WaitError::Refresh(inner) => classify_failure(inner),
                WaitError::NotFound { .. } => FailureKind::Aws(AwsErrorKind::NotFound),
                WaitError::UnexpectedStatus { .. } => FailureKind::Other,
            };
        }
        if let Some(aws_err) = cause.downcast_ref::<AwsError>() {
            return FailureKind::Aws(aws_err.kind());
        }
        if cause.downcast_ref::<IdError>().is_some() {
            return FailureKind::Invalid;
        }
    }
    FailureKind::Other
}

fn decode<T: serde::de::DeserializeOwned>(what: &str, body: &str) -> anyhow::Result<T> {
    RON.from_str(body)
        .map_err(|e| anyhow::Error::new(e).context(format!("Failed to decode {what}")))
}

fn encode_state<S: Serialize>(state: &S) -> anyhow::Result<String> {
    Ok(RON.to_string_pretty(state, PrettyConfig::default())?)
}

fn applied<I: ResourceId, S: Serialize>(data: &ResourceData<I, S>) -> anyhow::Result<Response> {
    Ok(Response::Applied {
        id:    data.id.to_string(),
        state: encode_state(&data.state)?,
    })
}

/// Decodes the typed inputs of `verb`, runs it against `connector`, and
/// encodes the outcome. Errors never escape; they become `Response::Failed`.
pub async fn dispatch<C: ResourceConnector>(connector: &C, verb: Verb) -> Response {
    let verb_name = verb.name();
    match run_verb(connector, verb).await {
        Ok(response) => response,
        Err(Failure::Invalid(e)) => {
            tracing::warn!(resource = connector.type_name(), verb = verb_name, "Invalid request: {:#}", e);
            Response::failed(FailureKind::Invalid, &e)
        }
        Err(Failure::Failed(e)) => {
            let kind = classify_failure(&e);
            tracing::error!(resource = connector.type_name(), verb = verb_name, ?kind, "{:#}", e);
            Response::failed(kind, &e)
        }
    }
}

enum Failure {
    Invalid(anyhow::Error),
    Failed(anyhow::Error),
}

trait InvalidExt<T> {
    fn invalid(self) -> Result<T, Failure>;
}

impl<T> InvalidExt<T> for anyhow::Result<T> {
    fn invalid(self) -> Result<T, Failure> {
        self.map_err(Failure::Invalid)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(e: anyhow::Error) -> Self {
        Failure::Failed(e)
    }
}

fn parse_id<I: ResourceId>(id: &str) -> Result<I, Failure> {
    I::parse(id).map_err(|e| Failure::Invalid(e.into()))
}

async fn run_verb<C: ResourceConnector>(connector: &C, verb: Verb) -> Result<Response, Failure> {
    match verb {
        Verb::Validate { config } => {
            let config: C::Config = decode("config", &config).invalid()?;
            connector.validate(&config).invalid()?;
            Ok(Response::Valid)
        }
        Verb::Plan { current, desired } => {
            let current: C::State = decode("current state", &current).invalid()?;
            let desired: C::Config = decode("desired config", &desired).invalid()?;
            connector.validate(&desired).invalid()?;
            let replace = connector
                .replacement_fields(&current, &desired)
                .into_iter()
                .map(String::from)
                .collect();
            Ok(Response::Plan { replace })
        }
        Verb::Create { config } => {
            let config: C::Config = decode("config", &config).invalid()?;
            connector.validate(&config).invalid()?;
            let data = connector.create(&config).await?;
            Ok(applied(&data)?)
        }
        Verb::Read { id } => {
            let id: C::Id = parse_id(&id)?;
            match connector.read(&id).await? {
                Some(state) => Ok(applied(&ResourceData { id, state })?),
                None => Ok(Response::Gone),
            }
        }
        Verb::Update { id, current, desired } => {
            let id: C::Id = parse_id(&id)?;
            let current: C::State = decode("current state", &current).invalid()?;
            let desired: C::Config = decode("desired config", &desired).invalid()?;
            connector.validate(&desired).invalid()?;
            let state = connector.update(&id, &current, &desired).await?;
            Ok(applied(&ResourceData { id, state })?)
        }
        Verb::Delete { id } => {
            let id: C::Id = parse_id(&id)?;
            connector.delete(&id).await?;
            Ok(Response::Deleted)
        }
        Verb::Import { id } => match connector.import(&id).await? {
            Some(data) => Ok(applied(&data)?),
            None => Ok(Response::Gone),
        },
    }
}
