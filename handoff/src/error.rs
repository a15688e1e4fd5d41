//! Error types and result definitions for handoff operations.
//!
//! [`HandoffError`] carries an [`ErrorKind`], a static description, optional dynamic detail, an
//! optional source error and the call-site location where it was raised. Several errors can be
//! aggregated into one, which is how a failed unit of work and a failed rollback are reported
//! together.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for handoff operations using [`HandoffError`] as the error type.
pub type HandoffResult<T> = Result<T, HandoffError>;

/// Detailed payload stored for single [`HandoffError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type for handoff operations.
///
/// Cloning is cheap: sources are reference counted, so the same error can be handed to several
/// observers (for example a log line and the outcome delivered to the caller).
#[derive(Debug, Clone)]
pub struct HandoffError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Multiple aggregated errors, the first one being the primary fault.
    Many {
        errors: Vec<HandoffError>,
        location: &'static Location<'static>,
    },
}

/// Categories of failures surfaced by the core.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Caller faults
    DependencyNotFound,
    Conflict,
    InvalidData,

    // Backend faults
    Unavailable,

    // Aborts
    Cancelled,
    DeadlineExceeded,

    // Transactions
    CommitFailed,
    RollbackFailed,

    // Execution
    WorkerPanic,
    OutcomeLost,
    PoolClosed,
    InvalidState,

    ConfigError,

    Unknown,
}

impl ErrorKind {
    /// Returns `true` when the fault lies with the caller's input.
    pub fn is_client_fault(self) -> bool {
        matches!(
            self,
            ErrorKind::DependencyNotFound | ErrorKind::Conflict | ErrorKind::InvalidData
        )
    }

    /// Returns `true` when the caller may retry the same call later.
    ///
    /// The core itself never retries.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Unavailable)
    }

    /// Returns `true` when the call never finished because it was cancelled or timed out.
    pub fn is_aborted(self) -> bool {
        matches!(self, ErrorKind::Cancelled | ErrorKind::DeadlineExceeded)
    }
}

impl HandoffError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the aggregate is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error, flattened.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        match self.repr {
            ErrorRepr::Single(ref payload) => &payload.description,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.description())
                .unwrap_or("no errors aggregated"),
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For aggregated errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the aggregated errors, or an empty slice for a single error.
    pub fn errors(&self) -> &[HandoffError] {
        match self.repr {
            ErrorRepr::Single(_) => &[],
            ErrorRepr::Many { ref errors, .. } => errors,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Returns `true` when the primary fault lies with the caller's input.
    pub fn is_client_fault(&self) -> bool {
        self.kind().is_client_fault()
    }

    /// Returns `true` when the primary fault is transient.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns `true` when the call was cancelled or ran past its deadline.
    pub fn is_aborted(&self) -> bool {
        self.kind().is_aborted()
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first member as the source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        HandoffError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
            }),
        }
    }
}

impl PartialEq for HandoffError {
    fn eq(&self, other: &HandoffError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => errors_a == errors_b,
            _ => false,
        }
    }
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    write!(f, "\n  Detail:")?;
                    for line in detail.lines() {
                        write!(f, "\n    {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for HandoffError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

impl From<(ErrorKind, &'static str)> for HandoffError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> HandoffError {
        HandoffError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for HandoffError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> HandoffError {
        HandoffError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates errors into one.
///
/// A vector holding exactly one error yields that error unchanged.
impl<E> From<Vec<E>> for HandoffError
where
    E: Into<HandoffError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> HandoffError {
        let location = Location::caller();

        let mut errors: Vec<HandoffError> = errors.into_iter().map(Into::into).collect();
        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }

        HandoffError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Maps a driver failure onto the persistence taxonomy.
///
/// Unique constraint violations become [`ErrorKind::Conflict`] and foreign key violations
/// [`ErrorKind::DependencyNotFound`]; everything else is treated as a transient
/// [`ErrorKind::Unavailable`] backend failure.
impl From<sqlx::Error> for HandoffError {
    #[track_caller]
    fn from(err: sqlx::Error) -> HandoffError {
        let (kind, description) = if postgres::errors::is_unique_violation(&err) {
            (ErrorKind::Conflict, "Record violates a uniqueness constraint")
        } else if postgres::errors::is_foreign_key_violation(&err) {
            // The referenced category disappeared between lookup and insert.
            (ErrorKind::DependencyNotFound, "Referenced record does not exist")
        } else {
            (ErrorKind::Unavailable, "Database operation failed")
        };

        let detail = err.to_string();
        HandoffError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl From<config::shared::ValidationError> for HandoffError {
    #[track_caller]
    fn from(err: config::shared::ValidationError) -> HandoffError {
        let detail = err.to_string();
        HandoffError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
