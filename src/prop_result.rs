//! Outcome of a single property evaluation.

use std::fmt;

use crate::error::PropertyError;

/// Status of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropStatus {
    /// The check held for the drawn values
    True,
    /// The check was falsified
    False,
    /// The draw was discarded; counts towards the discard budget only
    Undecided,
    /// The check returned an error or panicked
    Error,
    /// The check holds for every input; no further iterations are needed
    Proof,
}

impl fmt::Display for PropStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropStatus::True => "TRUE",
            PropStatus::False => "FALSE",
            PropStatus::Undecided => "UNDECIDED",
            PropStatus::Error => "ERROR",
            PropStatus::Proof => "PROOF",
        };
        f.write_str(name)
    }
}

/// One argument of a reported evaluation, rendered with `Debug`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropArg {
    pub label: String,
    /// Value after shrinking
    pub arg: String,
    /// Value as originally drawn
    pub orig_arg: String,
    /// Accepted shrink steps for this argument
    pub shrinks: usize,
}

impl fmt::Display for PropArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shrinks > 0 {
            write!(
                f,
                "{}: {} (original: {}, {} shrinks)",
                self.label, self.arg, self.orig_arg, self.shrinks
            )
        } else {
            write!(f, "{}: {}", self.label, self.arg)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropResult {
    pub status: PropStatus,
    pub error: Option<String>,
    pub error_stack: Option<String>,
    pub args: Vec<PropArg>,
    pub labels: Vec<String>,
}

impl PropResult {
    fn with_status(status: PropStatus) -> Self {
        Self {
            status,
            error: None,
            error_stack: None,
            args: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn passed() -> Self {
        Self::with_status(PropStatus::True)
    }

    pub fn failed() -> Self {
        Self::with_status(PropStatus::False)
    }

    pub fn undecided() -> Self {
        Self::with_status(PropStatus::Undecided)
    }

    pub fn proved() -> Self {
        Self::with_status(PropStatus::Proof)
    }

    /// An error outcome with an optional stack trace
    pub fn error(message: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            error: Some(message.into()),
            error_stack: stack,
            ..Self::with_status(PropStatus::Error)
        }
    }

    /// A falsification carrying a message as its label
    pub fn failed_with(message: impl Into<String>) -> Self {
        Self::failed().with_label(message)
    }

    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Self::passed()
        } else {
            Self::failed()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_args(mut self, args: Vec<PropArg>) -> Self {
        self.args = args;
        self
    }

    /// True or Proof
    pub fn success(&self) -> bool {
        matches!(self.status, PropStatus::True | PropStatus::Proof)
    }

    /// False or Error
    pub fn is_failure(&self) -> bool {
        matches!(self.status, PropStatus::False | PropStatus::Error)
    }

    pub fn is_undecided(&self) -> bool {
        self.status == PropStatus::Undecided
    }

    /// Conjunction: Error beats False beats Undecided beats True beats Proof
    pub fn and(self, other: PropResult) -> PropResult {
        fn rank(status: PropStatus) -> u8 {
            match status {
                PropStatus::Error => 4,
                PropStatus::False => 3,
                PropStatus::Undecided => 2,
                PropStatus::True => 1,
                PropStatus::Proof => 0,
            }
        }
        Self::merge(self, other, rank)
    }

    /// Disjunction: Proof beats True beats Undecided beats False beats Error
    pub fn or(self, other: PropResult) -> PropResult {
        fn rank(status: PropStatus) -> u8 {
            match status {
                PropStatus::Proof => 4,
                PropStatus::True => 3,
                PropStatus::Undecided => 2,
                PropStatus::False => 1,
                PropStatus::Error => 0,
            }
        }
        Self::merge(self, other, rank)
    }

    fn merge(a: PropResult, b: PropResult, rank: fn(PropStatus) -> u8) -> PropResult {
        let (mut winner, loser) = if rank(b.status) > rank(a.status) { (b, a) } else { (a, b) };
        winner.labels.extend(loser.labels);
        if winner.args.is_empty() {
            winner.args = loser.args;
        }
        winner
    }
}

impl fmt::Display for PropResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(error) = &self.error {
            write!(f, ": {}", error)?;
        }
        for label in &self.labels {
            write!(f, "\n  label: {}", label)?;
        }
        for arg in &self.args {
            write!(f, "\n  ARG_{}", arg)?;
        }
        Ok(())
    }
}

/// Conversion of a check's return value into an outcome
pub trait IntoPropResult {
    fn into_prop_result(self) -> PropResult;
}

impl IntoPropResult for PropResult {
    fn into_prop_result(self) -> PropResult {
        self
    }
}

impl IntoPropResult for bool {
    fn into_prop_result(self) -> PropResult {
        PropResult::from_bool(self)
    }
}

impl IntoPropResult for () {
    fn into_prop_result(self) -> PropResult {
        PropResult::passed()
    }
}

/// An empty message passes; anything else is a falsification labelled with it
impl IntoPropResult for String {
    fn into_prop_result(self) -> PropResult {
        if self.is_empty() {
            PropResult::passed()
        } else {
            PropResult::failed_with(self)
        }
    }
}

impl IntoPropResult for &str {
    fn into_prop_result(self) -> PropResult {
        self.to_string().into_prop_result()
    }
}

impl<R, E> IntoPropResult for Result<R, E>
where
    R: IntoPropResult,
    E: fmt::Display,
{
    fn into_prop_result(self) -> PropResult {
        match self {
            Ok(result) => result.into_prop_result(),
            Err(e) => PropertyError::Check(e.to_string()).into(),
        }
    }
}

/// Errors become `Error` outcomes carrying the message and any stack
impl From<PropertyError> for PropResult {
    fn from(error: PropertyError) -> Self {
        let stack = error.stack().map(str::to_string);
        PropResult::error(error.to_string(), stack)
    }
}
