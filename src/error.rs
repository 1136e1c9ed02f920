use crate::category::CategoryKey;

/// Which external record stream a load read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    DietLogs,
    BodyWeights,
    BodyFat,
    Measurement(i64),
    CompletedSets(i64),
    ExerciseGroups,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::DietLogs => write!(f, "Diet Logs"),
            SourceKind::BodyWeights => write!(f, "Body Measurements With Weights"),
            SourceKind::BodyFat => write!(f, "Body Measurements With Body Fat Percentage"),
            SourceKind::Measurement(id) => write!(f, "Measurement {id} Entries"),
            SourceKind::CompletedSets(id) => write!(f, "Completed Sets For Exercise {id}"),
            SourceKind::ExerciseGroups => write!(f, "Exercises With Selected Exercise Group(s)"),
        }
    }
}

/// Non-fatal reasons a single load request was abandoned.
///
/// Both variants leave the requested keys marked as loaded so the same
/// request is never retried within the session.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    EmptySource { source: SourceKind },
    NoUsableValues { keys: Vec<CategoryKey> },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::EmptySource { source } => write!(f, "No {source} Recorded"),
            LoadError::NoUsableValues { keys } => {
                let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                write!(f, "No Values Found For {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Failure to turn a string back into a [`CategoryKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    MalformedCompositeKey(String),
    UnknownStat(String),
}

impl std::fmt::Display for KeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyError::MalformedCompositeKey(key) => write!(f, "malformed composite key: {key}"),
            KeyError::UnknownStat(key) => write!(f, "unknown stat in key: {key}"),
        }
    }
}

impl std::error::Error for KeyError {}
