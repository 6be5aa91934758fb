use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Most recent execution of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// Browsable URL of the build
    pub full_url: String,
    /// Build number as reported by the CI server
    pub number: BuildNumber,
}

/// Build numbers arrive as integers from Jenkins but some servers send strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildNumber {
    Int(i64),
    Text(String),
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One stage of a build flow.
///
/// Unknown fields sent by the status provider are kept in `extra` so that two
/// snapshots only compare equal when every field matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Graph node key; filled from the snapshot key when the record omits it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Status classifier (e.g. "running", "success"); empty means stopped
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<String>,
    /// Most recent build, if the job ever ran
    #[serde(default)]
    pub build: Option<Build>,
    /// Seconds spent in the most recent build
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: Option<f64>,
    /// Direct upstream job ids
    #[serde(default, deserialize_with = "null_as_empty")]
    pub previous: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    /// Status with empty strings treated as absent.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }

    /// Duration with zero treated as absent.
    pub fn duration(&self) -> Option<f64> {
        self.duration.filter(|d| *d != 0.0)
    }
}

/// Accepts any JSON value. `null`, `false` and `0` mean no status; other scalars are
/// kept as their text.
fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Accepts numbers and numeric strings; anything else counts as no duration.
fn lenient_duration<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Whole flow state returned by one poll, keyed by job id.
///
/// Keeps document order for iteration; equality ignores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, Job>",
    into = "IndexMap<String, Job>"
)]
pub struct Snapshot {
    jobs: IndexMap<String, Job>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Jobs in the order the provider listed them.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Job)> {
        self.jobs.iter().map(|(id, job)| (id.as_str(), job))
    }
}

impl From<IndexMap<String, Job>> for Snapshot {
    fn from(mut jobs: IndexMap<String, Job>) -> Self {
        for (id, job) in &mut jobs {
            if job.id.is_empty() {
                job.id.clone_from(id);
            }
        }
        Self { jobs }
    }
}

impl From<Snapshot> for IndexMap<String, Job> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.jobs
    }
}

impl FromIterator<Job> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self {
        Self {
            jobs: iter.into_iter().map(|job| (job.id.clone(), job)).collect(),
        }
    }
}
