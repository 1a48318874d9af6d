//! The tracker boundary.
//!
//! Trackers speak a line protocol of `command arg=value&...` requests and
//! `OK`/`ERR` replies. This crate only depends on the decoded form: a command
//! name with ordered arguments in, a flat field map or an error code out.
//! Any transport to a real tracker plugs in through [`Tracker`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;

use thiserror::Error;

/// Error codes reported by the tracker, plus local decoding failures.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("unknown_key: {0}")]
    UnknownKey(String),

    #[error("{0}")]
    NoKey(String),

    #[error("tracker error {code}: {message}")]
    Other { code: String, message: String },

    #[error("malformed tracker response: {0}")]
    MalformedResponse(String),
}

impl TrackerError {
    /// Map a tracker `ERR <code> <message>` reply to a variant.
    ///
    /// # Examples
    ///
    /// ```
    /// use mogile_client::TrackerError;
    ///
    /// let err = TrackerError::from_code("no_key", "no_key");
    /// assert_eq!(err.to_string(), "no_key");
    /// ```
    pub fn from_code(code: &str, message: &str) -> Self {
        match code {
            "unknown_key" => TrackerError::UnknownKey(message.to_string()),
            "no_key" => TrackerError::NoKey(message.to_string()),
            _ => TrackerError::Other {
                code:    code.to_string(),
                message: message.to_string(),
            },
        }
    }

    /// The tracker's error code, if this error came from the tracker.
    pub fn code(&self) -> Option<&str> {
        match self {
            TrackerError::UnknownKey(_) => Some("unknown_key"),
            TrackerError::NoKey(_) => Some("no_key"),
            TrackerError::Other { code, .. } => Some(code),
            TrackerError::MalformedResponse(_) => None,
        }
    }
}

/// Decoded fields of a successful tracker reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerResponse {
    fields: BTreeMap<String, String>,
}

impl TrackerResponse {
    pub fn new() -> Self { Self::default() }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) {
        self.fields.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> { self.fields.get(name).map(String::as_str) }

    /// A field that must be present.
    pub fn require(&self, name: &str) -> Result<&str, TrackerError> {
        self.get(name)
            .ok_or_else(|| TrackerError::MalformedResponse(format!("missing field {name:?}")))
    }

    /// A numeric field; absent is `None`, present but not a number is an error.
    pub fn get_u64(&self, name: &str) -> Result<Option<u64>, TrackerError> {
        self.get(name)
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| {
                    TrackerError::MalformedResponse(format!("field {name:?} is not a number: {value:?}"))
                })
            })
            .transpose()
    }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for TrackerResponse {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut response = Self::new();
        for (name, value) in iter {
            response.insert(name, value);
        }
        response
    }
}

/// Issues commands against a tracker.
///
/// Implementations own connection handling, host selection and the wire
/// encoding; callers see one request and one decoded reply per call.
pub trait Tracker: Send + Sync {
    fn request(
        &self,
        command: &str,
        args: &[(&str, &str)],
    ) -> impl Future<Output = Result<TrackerResponse, TrackerError>> + Send;
}

/// One recorded call to a [`ScriptedTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerCall {
    pub command: String,
    pub args:    Vec<(String, String)>,
}

impl TrackerCall {
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A tracker that replays queued replies, for tests and offline tooling.
///
/// Replies are queued per command and consumed in order. A command with an
/// empty queue fails with code `no_script`. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedTracker {
    state: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    replies: HashMap<String, VecDeque<Result<TrackerResponse, TrackerError>>>,
    calls:   Vec<TrackerCall>,
}

impl ScriptedTracker {
    pub fn new() -> Self { Self::default() }

    /// Queue a successful reply for `command`.
    pub fn push(&self, command: &str, response: TrackerResponse) { self.enqueue(command, Ok(response)); }

    /// Queue an `ERR <code> <message>` reply for `command`.
    pub fn push_error(&self, command: &str, code: &str, message: &str) {
        self.enqueue(command, Err(TrackerError::from_code(code, message)));
    }

    fn enqueue(&self, command: &str, reply: Result<TrackerResponse, TrackerError>) {
        let mut state = self.lock();
        state.replies.entry(command.to_string()).or_default().push_back(reply);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<TrackerCall> { self.lock().calls.clone() }

    /// Calls made with `command`, in order.
    pub fn calls_to(&self, command: &str) -> Vec<TrackerCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.command == command)
            .cloned()
            .collect()
    }

    /// Replies queued but not yet consumed, across all commands.
    pub fn pending(&self) -> usize { self.lock().replies.values().map(VecDeque::len).sum() }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, command: &str, args: &[(&str, &str)]) -> Result<TrackerResponse, TrackerError> {
        let mut state = self.lock();
        state.calls.push(TrackerCall {
            command: command.to_string(),
            args:    args
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        state
            .replies
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TrackerError::Other {
                    code:    "no_script".to_string(),
                    message: format!("no reply queued for {command}"),
                })
            })
    }
}

impl Tracker for ScriptedTracker {
    fn request(
        &self,
        command: &str,
        args: &[(&str, &str)],
    ) -> impl Future<Output = Result<TrackerResponse, TrackerError>> + Send {
        let reply = self.next_reply(command, args);
        async move { reply }
    }
}
