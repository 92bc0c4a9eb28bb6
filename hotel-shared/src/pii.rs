use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Number of trailing characters left visible when a value is printed.
const VISIBLE_TAIL: usize = 2;

/// Wraps guest data (emails, document numbers, phones) so that `tracing`
/// output never carries the full value.
///
/// `Debug` and `Display` print a mask that keeps only the last two
/// characters; serialization passes the real value through, because API
/// responses to the back-office need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T: AsRef<str>> Masked<T> {
    fn masked(&self) -> String {
        let value = self.0.as_ref();
        let count = value.chars().count();
        if count <= VISIBLE_TAIL {
            return "*".repeat(count.max(1));
        }
        let tail: String = value.chars().skip(count - VISIBLE_TAIL).collect();
        format!("{}{}", "*".repeat(count - VISIBLE_TAIL), tail)
    }
}

impl<T: AsRef<str>> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.masked())
    }
}

impl<T: AsRef<str>> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
