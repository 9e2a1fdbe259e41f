//! JSON helpers shared by requests, responses and rewriters.
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
pub use serde_json::Value;

/// A JSON object.
pub type Object = Map<String, Value>;

/// The location of a field in a GraphQL response, as a list of response keys.
///
/// Lists are transparent: a path never contains indices, and any array met while following it
/// is traversed element by element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<String>);

impl Path {
    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into())
    }

    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn join(&self, other: &Path) -> Path {
        Path(self.0.iter().chain(other.0.iter()).cloned().collect())
    }

    /// Applies `f` to every non-null value found at this path inside `value`.
    pub fn apply<E>(
        &self,
        value: &mut Value,
        f: &mut impl FnMut(Value) -> Result<Value, E>,
    ) -> Result<(), E> {
        apply_at(value, &self.0, f)
    }
}

fn apply_at<E>(
    value: &mut Value,
    path: &[String],
    f: &mut impl FnMut(Value) -> Result<Value, E>,
) -> Result<(), E> {
    match value {
        Value::Null => Ok(()),
        Value::Array(items) => items.iter_mut().try_for_each(|item| apply_at(item, path, f)),
        _ => match path.split_first() {
            None => {
                let current = std::mem::take(value);
                *value = f(current)?;
                Ok(())
            }
            Some((key, rest)) => match value
                .as_object_mut()
                .and_then(|object| object.get_mut(key))
            {
                Some(child) => apply_at(child, rest, f),
                None => Ok(()),
            },
        },
    }
}

impl<T: Into<String>> FromIterator<T> for Path {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}
