//! Derived sessions and reporting
//!
//! Every operation here returns a new session (or a report) and leaves the
//! receiver untouched. Values are shared with the source session unless
//! an operation replaces them.

use super::{NamedStore, Session};
use quiver_core::{Axis, Error, LabeledArray, Result, Value, ValueKind, ELLIPSIS};
use tracing::debug;

/// Template used by [`Session::summary`] when none is given
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "{name}: {axes_names}\n    {title}\n";

/// Name matcher: prefix match, or a glob if the pattern has wildcards
enum NameMatcher {
    Prefix(String),
    Glob(glob::Pattern),
}

impl NameMatcher {
    fn new(pattern: &str) -> Result<Self> {
        if pattern.contains(['*', '?', '[']) {
            glob::Pattern::new(pattern)
                .map(NameMatcher::Glob)
                .map_err(|e| Error::InvalidPattern(format!("'{}': {}", pattern, e)))
        } else {
            Ok(NameMatcher::Prefix(pattern.to_string()))
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Prefix(prefix) => name.starts_with(prefix.as_str()),
            NameMatcher::Glob(pattern) => pattern.matches(name),
        }
    }
}

impl Session {
    /// Entries whose name matches `pattern` and whose value is of `kind`
    ///
    /// A pattern without `*`, `?` or `[` matches names starting with it;
    /// otherwise it is a glob over the whole name. Both filters are
    /// optional.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` if the glob does not parse.
    pub fn filter(&self, pattern: Option<&str>, kind: Option<ValueKind>) -> Result<Session> {
        let matcher = pattern.map(NameMatcher::new).transpose()?;
        let out = self
            .items()
            .filter(|(name, _)| matcher.as_ref().map_or(true, |m| m.matches(name)))
            .filter(|(_, value)| kind.map_or(true, |k| k.matches(value)))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        Ok(self.derive(out))
    }

    /// Replace every entry of `kind` with `f(entry)`; others pass through
    ///
    /// # Errors
    ///
    /// The first error returned by `f`.
    pub fn apply<F>(&self, kind: ValueKind, mut f: F) -> Result<Session>
    where
        F: FnMut(&Value) -> Result<Value>,
    {
        let mut out = NamedStore::with_capacity(self.len());
        for (name, value) in self.items() {
            let value = if kind.matches(value) {
                f(value)?
            } else {
                value.clone()
            };
            out.insert(name.to_string(), value);
        }
        Ok(self.derive(out))
    }

    /// [`apply`](Self::apply) restricted to arrays
    pub fn apply_arrays<F>(&self, mut f: F) -> Result<Session>
    where
        F: FnMut(&LabeledArray) -> Result<LabeledArray>,
    {
        self.apply(ValueKind::Array, |value| match value.as_array() {
            Some(array) => f(array).map(Value::from),
            None => Ok(value.clone()),
        })
    }

    /// Reorder the axes of every array
    ///
    /// Axes an array does not have are ignored for that array, so one
    /// order can be applied to arrays of different dimensions. `"..."`
    /// stands for the unlisted axes. Other entries are kept as they are.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if an axis is listed twice or `"..."` appears twice.
    pub fn transpose(&self, order: &[&str]) -> Result<Session> {
        self.apply_arrays(|array| {
            let own: Vec<&str> = order
                .iter()
                .copied()
                .filter(|axis| *axis == ELLIPSIS || array.has_axis(axis))
                .collect();
            array.transpose(&own)
        })
    }

    /// Drop constant axes of every array
    pub fn compact(&self) -> Session {
        let out = self
            .items()
            .map(|(name, value)| {
                let compacted = value.as_array().and_then(|array| array.compact());
                let value = match compacted {
                    Some((array, removed)) => {
                        debug!(target: "quiver::session", name, removed = ?removed, "Compacted entry");
                        Value::from(array)
                    }
                    None => value.clone(),
                };
                (name.to_string(), value)
            })
            .collect();
        self.derive(out)
    }

    fn compare_entries<'a>(&'a self, other: &'a Session) -> (Vec<&'a str>, Vec<bool>) {
        let mut names: Vec<&'a str> = self.keys().collect();
        names.extend(other.keys().filter(|name| !self.contains(name)));
        let flags = names
            .iter()
            .map(|name| match (self.entries.get(name), other.entries.get(name)) {
                (Some(a), Some(b)) => a.nan_equals(b),
                _ => false,
            })
            .collect();
        (names, flags)
    }

    /// Per-entry equality with `other`, as a boolean array along axis `name`
    ///
    /// Labels are this session's names, then `other`'s extra names. NaN
    /// equals NaN; a name present on one side only is `false`.
    pub fn array_equals(&self, other: &Session) -> Result<Value> {
        let (names, flags) = self.compare_entries(other);
        let axis = Axis::new("name", names)?;
        Ok(Value::from(LabeledArray::from_bools(vec![axis], flags)?))
    }

    /// True if both sessions hold the same names with equal values
    pub fn equals(&self, other: &Session) -> bool {
        self.compare_entries(other).1.into_iter().all(|eq| eq)
    }

    /// One formatted block per array
    ///
    /// `template` may use `{name}`, `{axes_names}` and `{title}`. Blocks
    /// are joined with a newline.
    pub fn summary(&self, template: Option<&str>) -> String {
        let template = template.unwrap_or(DEFAULT_SUMMARY_TEMPLATE);
        self.items()
            .filter_map(|(name, value)| {
                let array = value.as_array()?;
                let axes_names = array.display_names();
                Some(render_template(
                    template,
                    &[("name", name), ("axes_names", &axes_names), ("title", array.title())],
                ))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Owned `(name, value)` pairs for the caller to bind
    ///
    /// With `names`, only those entries, in the requested order.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for a requested name that is not stored.
    pub fn export(&self, names: Option<&[&str]>) -> Result<Vec<(String, Value)>> {
        match names {
            Some(names) => names
                .iter()
                .map(|name| Ok((name.to_string(), self.get(name)?.clone())))
                .collect(),
            None => Ok(self
                .items()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect()),
        }
    }
}

/// Fill the `{field}` placeholders of `template` in a single pass
///
/// Inserted values are never scanned again. Unknown fields and unmatched
/// braces are copied through.
fn render_template(template: &str, fields: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let field = after.find('}').and_then(|end| {
            let key = &after[..end];
            fields
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match field {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
