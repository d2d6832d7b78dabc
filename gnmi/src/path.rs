// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration paths.
//!
//! String form: `[<origin>:]<elem>(/<elem>)*` with `<elem> := <name>([<key>=<value>])*`.
//! Key values may contain `/` and `:`; a literal `]` or `\` inside a value is written escaped
//! with a backslash.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Write};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::errors::GnmiError;
use crate::proto;

/// One element of a [`Path`]: a node name and, for keyed list entries, the key leaves.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathElem {
    pub name: String,
    pub keys: BTreeMap<String, String>,
}

impl PathElem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(key.into(), value.into());
        self
    }

    fn check(&self) -> Result<(), &'static str> {
        if self.name.is_empty() {
            return Err("empty element name");
        }
        if self.name.contains(['/', '[', ']']) {
            return Err("element name contains a reserved character");
        }
        if self
            .keys
            .keys()
            .any(|k| k.is_empty() || k.contains(['=', ']', '[']))
        {
            return Err("invalid key name");
        }
        Ok(())
    }
}

/// A configuration path. Two paths are equal iff their element sequences are; the origin
/// only qualifies the schema module of the first element.
#[derive(Clone, Debug, Default)]
pub struct Path {
    origin: Option<String>,
    elems: Vec<PathElem>,
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.elems == other.elems
    }
}
impl Eq for Path {}
impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.elems.hash(state);
    }
}
impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Path {
    fn cmp(&self, other: &Self) -> Ordering {
        self.elems.cmp(&other.elems)
    }
}

impl Path {
    /// The empty (root) path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from elements, rejecting malformed ones.
    pub fn from_elems(
        origin: Option<String>,
        elems: impl IntoIterator<Item = PathElem>,
    ) -> Result<Self, GnmiError> {
        let path = Self {
            origin: origin.filter(|o| !o.is_empty()),
            elems: elems.into_iter().collect(),
        };
        path.check()?;
        Ok(path)
    }

    pub fn parse(input: &str) -> Result<Self, GnmiError> {
        Parser::new(input).parse()
    }

    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    #[must_use]
    pub fn elems(&self) -> &[PathElem] {
        &self.elems
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// A copy of this path extended with a plain child element.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.elems.push(PathElem::new(name));
        child
    }

    /// A copy of this path extended with a keyed list entry element.
    #[must_use]
    pub fn entry(&self, list: &str, keys: BTreeMap<String, String>) -> Self {
        let mut child = self.clone();
        child.elems.push(PathElem {
            name: list.to_string(),
            keys,
        });
        child
    }

    /// Concatenate `suffix` to this path. Both must be well-formed; an origin on the suffix
    /// must agree with ours.
    pub fn join(&self, suffix: &Path) -> Result<Self, GnmiError> {
        self.check()?;
        suffix.check()?;
        let origin = match (&self.origin, &suffix.origin) {
            (Some(a), Some(b)) if a != b => {
                return Err(GnmiError::InvalidPath {
                    path: format!("{self} + {suffix}"),
                    reason: "conflicting origins",
                });
            }
            (Some(a), _) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let mut elems = self.elems.clone();
        elems.extend(suffix.elems.iter().cloned());
        Ok(Self { origin, elems })
    }

    /// True iff the elements of `prefix` (names and keys) are a literal prefix of ours.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &Path) -> bool {
        self.elems.starts_with(&prefix.elems)
    }

    fn check(&self) -> Result<(), GnmiError> {
        for elem in &self.elems {
            elem.check().map_err(|reason| GnmiError::InvalidPath {
                path: self.to_string(),
                reason,
            })?;
        }
        Ok(())
    }
}

impl Display for PathElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (key, value) in &self.keys {
            write!(f, "[{key}=")?;
            for c in value.chars() {
                if c == ']' || c == '\\' {
                    f.write_char('\\')?;
                }
                f.write_char(c)?;
            }
            f.write_char(']')?;
        }
        Ok(())
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{origin}:")?,
            /* a leading '/' keeps a qualified first name from reading as an origin */
            None if self.elems.first().is_some_and(|e| e.name.contains(':')) => {
                f.write_char('/')?;
            }
            None => {}
        }
        for (n, elem) in self.elems.iter().enumerate() {
            if n > 0 {
                f.write_char('/')?;
            }
            write!(f, "{elem}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = GnmiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = GnmiError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Path::parse(s)
    }
}

struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input }
    }

    fn fail(&self, reason: &'static str) -> GnmiError {
        GnmiError::InvalidPath {
            path: self.input.to_string(),
            reason,
        }
    }

    /// Split off the origin: a `:` counts only if it comes before any `/` or `[`.
    fn split_origin(&self) -> (Option<String>, &'a str) {
        let input = self.input;
        match input.find([':', '/', '[']) {
            Some(pos) if input[pos..].starts_with(':') => {
                let origin = &input[..pos];
                let origin = (!origin.is_empty()).then(|| origin.to_string());
                (origin, &input[pos + 1..])
            }
            _ => (None, input),
        }
    }

    fn parse(&self) -> Result<Path, GnmiError> {
        let (origin, rest) = self.split_origin();
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let mut elems = Vec::new();
        if rest.is_empty() {
            return Ok(Path { origin, elems });
        }

        let mut chars = rest.chars().peekable();
        loop {
            /* element name */
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '/' || c == '[' {
                    break;
                }
                if c == ']' {
                    return Err(self.fail("unbalanced ']'"));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(self.fail("empty element name"));
            }
            let mut elem = PathElem::new(name);

            /* key predicates */
            while chars.peek() == Some(&'[') {
                chars.next();
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('=') => break,
                        Some(']') => return Err(self.fail("key has no '='")),
                        Some(c) => key.push(c),
                        None => return Err(self.fail("unterminated '['")),
                    }
                }
                if key.is_empty() {
                    return Err(self.fail("empty key name"));
                }
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(c) => value.push(c),
                            None => return Err(self.fail("unterminated '['")),
                        },
                        Some(']') => break,
                        Some(c) => value.push(c),
                        None => return Err(self.fail("unterminated '['")),
                    }
                }
                if elem.keys.insert(key, value).is_some() {
                    return Err(self.fail("duplicate key"));
                }
            }
            elems.push(elem);

            match chars.next() {
                None => break,
                Some('/') => {
                    if chars.peek().is_none() {
                        return Err(self.fail("trailing '/'"));
                    }
                }
                Some(_) => return Err(self.fail("unexpected character after ']'")),
            }
        }
        Ok(Path { origin, elems })
    }
}

impl From<&Path> for proto::Path {
    fn from(path: &Path) -> Self {
        proto::Path {
            element: vec![],
            origin: path.origin.clone().unwrap_or_default(),
            elem: path
                .elems
                .iter()
                .map(|e| proto::PathElem {
                    name: e.name.clone(),
                    key: e.keys.clone(),
                })
                .collect(),
            target: String::new(),
        }
    }
}

impl TryFrom<&proto::Path> for Path {
    type Error = GnmiError;
    fn try_from(path: &proto::Path) -> Result<Self, Self::Error> {
        let origin = Some(path.origin.clone());
        if path.elem.is_empty() && !path.element.is_empty() {
            let parsed = Path::parse(&path.element.join("/"))?;
            return Path::from_elems(origin, parsed.elems);
        }
        Path::from_elems(
            origin,
            path.elem.iter().map(|e| PathElem {
                name: e.name.clone(),
                keys: e.key.clone(),
            }),
        )
    }
}
