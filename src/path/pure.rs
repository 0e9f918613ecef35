//! Lexical posix path algebra
//!
//! `PurePosixPath` never touches a filesystem. Parsing normalizes the string
//! (repeated separators collapse, `.` components vanish, trailing separators
//! are dropped) but `..` is kept, because resolving it would need real
//! directory knowledge.

use std::fmt;
use std::ops::Div;
use std::str::FromStr;

use glob::Pattern;

use super::PathError;

const SEP: char = '/';

/// Compile a shell pattern with `fnmatch` semantics.
///
/// There is no recursive wildcard: any run of `*` outside a `[...]` class
/// means a single `*`.
pub fn shell_pattern(pattern: &str) -> Result<Pattern, glob::PatternError> {
    let mut collapsed = String::with_capacity(pattern.len());
    // (chars seen inside the class, class is negated)
    let mut class: Option<(usize, bool)> = None;
    let mut prev_star = false;
    for c in pattern.chars() {
        match class {
            Some((seen, negated)) => {
                let members = if negated { seen - 1 } else { seen };
                class = match c {
                    ']' if members > 0 => None,
                    '!' if seen == 0 => Some((1, true)),
                    _ => Some((seen + 1, negated)),
                };
                prev_star = false;
            }
            None if c == '*' && prev_star => continue,
            None => {
                if c == '[' {
                    class = Some((0, false));
                }
                prev_star = c == '*';
            }
        }
        collapsed.push(c);
    }
    Pattern::new(&collapsed)
}

/// Root of a posix path. Exactly two leading slashes are implementation
/// defined by POSIX and therefore preserved; any other count collapses to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Root {
    None,
    Single,
    Double,
}

impl Root {
    fn as_str(&self) -> &'static str {
        match self {
            Root::None => "",
            Root::Single => "/",
            Root::Double => "//",
        }
    }
}

/// A normalized, purely lexical posix path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PurePosixPath {
    root: Root,
    parts: Vec<String>,
}

impl PurePosixPath {
    pub fn new(path: &str) -> Self {
        let trimmed = path.trim_start_matches(SEP);
        let root = match path.len() - trimmed.len() {
            0 => Root::None,
            2 => Root::Double,
            _ => Root::Single,
        };
        let parts = trimmed
            .split(SEP)
            .filter(|p| !p.is_empty() && *p != ".")
            .map(str::to_string)
            .collect();
        Self { root, parts }
    }

    fn from_parts(root: Root, parts: Vec<String>) -> Self {
        Self { root, parts }
    }

    /// Path components, with the root (if any) reported as the first one
    pub fn parts(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(self.parts.len() + 1);
        if self.root != Root::None {
            parts.push(self.root.as_str().to_string());
        }
        parts.extend(self.parts.iter().cloned());
        parts
    }

    /// The root, `"/"`, `"//"` or `""` for relative paths
    pub fn anchor(&self) -> &'static str {
        self.root.as_str()
    }

    /// Final component, or `""` for the root and for `.`
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }

    /// Final extension of the name including its dot, or `""`
    pub fn suffix(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(i) if 0 < i && i < name.len() - 1 => &name[i..],
            _ => "",
        }
    }

    /// All extensions of the name, in order
    pub fn suffixes(&self) -> Vec<String> {
        let name = self.name();
        if name.ends_with('.') {
            return Vec::new();
        }
        name.trim_start_matches('.')
            .split('.')
            .skip(1)
            .map(|s| format!(".{}", s))
            .collect()
    }

    /// Name without its final extension
    pub fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(i) if 0 < i && i < name.len() - 1 => &name[..i],
            _ => name,
        }
    }

    /// Logical parent. The parent of the root or of `.` is itself.
    pub fn parent(&self) -> Self {
        if self.parts.is_empty() {
            return self.clone();
        }
        Self::from_parts(self.root, self.parts[..self.parts.len() - 1].to_vec())
    }

    /// Every logical ancestor, nearest first and root-most last
    pub fn parents(&self) -> Vec<Self> {
        (0..self.parts.len())
            .rev()
            .map(|len| Self::from_parts(self.root, self.parts[..len].to_vec()))
            .collect()
    }

    pub fn is_absolute(&self) -> bool {
        self.root != Root::None
    }

    pub fn with_name(&self, name: &str) -> Result<Self, PathError> {
        if self.name().is_empty() {
            return Err(PathError::EmptyName(self.to_string()));
        }
        if name.is_empty() || name == "." || name.contains(SEP) {
            return Err(PathError::InvalidName(name.to_string()));
        }
        let mut parts = self.parts.clone();
        if let Some(last) = parts.last_mut() {
            *last = name.to_string();
        }
        Ok(Self::from_parts(self.root, parts))
    }

    /// Replace the final extension, or append one when there is none.
    /// An empty `suffix` removes the extension.
    pub fn with_suffix(&self, suffix: &str) -> Result<Self, PathError> {
        if suffix.contains(SEP) || (!suffix.is_empty() && !suffix.starts_with('.')) || suffix == "." {
            return Err(PathError::InvalidSuffix(suffix.to_string()));
        }
        let name = self.name();
        if name.is_empty() {
            return Err(PathError::EmptyName(self.to_string()));
        }
        let old_suffix = self.suffix();
        let name = format!("{}{}", &name[..name.len() - old_suffix.len()], suffix);
        self.with_name(&name)
    }

    /// Replace the stem, keeping the final extension
    pub fn with_stem(&self, stem: &str) -> Result<Self, PathError> {
        self.with_name(&format!("{}{}", stem, self.suffix()))
    }

    /// Append `other`; an absolute `other` replaces the path entirely
    pub fn join(&self, other: &PurePosixPath) -> Self {
        if other.is_absolute() {
            return other.clone();
        }
        let mut parts = self.parts.clone();
        parts.extend(other.parts.iter().cloned());
        Self::from_parts(self.root, parts)
    }

    pub fn join_str(&self, other: &str) -> Self {
        self.join(&Self::new(other))
    }

    /// Path relative to the ancestor `other`
    pub fn relative_to(&self, other: &PurePosixPath) -> Result<Self, PathError> {
        if self.root != other.root || !self.parts.starts_with(&other.parts) {
            return Err(PathError::NotRelative {
                path: self.to_string(),
                other: other.to_string(),
            });
        }
        Ok(Self::from_parts(
            Root::None,
            self.parts[other.parts.len()..].to_vec(),
        ))
    }

    pub fn is_relative_to(&self, other: &PurePosixPath) -> bool {
        self.relative_to(other).is_ok()
    }

    /// Shell-style match anchored at the right: a relative pattern matches
    /// the trailing components, an absolute one must match the whole path.
    pub fn matches(&self, pattern: &str) -> Result<bool, PathError> {
        let pattern = Self::new(pattern);
        let pat_parts = pattern.parts();
        if pat_parts.is_empty() {
            return Err(PathError::EmptyPattern);
        }
        let parts = self.parts();
        if pattern.is_absolute() {
            if pat_parts.len() != parts.len() {
                return Ok(false);
            }
        } else if pat_parts.len() > parts.len() {
            return Ok(false);
        }
        for (part, pat) in parts.iter().rev().zip(pat_parts.iter().rev()) {
            let pat = shell_pattern(pat).map_err(|e| PathError::InvalidPattern(e.to_string()))?;
            if !pat.matches(part) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for PurePosixPath {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for PurePosixPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root == Root::None && self.parts.is_empty() {
            return f.write_str(".");
        }
        write!(f, "{}{}", self.root.as_str(), self.parts.join("/"))
    }
}

impl FromStr for PurePosixPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for PurePosixPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Div<&str> for &PurePosixPath {
    type Output = PurePosixPath;

    fn div(self, rhs: &str) -> PurePosixPath {
        self.join_str(rhs)
    }
}

impl Div<&str> for PurePosixPath {
    type Output = PurePosixPath;

    fn div(self, rhs: &str) -> PurePosixPath {
        self.join_str(rhs)
    }
}
