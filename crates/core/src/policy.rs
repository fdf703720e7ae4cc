//! Static role/resource/action policy table.
//!
//! The table is parsed once at startup from a casbin-style CSV file:
//!
//! ```text
//! # role, resource pattern, action[, effect]
//! p, admin, /v1/*, *
//! p, guest, /v1/room/{id}, GET
//! p, guest, /v1/user/*, DELETE, deny
//! ```
//!
//! Rules are evaluated top to bottom; the first rule matching
//! `(role, path, action)` decides. When nothing matches the request is denied.

use std::path::Path;

/// Errors raised while loading a policy table.
///
/// Every variant is fatal at startup: the server must not serve traffic with
/// an empty or partially parsed policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Policy line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Policy table contains no rules")]
    Empty,
}

/// Whether a matching rule grants or refuses access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Any,
}

/// A resource path pattern.
///
/// - literal segments match themselves;
/// - `*`, `{name}` and `:name` match exactly one non-empty segment;
/// - a trailing `/*` matches the prefix itself and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    open_ended: bool,
}

impl PathPattern {
    /// Parse a pattern. Patterns must be absolute (start with `/`).
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if !raw.starts_with('/') {
            return Err(format!("resource pattern '{raw}' must start with '/'"));
        }

        let mut segments: Vec<Segment> = split_path(raw)
            .into_iter()
            .map(|s| {
                let wildcard = s == "*" || s.starts_with(':') || (s.starts_with('{') && s.ends_with('}'));
                if wildcard {
                    Segment::Any
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        let open_ended = raw.ends_with("/*");
        if open_ended {
            segments.pop();
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            open_ended,
        })
    }

    /// Whether `path` (a request URI path, without query string) matches.
    pub fn matches(&self, path: &str) -> bool {
        let parts = split_path(path);

        let length_ok = if self.open_ended {
            parts.len() >= self.segments.len()
        } else {
            parts.len() == self.segments.len()
        };
        if !length_ok {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| match segment {
                Segment::Any => true,
                Segment::Literal(lit) => lit == part,
            })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// One row of the policy table.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// Role name, or `*` for any authenticated role.
    pub role: String,
    pub resource: PathPattern,
    /// HTTP method, `*`, or `|`-separated alternatives (`GET|POST`).
    pub action: String,
    pub effect: Effect,
}

impl PolicyRule {
    pub fn allow(role: &str, resource: &str, action: &str) -> Result<Self, String> {
        Ok(Self {
            role: role.to_string(),
            resource: PathPattern::parse(resource)?,
            action: action.to_string(),
            effect: Effect::Allow,
        })
    }

    fn matches(&self, role: &str, path: &str, action: &str) -> bool {
        (self.role == "*" || self.role == role)
            && self.matches_action(action)
            && self.resource.matches(path)
    }

    fn matches_action(&self, action: &str) -> bool {
        self.action == "*"
            || self
                .action
                .split('|')
                .any(|a| a.trim().eq_ignore_ascii_case(action))
    }
}

/// Immutable, first-match-wins, default-deny policy table.
///
/// Construct once at startup and share behind an `Arc`; lookups take `&self`
/// and need no synchronization.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: Vec<PolicyRule>,
}

impl PolicyEngine {
    /// Build an engine from already-parsed rules. An empty table is rejected.
    pub fn new(rules: Vec<PolicyRule>) -> Result<Self, PolicyError> {
        if rules.is_empty() {
            return Err(PolicyError::Empty);
        }
        Ok(Self { rules })
    }

    /// Parse the CSV policy format described in the module docs.
    pub fn from_csv(text: &str) -> Result<Self, PolicyError> {
        let mut rules = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            rules.push(parse_rule(line).map_err(|reason| PolicyError::Malformed {
                line: idx + 1,
                reason,
            })?);
        }

        Self::new(rules)
    }

    /// Read and parse a policy file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv(&text)
    }

    /// Whether `role` may perform `action` on `path`.
    pub fn is_allowed(&self, role: &str, path: &str, action: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.matches(role, path, action))
            .is_some_and(|rule| rule.effect == Effect::Allow)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }
}

fn parse_rule(line: &str) -> Result<PolicyRule, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    if fields[0] != "p" {
        return Err(format!("expected rule type 'p', found '{}'", fields[0]));
    }
    if !(4..=5).contains(&fields.len()) {
        return Err(format!(
            "expected 'p, role, resource, action[, effect]', found {} fields",
            fields.len()
        ));
    }

    let role = fields[1];
    let action = fields[3];
    if role.is_empty() {
        return Err("role must not be empty".into());
    }
    if action.is_empty() {
        return Err("action must not be empty".into());
    }

    let effect = match fields.get(4).map(|e| e.to_ascii_lowercase()) {
        None => Effect::Allow,
        Some(e) if e == "allow" => Effect::Allow,
        Some(e) if e == "deny" => Effect::Deny,
        Some(other) => return Err(format!("unknown effect '{other}'")),
    };

    Ok(PolicyRule {
        role: role.to_string(),
        resource: PathPattern::parse(fields[2])?,
        action: action.to_string(),
        effect,
    })
}
