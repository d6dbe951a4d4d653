use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Maximum number of captured path variables before heap allocation.
/// Most REST paths bind well under 8 variables across all template hops.
pub const MAX_INLINE_VARS: usize = 8;

/// Stack-allocated storage for captured path variables.
///
/// Variable names come from the compiled pattern and are shared as `Arc<str>`;
/// values are per-request captures and stay percent-encoded.
pub type VarVec = SmallVec<[(Arc<str>, String); MAX_INLINE_VARS]>;

/// Default expression for a template variable: one path segment, lazily.
const DEFAULT_VAR_EXPR: &str = "[^/]+?";

static VAR_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("variable name regex is valid")
});

/// Error raised when a URI template cannot be compiled.
#[derive(Debug, Error)]
pub enum InvalidTemplate {
    #[error("'}}' is only allowed as the end of a variable name in \"{template}\" (position {pos})")]
    StrayClose { template: String, pos: usize },
    #[error("a variable must not contain an extra '{{' in \"{template}\" (position {pos})")]
    NestedOpen { template: String, pos: usize },
    #[error("empty variable name at position {pos} of \"{template}\"")]
    EmptyName { template: String, pos: usize },
    #[error("invalid variable name \"{name}\" in \"{template}\"")]
    BadName { template: String, name: String },
    #[error("no '}}' found after '{{' at position {pos} of \"{template}\"")]
    Unterminated { template: String, pos: usize },
    #[error("matrix parameters are not allowed in a path template: \"{template}\"")]
    MatrixParameter { template: String },
    #[error("invalid variable expression in \"{template}\"")]
    BadExpression {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// The portion of a request path not yet consumed by any matched template.
///
/// Stored without a leading slash and with matrix parameters (`;name=value`
/// segment suffixes) stripped. The resolution stages treat `""` and `"/"` as
/// "nothing left to match".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainingPath(String);

impl RemainingPath {
    /// Normalizes an incoming (still percent-encoded) path: drops the leading
    /// slash and removes matrix parameters from every segment.
    pub fn new(path: &str) -> Self {
        let path = path.strip_prefix('/').unwrap_or(path);
        if !path.contains(';') {
            return RemainingPath(path.to_string());
        }
        let trailing = path.ends_with('/');
        let mut cleaned = path
            .split('/')
            .map(|segment| segment.split(';').next().unwrap_or(segment))
            .collect::<Vec<_>>()
            .join("/");
        if trailing && !cleaned.ends_with('/') {
            cleaned.push('/');
        }
        RemainingPath(cleaned)
    }

    /// Wraps a path that is already normalized (used for match remainders).
    pub(crate) fn from_normalized(path: String) -> Self {
        RemainingPath(path)
    }

    /// True if there is nothing left to match.
    #[must_use]
    pub fn is_empty_or_slash(&self) -> bool {
        self.0.is_empty() || self.0 == "/"
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemainingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// Result of one successful match attempt against a [`PathPattern`].
#[derive(Debug, Clone)]
pub struct PathMatch {
    /// Captured variables in template order; values stay percent-encoded.
    pub vars: VarVec,
    /// The part of the input consumed by the template's own segments.
    pub matched: String,
    /// The leftover path, handed to the next resolution stage.
    pub remainder: RemainingPath,
}

/// A compiled, immutable URI template.
///
/// Equality is defined by compiled pattern string equality, which is what the
/// registry uses to detect duplicate root registrations and what the walker
/// uses to tell verb overloads on one template apart from genuine conflicts.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Arc<Regex>,
    var_names: Vec<Arc<str>>,
    empty_or_slash: bool,
    literal_chars: usize,
}

impl PathPattern {
    /// Compiles a URI template.
    ///
    /// The template is translated segment-wise into a regex: literal
    /// characters are escaped, each `{name}` becomes `([^/]+?)` and each
    /// `{name: expr}` becomes `(expr)`. A `/(.*)` remainder group is appended
    /// so every match also reports the leftover path.
    pub fn compile(template: &str) -> Result<PathPattern, InvalidTemplate> {
        let stripped = template.strip_prefix('/').unwrap_or(template);
        let mut body = String::with_capacity(stripped.len() + 8);
        let mut var_names: Vec<Arc<str>> = Vec::new();
        let mut literal_chars = 0usize;

        let chars: Vec<(usize, char)> = stripped.char_indices().collect();
        let mut i = 0;
        while i < chars.len() {
            let (pos, c) = chars[i];
            match c {
                '{' => {
                    i = Self::compile_variable(
                        template, stripped, &chars, i, &mut body, &mut var_names,
                    )?;
                }
                '}' => {
                    return Err(InvalidTemplate::StrayClose {
                        template: template.to_string(),
                        pos,
                    });
                }
                ';' => {
                    return Err(InvalidTemplate::MatrixParameter {
                        template: template.to_string(),
                    });
                }
                '/' => {
                    body.push('/');
                    literal_chars += 1;
                }
                _ => {
                    body.push_str(&regex::escape(&c.to_string()));
                    literal_chars += 1;
                }
            }
            i += 1;
        }

        // Implicit remainder group: "a" becomes "^a/(.*)$".
        let mut pattern = String::with_capacity(body.len() + 8);
        pattern.push('^');
        pattern.push_str(&body);
        if !body.is_empty() && !stripped.ends_with('/') {
            pattern.push('/');
        }
        pattern.push_str("(.*)$");

        let regex = Regex::new(&pattern).map_err(|source| InvalidTemplate::BadExpression {
            template: template.to_string(),
            source,
        })?;

        let empty_or_slash = template.is_empty() || template == "/";
        let normalized = format!("/{}", stripped.trim_end_matches('/'));

        Ok(PathPattern {
            template: normalized,
            regex: Arc::new(regex),
            var_names,
            empty_or_slash,
            literal_chars,
        })
    }

    /// Parses one `{name}` or `{name: expr}` variable starting at the `{`.
    /// Returns the index of the closing `}`.
    fn compile_variable(
        template: &str,
        stripped: &str,
        chars: &[(usize, char)],
        open: usize,
        body: &mut String,
        var_names: &mut Vec<Arc<str>>,
    ) -> Result<usize, InvalidTemplate> {
        let open_pos = chars[open].0;
        let mut i = open + 1;
        while i < chars.len() {
            let (_, c) = chars[i];
            if c == '{' {
                return Err(InvalidTemplate::NestedOpen {
                    template: template.to_string(),
                    pos: chars[i].0,
                });
            }
            if c == '}' {
                let inner = &stripped[open_pos + 1..chars[i].0];
                let (name, expr) = match inner.split_once(':') {
                    Some((name, expr)) => (name.trim(), Some(expr.trim())),
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return Err(InvalidTemplate::EmptyName {
                        template: template.to_string(),
                        pos: open_pos,
                    });
                }
                if !VAR_NAME.is_match(name) {
                    return Err(InvalidTemplate::BadName {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                body.push('(');
                match expr {
                    Some(expr) if !expr.is_empty() => {
                        body.push_str(&neutralize_groups(expr));
                    }
                    _ => body.push_str(DEFAULT_VAR_EXPR),
                }
                body.push(')');
                var_names.push(Arc::from(name));
                return Ok(i);
            }
            i += 1;
        }
        Err(InvalidTemplate::Unterminated {
            template: template.to_string(),
            pos: open_pos,
        })
    }

    /// Attempts to match the given remaining path.
    ///
    /// A trailing slash is appended to the path before matching (the compiled
    /// regex expects segment boundaries) and removed again from the remainder
    /// unless the input naturally carried one.
    #[must_use]
    pub fn matches(&self, path: &RemainingPath) -> Option<PathMatch> {
        let raw = path.as_str();
        let mut appended = false;
        let given: std::borrow::Cow<'_, str> = if !raw.is_empty() && !raw.ends_with('/') {
            appended = true;
            std::borrow::Cow::Owned(format!("{raw}/"))
        } else {
            std::borrow::Cow::Borrowed(raw)
        };

        let caps = self.regex.captures(&given)?;

        let mut vars = VarVec::new();
        for (idx, name) in self.var_names.iter().enumerate() {
            if let Some(group) = caps.get(idx + 1) {
                vars.push((Arc::clone(name), group.as_str().to_string()));
            }
        }

        let remainder_group = caps
            .get(self.var_names.len() + 1)
            .map(|g| g.as_str())
            .unwrap_or_default();
        let mut remainder = remainder_group.to_string();
        if appended && remainder.ends_with('/') {
            remainder.pop();
        }

        let mut matched_len = given.len() - remainder_group.len();
        if matched_len > 0 && given.as_bytes()[matched_len - 1] == b'/' {
            matched_len -= 1;
        }
        let matched = given[..matched_len].to_string();

        Some(PathMatch {
            vars,
            matched,
            remainder: RemainingPath::from_normalized(remainder),
        })
    }

    /// True if the pattern matches the path leaving no remainder, i.e. the
    /// template consumes the whole remaining path.
    #[must_use]
    pub fn matches_with_empty(&self, path: &RemainingPath) -> bool {
        self.matches(path)
            .map(|m| m.remainder.is_empty_or_slash())
            .unwrap_or(false)
    }

    /// Whether the literal template was `""` or `"/"`.
    #[must_use]
    pub fn is_empty_or_slash(&self) -> bool {
        self.empty_or_slash
    }

    /// Number of non-variable characters, used only for specificity ranking.
    #[must_use]
    pub fn literal_char_count(&self) -> usize {
        self.literal_chars
    }

    /// Number of named variables, the specificity tie-breaker.
    #[must_use]
    pub fn capturing_group_count(&self) -> usize {
        self.var_names.len()
    }

    /// The normalized template: leading slash, no trailing slash.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

}

/// Rewrites capturing groups in a user-supplied variable expression to
/// non-capturing ones. Each variable must contribute exactly one capturing
/// group, otherwise later variables and the remainder group would bind the
/// wrong captures. Escaped parentheses, groups already starting with `(?` and
/// parentheses inside character classes are left alone.
fn neutralize_groups(expr: &str) -> String {
    let mut out = String::with_capacity(expr.len() + 4);
    let mut chars = expr.chars().peekable();
    let mut escaped = false;
    let mut in_class = false;
    while let Some(c) = chars.next() {
        out.push(c);
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '(' if !in_class && chars.peek() != Some(&'?') => out.push_str("?:"),
            _ => {}
        }
    }
    out
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for PathPattern {}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
