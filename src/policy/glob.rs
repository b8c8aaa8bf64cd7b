//! Glob compilation for changed-file predicates
//!
//! Workflow `paths` filters are globs; policy-bot's `changed_files` predicate
//! takes regular expressions. Each glob is validated with `globset` and then
//! translated into an anchored regex that uses only syntax shared by Rust's
//! `regex` and Go's RE2, since policy-bot evaluates the emitted pattern.
//!
//! | Glob        | Matches                                  |
//! |-------------|------------------------------------------|
//! | `*`         | any run of characters except `/`         |
//! | `**/`       | zero or more leading directories         |
//! | `/**`       | everything below a directory             |
//! | `?`         | one character except `/`                 |
//! | `[a-z]`     | character class (`[!…]` / `[^…]` negate) |
//! | `{a,b}`     | alternation                              |

use crate::error::InvalidGlobsError;
use crate::policy::types::PathRegex;
use globset::GlobBuilder;

/// A glob together with its compiled regex equivalent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatcher {
    glob: String,
    regex: PathRegex,
}

impl GlobMatcher {
    /// Compile a single glob
    pub fn new(glob: &str) -> Result<Self, InvalidGlobsError> {
        compile(glob).ok_or_else(|| InvalidGlobsError::new(vec![glob.to_string()]))
    }

    /// The source glob
    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// The anchored regex the glob compiles to
    pub fn as_regex(&self) -> &PathRegex {
        &self.regex
    }

    /// Check if a repository-relative path matches
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn into_regex(self) -> PathRegex {
        self.regex
    }
}

/// Compile a batch of globs.
///
/// Every glob is attempted. If any fail, the error lists all of the failing
/// globs in input order and no matchers are returned.
pub fn compile_globs<S: AsRef<str>>(globs: &[S]) -> Result<Vec<GlobMatcher>, InvalidGlobsError> {
    let mut compiled = Vec::with_capacity(globs.len());
    let mut invalid = Vec::new();

    for glob in globs {
        let glob = glob.as_ref();
        match compile(glob) {
            Some(matcher) => compiled.push(matcher),
            None => invalid.push(glob.to_string()),
        }
    }

    if invalid.is_empty() {
        Ok(compiled)
    } else {
        Err(InvalidGlobsError::new(invalid))
    }
}

fn compile(glob: &str) -> Option<GlobMatcher> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .ok()?;
    let regex = PathRegex::new(&glob_to_regex(glob)?).ok()?;
    Some(GlobMatcher {
        glob: glob.to_string(),
        regex,
    })
}

fn glob_to_regex(glob: &str) -> Option<String> {
    let chars: Vec<char> = glob.chars().collect();
    let mut re = String::from("^");
    let mut in_alternation = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                let component_start = i == 0
                    || chars[i - 1] == '/'
                    || (in_alternation && matches!(chars[i - 1], '{' | ','));
                i += 2;
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                if component_start && chars.get(i) == Some(&'/') {
                    re.push_str("(?:.*/)?");
                    i += 1;
                } else {
                    re.push_str(".*");
                }
                continue;
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '[' => {
                let (class, next) = translate_class(&chars, i)?;
                re.push_str(&class);
                i = next;
                continue;
            }
            '{' if !in_alternation => {
                in_alternation = true;
                re.push_str("(?:");
            }
            ',' if in_alternation => re.push('|'),
            '}' if in_alternation => {
                in_alternation = false;
                re.push(')');
            }
            '\\' => {
                i += 1;
                push_literal(&mut re, *chars.get(i)?);
            }
            _ => push_literal(&mut re, c),
        }
        i += 1;
    }

    if in_alternation {
        return None;
    }
    re.push('$');
    Some(re)
}

fn push_literal(re: &mut String, c: char) {
    re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
}

fn push_class_member(body: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        body.push('\\');
    }
    body.push(c);
}

/// Translate the class starting at `chars[start] == '['`.
///
/// Returns the regex class and the index just past the closing `]`.
fn translate_class(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start + 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut body = String::new();
    let mut first = true;
    loop {
        let c = *chars.get(i)?;
        if c == ']' && !first {
            break;
        }
        first = false;

        let is_range = chars.get(i + 1) == Some(&'-') && chars.get(i + 2).is_some_and(|&e| e != ']');
        if is_range {
            push_class_member(&mut body, c);
            body.push('-');
            push_class_member(&mut body, chars[i + 2]);
            i += 3;
        } else {
            push_class_member(&mut body, c);
            i += 1;
        }
    }

    let class = if negated {
        format!("[^/{body}]")
    } else {
        format!("[{body}]")
    };
    Some((class, i + 1))
}
