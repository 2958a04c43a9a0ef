//! Dangerous-invocation matchers, trust globs and request rendering.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Tools whose input names a single path.
const PATH_TOOLS: &[&str] = &["write_file", "edit_file", "read_file", "list_dir"];

const SHELL_TOOL: &str = "execute_shell";

const HOME_PREFIXES: &[&str] = &["~", "$HOME"];

/// Matchers applied to shell commands (and to any other match subject).
static DANGEROUS_COMMANDS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  compile(&[
    // recursive delete of root or home
    r"\brm\s+(?:-{1,2}[\w-]+\s+)*-{1,2}[a-zA-Z]*[rR][a-zA-Z]*\b(?:\s+-{1,2}[\w-]+)*\s+(?:/|~/?|\$HOME/?)\*?(?:\s|$|;|&|\|)",
    // privilege escalation
    r"(?:^|[;&|(`]\s*|\s)(?:sudo|doas)\s",
    r"(?:^|[;&|(`]\s*)su(?:\s|$)",
    // raw device writes and filesystem creation
    r">\s*/dev/(?:sd|hd|nvme|disk|mmcblk|vd)",
    r"\bdd\b[^;&|]*\bof=/dev/",
    r"\bmkfs(?:\.\w+)?\b",
    // piping a download into a shell
    r"\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z|k|da)?sh\b",
    // fork bomb
    r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
    // world-writable root
    r"\bchmod\s+(?:-\w+\s+)*-R\s+777\s+/(?:\s|$)",
  ])
});

/// Matchers applied to normalized paths given to file tools.
static DANGEROUS_PATHS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
  compile(&[
    r"^/dev(?:/|$)",
    r"^/(?:etc|boot|sys|proc)(?:/|$)",
    r"(?:^|/)\.ssh(?:/|$)",
  ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
  patterns
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
}

fn split_home(path: &str) -> Option<(&'static str, &str)> {
  HOME_PREFIXES.iter().find_map(|prefix| {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some((*prefix, rest))
  })
}

/// Collapse `.`, `..` and repeated separators. Above a root, `..` is
/// dropped; in a relative path a leading `..` is kept.
fn collapse(path: &Path) -> String {
  let rooted = path.has_root();
  let mut parts: Vec<String> = Vec::new();
  for component in path.components() {
    match component {
      Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
      Component::ParentDir => {
        if parts.last().is_some_and(|last| last != "..") {
          parts.pop();
        } else if !rooted {
          parts.push("..".to_string());
        }
      }
      Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
    }
  }
  let body = parts.join("/");
  match (rooted, body.is_empty()) {
    (true, _) => format!("/{body}"),
    (false, true) => ".".to_string(),
    (false, false) => body,
  }
}

/// Lexically normalized form of `path`, relative or absolute as given.
/// A `~` or `$HOME` prefix is kept and `..` never climbs past it.
pub fn normalize_path(path: &str) -> String {
  match split_home(path) {
    Some((home, rest)) => {
      let rest = collapse(Path::new(rest.trim_start_matches('/')));
      if rest == "." {
        home.to_string()
      } else {
        format!("{home}/{rest}")
      }
    }
    None => collapse(Path::new(path)),
  }
}

/// Normalized `path` with relative paths resolved against `cwd`.
pub fn resolve_path(path: &str, cwd: &Path) -> String {
  if split_home(path).is_some() {
    return normalize_path(path);
  }
  collapse(&cwd.join(path))
}

/// Whether a normalized path climbs out of its base.
fn escapes(path: &str) -> bool {
  path.split('/').any(|part| part == "..")
}

fn path_argument(input: &Value) -> Option<&str> {
  ["file_path", "dir_path", "path"]
    .iter()
    .find_map(|key| input.get(*key).and_then(Value::as_str))
}

/// String an invocation is matched against: the command for the shell,
/// the normalized path for path tools, the JSON input otherwise.
pub fn match_subject(tool_name: &str, input: &Value) -> String {
  if tool_name == SHELL_TOOL
    && let Some(command) = input.get("command").and_then(Value::as_str)
  {
    return command.to_string();
  }
  if PATH_TOOLS.contains(&tool_name)
    && let Some(path) = path_argument(input)
  {
    return normalize_path(path);
  }
  input.to_string()
}

/// Whether session trust may cover an invocation at all. Paths that climb
/// out of the working directory or home never are.
pub fn is_trustable(tool_name: &str, input: &Value) -> bool {
  !PATH_TOOLS.contains(&tool_name) || !escapes(&match_subject(tool_name, input))
}

/// Whether an invocation matches any dangerous pattern. Relative paths are
/// resolved against `cwd` first.
pub fn is_dangerous(tool_name: &str, input: &Value, cwd: &Path) -> bool {
  let subject = match_subject(tool_name, input);
  if DANGEROUS_COMMANDS.iter().any(|re| re.is_match(&subject)) {
    return true;
  }
  if !PATH_TOOLS.contains(&tool_name) {
    return false;
  }
  let resolved = path_argument(input).map(|path| resolve_path(path, cwd));
  [Some(subject), resolved]
    .into_iter()
    .flatten()
    .any(|path| DANGEROUS_PATHS.iter().any(|re| re.is_match(&path)))
}

/// Compile a trust glob: `*` is any run, `?` exactly one character, the
/// match is anchored and everything else is literal.
pub fn glob_to_regex(pattern: &str) -> Option<Regex> {
  let mut source = String::with_capacity(pattern.len() + 8);
  source.push_str("(?s)^");
  let mut literal = String::new();
  for ch in pattern.chars() {
    match ch {
      '*' | '?' => {
        source.push_str(&regex::escape(&literal));
        literal.clear();
        source.push_str(if ch == '*' { ".*" } else { "." });
      }
      other => literal.push(other),
    }
  }
  source.push_str(&regex::escape(&literal));
  source.push('$');
  Regex::new(&source).ok()
}

pub fn glob_matches(pattern: &str, subject: &str) -> bool {
  glob_to_regex(pattern).is_some_and(|re| re.is_match(subject))
}

/// Trust pattern offered alongside an approval request.
pub fn suggest_pattern(tool_name: &str, input: &Value) -> Option<String> {
  if tool_name == SHELL_TOOL {
    let command = input.get("command").and_then(Value::as_str)?;
    let first = command.split_whitespace().next()?;
    return Some(format!("{first} *"));
  }
  if PATH_TOOLS.contains(&tool_name) {
    let path = normalize_path(path_argument(input)?);
    if escapes(&path) {
      return None;
    }
    let parent = Path::new(&path).parent()?.to_string_lossy().to_string();
    if parent.is_empty() {
      return Some("*".to_string());
    }
    return Some(format!("{}/*", parent.trim_end_matches('/')));
  }
  None
}

/// Human-readable rendering of an invocation.
pub fn summarize(tool_name: &str, input: &Value) -> String {
  let arg = |key: &str| input.get(key).and_then(Value::as_str).unwrap_or_default();
  match tool_name {
    "execute_shell" => format!("Run command: {}", arg("command")),
    "write_file" => format!("Write file: {}", arg("file_path")),
    "edit_file" => format!("Edit file: {}", arg("file_path")),
    "read_file" => format!("Read file: {}", arg("file_path")),
    "list_dir" => format!("List directory: {}", arg("dir_path")),
    other => format!("Run {other} with {input}"),
  }
}
