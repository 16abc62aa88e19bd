//! Turns a selected result into its side effect.

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::{LazyLock, Mutex};

use arboard::Clipboard;
use flare_plugin::{SearchResult, kind};
use regex::Regex;

static FIELD_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[fFuUckidDnNmv]").expect("field code pattern is valid"));

pub trait Executor: Send + Sync {
    /// Performs the action of `item`. `true` on success.
    fn execute(&self, item: &SearchResult) -> bool;
}

/// Spawns applications, hands files and URLs to `xdg-open` and copies
/// calculator output to the clipboard.
#[derive(Default)]
pub struct DesktopExecutor {
    // On X11 the copied text only lives as long as its owner.
    clipboard: Mutex<Option<Clipboard>>,
}

impl DesktopExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn launch(args: &[String]) -> bool {
        let Some((program, rest)) = args.split_first() else {
            return false;
        };
        let spawned = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn();

        match spawned {
            Ok(mut child) => {
                // Reap the child once it exits.
                std::thread::spawn(move || child.wait());
                true
            }
            Err(e) => {
                tracing::warn!(program = %program, error = %e, "failed to launch");
                false
            }
        }
    }

    fn open(target: &str) -> bool {
        Self::launch(&["xdg-open".to_string(), target.to_string()])
    }

    fn copy(&self, text: &str) -> bool {
        let mut guard = match self.clipboard.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => *guard = Some(clipboard),
                Err(e) => {
                    tracing::info!(value = text, error = %e, "clipboard unavailable, result not copied");
                    return true;
                }
            }
        }
        if let Some(clipboard) = guard.as_mut() {
            if let Err(e) = clipboard.set_text(text) {
                tracing::info!(value = text, error = %e, "clipboard unavailable, result not copied");
                return true;
            }
            tracing::info!(value = text, "copied to clipboard");
        }
        true
    }
}

impl Executor for DesktopExecutor {
    fn execute(&self, item: &SearchResult) -> bool {
        if item.action.is_empty() {
            return false;
        }
        match item.kind.as_str() {
            kind::APPLICATION => Self::launch(&parse_exec(&item.action)),
            kind::FILE | kind::URL | kind::WEB => Self::open(&item.action),
            kind::CALCULATOR | kind::CLIPBOARD => self.copy(&item.action),
            other => {
                tracing::debug!(kind = other, "nothing to execute");
                false
            }
        }
    }
}

/// Removes desktop entry field codes such as `%u` or `%F`.
pub fn strip_field_codes(exec: &str) -> String {
    FIELD_CODE_RE.replace_all(exec, "").into_owned()
}

/// Splits a command line on whitespace, honoring single and double quotes and
/// backslash escapes. `None` on an unterminated quote.
pub fn split_command(line: &str) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_arg = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => current.push(c),
                    }
                }
            }
            '"' => {
                in_arg = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => current.push(chars.next()?),
                        c => current.push(c),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                current.push(chars.next()?);
            }
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    Some(args)
}

/// Argument vector for a desktop entry `Exec` line. When the line cannot be
/// split, the whole stripped line is used as the program.
pub fn parse_exec(exec: &str) -> Vec<String> {
    let stripped = strip_field_codes(exec);
    split_command(&stripped).unwrap_or_else(|| {
        let program = stripped.trim();
        if program.is_empty() { Vec::new() } else { vec![program.to_string()] }
    })
}
