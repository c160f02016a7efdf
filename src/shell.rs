//! Recipe-to-shell translation and script composition.
//!
//! Make runs every recipe line in a fresh shell while Ninja runs one
//! command per build edge. This module rewrites single recipe lines so
//! they survive Ninja's `$` expansion, and joins a node's recipes into
//! one shell line.

use tracing::debug;

use crate::{compiler::gomacc_offset, config::GenConfig, eval::Command};

/// Append `cmd`, rewritten for a Ninja `command =` binding, to `out`.
///
/// One left-to-right pass: `$` becomes `$$`, backslash-newline pairs are
/// spliced, a `#` that follows whitespace outside quotes starts a
/// comment and ends the line. Trailing whitespace and `;` are trimmed.
pub fn translate_command(cmd: &str, out: &mut String) {
    let start = out.len();
    let mut prev_backslash = false;
    // Whitespace initially, so a leading `#` counts as a comment.
    let mut prev_char = ' ';
    let mut quote: Option<char> = None;

    for c in cmd.chars() {
        match c {
            '#' if quote.is_none() && prev_char.is_ascii_whitespace() => break,
            '\'' | '"' | '`' => {
                if quote == Some(c) {
                    quote = None;
                } else if quote.is_none() && !prev_backslash {
                    quote = Some(c);
                }
                out.push(c);
            }
            '$' => out.push_str("$$"),
            '\n' => {
                if prev_backslash {
                    out.pop();
                } else {
                    out.push(' ');
                }
            }
            _ => out.push(c),
        }
        prev_backslash = c == '\\' && !prev_backslash;
        prev_char = c;
    }

    while out.len() > start {
        let last = out.as_bytes()[out.len() - 1];
        if !last.is_ascii_whitespace() && last != b';' {
            break;
        }
        out.pop();
    }
}

/// If the translated recipe is a plain `echo`, return the echoed text
/// with its outer quotes stripped and backslash escapes kept.
///
/// Redirections, pipes and other shell punctuation outside quotes mean
/// the line does more than print, so no description is extracted.
fn echo_description(cmd: &str) -> Option<String> {
    let body = cmd.strip_prefix("echo ")?;
    let mut out = String::with_capacity(body.len());
    let mut quote: Option<char> = None;
    let mut prev_backslash = false;
    for c in body.chars() {
        match c {
            '\'' | '"' | '`' if !prev_backslash => {
                if quote == Some(c) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(c);
                } else {
                    out.push(c);
                }
            }
            '<' | '>' | '&' | '|' | ';' if quote.is_none() => return None,
            _ => out.push(c),
        }
        prev_backslash = c == '\\' && !prev_backslash;
    }
    Some(out)
}

/// A node's recipe list composed into a single shell line.
#[derive(Debug, Default)]
pub struct ShellScript {
    pub command: String,
    pub description: Option<String>,
    /// The build must run in `local_pool`: a wrapper directory is
    /// configured but this command does not go through the wrapper.
    pub use_local_pool: bool,
}

/// Join evaluated recipes into one shell line.
///
/// Recipes chain with ` && `, or ` ; ` when the preceding recipe
/// ignores errors. When more than one recipe survives, each is wrapped
/// in a subshell unless it already starts with `(`. A recipe that
/// translates to nothing becomes `true`, and a trailing ignore-error
/// recipe gets ` ; true` appended so Ninja sees success.
pub fn compose(cfg: &GenConfig, commands: &[Command]) -> ShellScript {
    let gomacc = cfg.goma_dir.as_ref().map(|dir| format!("{dir}/gomacc "));
    let mut description = None;
    let mut use_gomacc = false;

    let mut segments = Vec::with_capacity(commands.len());
    for c in commands {
        let mut text = String::new();
        translate_command(c.cmd.trim_start(), &mut text);

        if cfg.detect_android_echo
            && description.is_none()
            && !c.echo
            && let Some(desc) = echo_description(&text)
        {
            debug!(description = %desc, "captured rule description from echo recipe");
            description = Some(desc);
            continue;
        }

        if text.is_empty() {
            text.push_str("true");
        } else if let Some(gomacc) = &gomacc
            && let Some(pos) = gomacc_offset(&text)
        {
            text.insert_str(pos, gomacc);
            use_gomacc = true;
        }
        segments.push((text, c.ignore_error));
    }

    let mut command = String::new();
    let wrap = segments.len() > 1;
    let mut prev_ignore_error = false;
    for (i, (text, ignore_error)) in segments.iter().enumerate() {
        if i > 0 {
            command.push_str(if prev_ignore_error { " ; " } else { " && " });
        }
        if wrap && !text.starts_with('(') {
            command.push('(');
            command.push_str(text);
            command.push(')');
        } else {
            command.push_str(text);
        }
        prev_ignore_error = *ignore_error;
    }
    if prev_ignore_error {
        command.push_str(" ; true");
    }
    if command.is_empty() {
        // Every recipe was folded into the description.
        command.push_str("true");
    }

    ShellScript {
        command,
        description,
        use_local_pool: gomacc.is_some() && !use_gomacc,
    }
}
