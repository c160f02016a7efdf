//! Compiler command-line inspection: depfile inference and
//! distributed-build wrapper placement.

use tracing::warn;

use crate::paths::{basename, strip_ext};

/// Find `needle` in `cmd`, rejecting a match at offset 0.
///
/// Flag needles carry a leading space; a hit at offset 0 would mean the
/// flag had no token in front of it.
fn find_flag(cmd: &str, needle: &str) -> Option<usize> {
    match cmd.find(needle) {
        Some(0) | None => None,
        found => found,
    }
}

/// Return the argument of the last occurrence of `needle` in `cmd`.
///
/// Repeated flags resolve to the final one, the same way the compiler
/// itself treats e.g. a repeated `-MF`.
fn find_flag_with_arg<'a>(cmd: &'a str, needle: &str) -> Option<&'a str> {
    let mut tail = cmd;
    let mut arg = None;
    while let Some(pos) = tail.find(needle) {
        tail = &tail[pos + needle.len()..];
        let val = tail.trim_start();
        let end = val.find(' ').unwrap_or(val.len());
        arg = Some(&val[..end]);
    }
    arg.filter(|val| !val.is_empty())
}

fn depfile_from_command(cmd: &str) -> Option<String> {
    if (find_flag(cmd, " -MD").is_none() && find_flag(cmd, " -MMD").is_none())
        || find_flag(cmd, " -c").is_none()
    {
        return None;
    }

    if let Some(mf) = find_flag_with_arg(cmd, " -MF") {
        return Some(mf.to_owned());
    }

    let Some(obj) = find_flag_with_arg(cmd, " -o") else {
        warn!(cmd, "-MD or -MMD is present but the depfile cannot be inferred");
        return None;
    };
    Some(format!("{}.d", strip_ext(obj)))
}

/// Infer the depfile a compiler invocation writes, rewriting `cmd_buf`
/// where the recipe shape calls for it.
///
/// Returns the path for Ninja's `depfile =` binding, or `None` when the
/// command produces no usable depfile.
pub fn infer_depfile(cmd_buf: &mut String) -> Option<String> {
    // The flag needles all start with a space; prepending one lets a
    // flag in first position still match.
    let mut cmd = String::with_capacity(cmd_buf.len() + 1);
    cmd.push(' ');
    cmd.push_str(cmd_buf);

    let mut depfile = depfile_from_command(&cmd)?;

    // llvm-rs-cc does not write the depfile it is asked for.
    if cmd.contains("bin/llvm-rs-cc ") {
        return None;
    }

    // Recipes that rename the depfile to `.P` also delete the original;
    // keep the `.P` and drop the deletion from the command.
    let renamed = format!("{}.P", strip_ext(&depfile));
    if cmd.contains(&renamed) {
        let rm_f = format!("; rm -f {depfile}");
        if let Some(found) = cmd.find(&rm_f) {
            cmd.replace_range(found..found + rm_f.len(), "");
            cmd_buf.clear();
            cmd_buf.push_str(&cmd[1..]);
        } else {
            warn!(cmd = %cmd, depfile = %depfile, "cannot find the removal of the depfile");
        }
        return Some(renamed);
    }

    // Assembly sources skip the preprocessor, which ignores `-MF`.
    let asm_src = format!("/{}.s", basename(strip_ext(&depfile)));
    if cmd.contains(&asm_src) {
        return None;
    }

    // The compiler truncates the depfile before Ninja has read the
    // previous one; keep a copy and point Ninja at the copy.
    cmd_buf.push_str(" && cp ");
    cmd_buf.push_str(&depfile);
    cmd_buf.push(' ');
    cmd_buf.push_str(&depfile);
    cmd_buf.push_str(".tmp");
    depfile.push_str(".tmp");
    Some(depfile)
}

/// Byte offset at which a distributed-build wrapper belongs in
/// `cmdline`, or `None` when this is not a recognized compiler call.
///
/// A leading `ccache` token is skipped. The compiler must live under
/// `prebuilts/gcc/` or `prebuilts/clang/` and the rest of the command
/// must contain ` -c `.
pub fn gomacc_offset(cmdline: &str) -> Option<usize> {
    let space = cmdline.find(' ')?;
    let head = &cmdline[..space];
    if head.ends_with("ccache") {
        let skip = space + 1;
        return gomacc_offset(&cmdline[skip..]).map(|pos| pos + skip);
    }
    let tool = head.strip_prefix("prebuilts/")?;
    if !tool.starts_with("gcc/") && !tool.starts_with("clang/") {
        return None;
    }
    let recognized = ["gcc", "g++", "clang", "clang++"]
        .iter()
        .any(|suffix| tool.ends_with(suffix));
    (recognized && cmdline[space..].contains(" -c ")).then_some(0)
}
