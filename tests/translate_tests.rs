//! Unit-level tests for escaping, recipe translation, script
//! composition and compiler command inspection.

use katydid::{
    Command, GenConfig,
    compiler::{gomacc_offset, infer_depfile},
    escape::{escape_shell, escape_target},
    shell::{ShellScript, compose, translate_command},
};

// Helper functions

fn translate(cmd: &str) -> String {
    let mut out = String::new();
    translate_command(cmd, &mut out);
    out
}

fn compose_cmds(cfg: &GenConfig, specs: &[(&str, bool, bool)]) -> ShellScript {
    let commands: Vec<Command> = specs
        .iter()
        .map(|&(cmd, echo, ignore_error)| Command {
            cmd: cmd.to_owned(),
            echo,
            ignore_error,
        })
        .collect();
    compose(cfg, &commands)
}

// Target escaping

#[test]
fn escape_target_passthrough() {
    assert_eq!(escape_target("out/foo.o"), "out/foo.o");
}

#[test]
fn escape_target_specials() {
    assert_eq!(escape_target("a b:c$d"), "a$ b$:c$$d");
}

// Shell escaping

#[test]
fn escape_shell_passthrough() {
    assert_eq!(escape_shell("echo hi"), "echo hi");
}

#[test]
fn escape_shell_quotes_and_backslashes() {
    assert_eq!(escape_shell(r#"say "hi!""#), r#"say \"hi\!\""#);
    assert_eq!(escape_shell(r"a\b`c`"), r"a\\b\`c\`");
}

#[test]
fn escape_shell_keeps_dollar_pairs() {
    // `$$` pairs written by the translator stay a single Ninja escape.
    assert_eq!(escape_shell("echo $$HOME"), r"echo \$$HOME");
    assert_eq!(escape_shell("a$$b$$c"), r"a\$$b\$$c");
    // A run of three is one escaped pair plus one escaped single.
    assert_eq!(escape_shell("$$$"), r"\$$\$");
}

// Recipe translation

#[test]
fn translate_escapes_dollars() {
    assert_eq!(translate("echo $PATH"), "echo $$PATH");
}

#[test]
fn translate_strips_comments_outside_quotes() {
    assert_eq!(translate("echo foo # comment"), "echo foo");
    assert_eq!(translate("# whole line"), "");
    assert_eq!(translate("echo 'a # b'"), "echo 'a # b'");
    assert_eq!(translate("echo \"# kept\""), "echo \"# kept\"");
    // Not preceded by whitespace: part of the word.
    assert_eq!(translate("echo foo#bar"), "echo foo#bar");
}

#[test]
fn translate_splices_continuations() {
    assert_eq!(translate("gcc \\\n -c foo.c"), "gcc  -c foo.c");
    assert_eq!(translate("echo a\necho b"), "echo a echo b");
}

#[test]
fn translate_trims_trailing_semicolons() {
    assert_eq!(translate("rm -f foo ; "), "rm -f foo");
    assert_eq!(translate("rm -f foo;"), "rm -f foo");
}

// Script composition

#[test]
fn compose_single_command_unwrapped() {
    let script = compose_cmds(&GenConfig::default(), &[("gcc -c a.c", true, false)]);
    assert_eq!(script.command, "gcc -c a.c");
    assert_eq!(script.description, None);
    assert!(!script.use_local_pool);
}

#[test]
fn compose_wraps_multiple_commands() {
    let script = compose_cmds(
        &GenConfig::default(),
        &[("mkdir -p out", true, false), ("cp a out", true, false)],
    );
    assert_eq!(script.command, "(mkdir -p out) && (cp a out)");
}

#[test]
fn compose_keeps_existing_subshells() {
    let script = compose_cmds(
        &GenConfig::default(),
        &[("(cd sub && make)", true, false), ("touch done", true, false)],
    );
    assert_eq!(script.command, "(cd sub && make) && (touch done)");
}

#[test]
fn compose_substitutes_true_for_empty_recipes() {
    let script = compose_cmds(
        &GenConfig::default(),
        &[("# nothing to do", true, false), ("touch out", true, false)],
    );
    assert_eq!(script.command, "(true) && (touch out)");
}

#[test]
fn compose_echo_with_redirect_is_not_a_description() {
    let cfg = GenConfig {
        detect_android_echo: true,
        ..GenConfig::default()
    };
    let script = compose_cmds(&cfg, &[("echo progress > log", false, false)]);
    assert_eq!(script.description, None);
    assert_eq!(script.command, "echo progress > log");
}

#[test]
fn compose_echoed_echo_is_not_a_description() {
    let cfg = GenConfig {
        detect_android_echo: true,
        ..GenConfig::default()
    };
    let script = compose_cmds(&cfg, &[("echo building", true, false)]);
    assert_eq!(script.description, None);
    assert_eq!(script.command, "echo building");
}

#[test]
fn compose_captures_first_silent_echo() {
    let cfg = GenConfig {
        detect_android_echo: true,
        ..GenConfig::default()
    };
    let script = compose_cmds(
        &cfg,
        &[
            ("echo \"CC a.o\"", false, false),
            ("echo \"second\"", false, false),
            ("cc -c a.c", true, false),
        ],
    );
    assert_eq!(script.description.as_deref(), Some("CC a.o"));
    assert_eq!(script.command, "(echo \"second\") && (cc -c a.c)");
}

#[test]
fn compose_lone_echo_keeps_a_runnable_command() {
    let cfg = GenConfig {
        detect_android_echo: true,
        ..GenConfig::default()
    };
    let script = compose_cmds(&cfg, &[("echo 'done'", false, false)]);
    assert_eq!(script.description.as_deref(), Some("done"));
    assert_eq!(script.command, "true");
}

// Depfile inference

#[test]
fn depfile_requires_md_and_c() {
    let mut cmd = "gcc -MD foo.c".to_owned();
    assert_eq!(infer_depfile(&mut cmd), None);
    assert_eq!(cmd, "gcc -MD foo.c");

    let mut cmd = "gcc -c foo.c -o foo.o".to_owned();
    assert_eq!(infer_depfile(&mut cmd), None);
}

#[test]
fn depfile_from_mf_flag() {
    let mut cmd = "gcc -MD -MF foo.d -c foo.c -o foo.o".to_owned();
    assert_eq!(infer_depfile(&mut cmd).as_deref(), Some("foo.d.tmp"));
    assert_eq!(cmd, "gcc -MD -MF foo.d -c foo.c -o foo.o && cp foo.d foo.d.tmp");
}

#[test]
fn depfile_reinference_is_stable() {
    let mut cmd = "gcc -MD -MF foo.d -c foo.c -o foo.o".to_owned();
    assert_eq!(infer_depfile(&mut cmd).as_deref(), Some("foo.d.tmp"));
    assert_eq!(infer_depfile(&mut cmd).as_deref(), Some("foo.d.tmp"));
}

#[test]
fn depfile_from_output_path() {
    let mut cmd = "clang -MMD -c src/foo.c -o out/foo.o".to_owned();
    assert_eq!(infer_depfile(&mut cmd).as_deref(), Some("out/foo.d.tmp"));
    assert!(cmd.ends_with(" && cp out/foo.d out/foo.d.tmp"), "{cmd}");
}

#[test]
fn depfile_mf_last_occurrence_wins() {
    let mut cmd = "gcc -MD -c x.c -MF a.d -MF b.d -o x.o".to_owned();
    assert_eq!(infer_depfile(&mut cmd).as_deref(), Some("b.d.tmp"));
}

#[test]
fn depfile_missing_argument_reports_and_continues() {
    let mut cmd = "gcc -MD -c foo.c".to_owned();
    assert_eq!(infer_depfile(&mut cmd), None);
    assert_eq!(cmd, "gcc -MD -c foo.c");
}

#[test]
fn depfile_llvm_rs_cc_has_none() {
    let mut cmd = "prebuilts/sdk/bin/llvm-rs-cc -MD -MF res.d -c foo.rs -o res".to_owned();
    assert_eq!(infer_depfile(&mut cmd), None);
}

#[test]
fn depfile_dot_p_rename() {
    let mut cmd =
        "gcc -MD -MF foo.d -c foo.c -o foo.o && cp foo.d foo.P; rm -f foo.d".to_owned();
    assert_eq!(infer_depfile(&mut cmd).as_deref(), Some("foo.P"));
    assert_eq!(cmd, "gcc -MD -MF foo.d -c foo.c -o foo.o && cp foo.d foo.P");
}

#[test]
fn depfile_assembly_source_has_none() {
    let mut cmd = "gcc -MD -MF foo.d -c src/foo.s -o foo.o".to_owned();
    assert_eq!(infer_depfile(&mut cmd), None);
    assert_eq!(cmd, "gcc -MD -MF foo.d -c src/foo.s -o foo.o");
}

// Wrapper placement

#[test]
fn gomacc_recognizes_prebuilt_compilers() {
    assert_eq!(gomacc_offset("prebuilts/gcc/arm/bin/arm-gcc -c a.c -o a.o"), Some(0));
    assert_eq!(gomacc_offset("prebuilts/clang/host/clang++ -c a.cc -o a.o"), Some(0));
}

#[test]
fn gomacc_skips_ccache_prefix() {
    assert_eq!(gomacc_offset("ccache prebuilts/gcc/arm/gcc -c a.c"), Some(7));
    assert_eq!(
        gomacc_offset("prebuilts/misc/ccache prebuilts/clang/clang -c a.c"),
        Some(22)
    );
}

#[test]
fn gomacc_rejects_other_commands() {
    assert_eq!(gomacc_offset("gcc -c a.c"), None);
    assert_eq!(gomacc_offset("prebuilts/misc/tool -c a.c"), None);
    assert_eq!(gomacc_offset("prebuilts/clang/clang -S a.c"), None);
    assert_eq!(gomacc_offset("prebuilts/gcc/arm/ld -o a.out a.o"), None);
}
