//! Snapshot tests over complete generated Ninja files.

use expect_test::expect_file;
use katydid::{GenConfig, GraphBuilder, NinjaGenerator};

use crate::mock::{MockEvaluator, MockMakefileCache};


fn generate(
    cfg: &GenConfig,
    ev: &MockEvaluator,
    cache: &MockMakefileCache,
    graph: &katydid::DepGraph,
    roots: &[katydid::NodeId],
    orig_args: &str,
) -> String {
    let mut out = Vec::new();
    let mut generator = NinjaGenerator::new(cfg, ev, cache);
    generator
        .emit_ninja(&mut out, graph, roots, orig_args)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn snapshot_compile_graph() {
    let mut builder = GraphBuilder::new();
    let prog = builder.declare("out/prog");
    let main_o = builder.declare("out/main.o");
    let util_o = builder.declare("out/util.o");
    let main_c = builder.declare("main.c");
    let util_c = builder.declare("util.c");
    builder.add_dep(prog, main_o);
    builder.add_dep(prog, util_o);
    builder.add_cmd(prog, "cc -o out/prog out/main.o out/util.o");
    builder.add_dep(main_o, main_c);
    builder.add_cmd(main_o, "cc -MD -MF out/main.d -c main.c -o out/main.o");
    builder.add_dep(util_o, util_c);
    builder.add_cmd(util_o, "cc -MD -MF out/util.d -c util.c -o out/util.o");
    let graph = builder.build();

    let out = generate(
        &GenConfig::default(),
        &MockEvaluator::new(),
        &MockMakefileCache::default(),
        &graph,
        &[prog],
        "katydid",
    );
    expect_file!["gen_snapshots/compile.ninja"].assert_eq(&out);
}

#[test]
fn snapshot_regen_graph() {
    let mut builder = GraphBuilder::new();
    let all = builder.declare("all");
    let hello = builder.declare("hello");
    builder.set_phony(all);
    builder.add_dep(all, hello);
    builder.add_cmd(hello, "touch hello");
    let graph = builder.build();

    let ev = MockEvaluator::new();
    ev.add_used_env("TARGET_PRODUCT", "aosp_arm");
    ev.add_used_env("CC", "clang");
    let cache = MockMakefileCache::new(["build/core/main.mk", "Makefile"]);
    let cfg = GenConfig {
        gen_regen_rule: true,
        ..GenConfig::default()
    };

    let out = generate(&cfg, &ev, &cache, &graph, &[all], "katydid -f Makefile");
    expect_file!["gen_snapshots/regen.ninja"].assert_eq(&out);
}
