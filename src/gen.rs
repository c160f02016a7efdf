//! Ninja file, shell wrapper, and environment snapshot emission.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    fs,
    io::{self, BufWriter, Write},
};

use indexmap::IndexSet;
use smol_str::{SmolStr, format_smolstr};
use tracing::{debug, info};

use crate::{
    compiler,
    config::GenConfig,
    escape::{escape_shell, escape_target},
    eval::{AvoidIoScope, Evaluator, MakefileCache},
    graph::{DepGraph, DepNode, NodeId},
    paths::basename,
    shell,
};

/// Composed commands longer than this go through a response file.
///
/// Linux takes roughly 130 kB of command line and macOS roughly 250 kB;
/// stay well under both.
const RSPFILE_THRESHOLD: usize = 100 * 1000;

/// Target that is never created, so builds depending on it always run.
const ALWAYS_BUILD: &str = ".always_build";

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("cannot create {path}: {source}")]
    Create { path: String, source: io::Error },

    #[error("cannot write {path}: {source}")]
    Write { path: String, source: io::Error },

    #[error("cannot make {path} executable: {source}")]
    Chmod { path: String, source: io::Error },

    #[error("no nodes to emit, so no default target can be chosen")]
    NoDefaultTarget,
}

/// Emits the Ninja file, the shell wrapper, and the environment
/// snapshot for one evaluated dependency graph.
///
/// A generator is good for a single run: the deduplication state and
/// the rule-name counter carry over between the files it writes.
pub struct NinjaGenerator<'a> {
    cfg: &'a GenConfig,
    ev: &'a dyn Evaluator,
    makefiles: &'a dyn MakefileCache,

    /// Outputs already visited, including suppressed ones.
    done: IndexSet<SmolStr>,
    /// basename -> output for shortcut emission; an empty value marks a
    /// basename shared by several outputs.
    short_names: BTreeMap<SmolStr, SmolStr>,
    rule_id: u32,
    /// Consumed environment variables with their evaluated values.
    used_envs: BTreeMap<SmolStr, SmolStr>,
    shell: SmolStr,

    _avoid_io: AvoidIoScope<'a>,
}

impl<'a> NinjaGenerator<'a> {
    /// Snapshot the evaluator state needed for emission.
    ///
    /// The evaluator's `avoid_io` flag stays set until the generator is
    /// dropped.
    pub fn new(
        cfg: &'a GenConfig,
        ev: &'a dyn Evaluator,
        makefiles: &'a dyn MakefileCache,
    ) -> Self {
        let avoid_io = AvoidIoScope::new(ev);
        let mut shell = ev.eval_var("SHELL");
        if shell.is_empty() {
            shell = SmolStr::new_static("/bin/sh");
        }
        let mut used_envs = BTreeMap::new();
        for name in ev.used_env_vars() {
            let value = ev.eval_var(&name);
            used_envs.insert(name, value);
        }
        Self {
            cfg,
            ev,
            makefiles,
            done: IndexSet::new(),
            short_names: BTreeMap::new(),
            rule_id: 0,
            used_envs,
            shell,
            _avoid_io: avoid_io,
        }
    }

    /// Write the environment snapshot, the Ninja file and the shell
    /// wrapper for the nodes reachable from `roots`.
    ///
    /// `orig_args` is the invocation to replay in the regeneration rule.
    pub fn generate(
        &mut self,
        graph: &DepGraph,
        roots: &[NodeId],
        orig_args: &str,
    ) -> Result<(), GenError> {
        if roots.is_empty() && !self.cfg.build_all_targets {
            return Err(GenError::NoDefaultTarget);
        }
        debug!(
            nodes = graph.node_count(),
            roots = roots.len(),
            "generating ninja files"
        );

        if !self.used_envs.is_empty() {
            let path = self.cfg.env_file();
            write_file(&path, |w| self.emit_env_file(w))?;
        }

        let path = self.cfg.ninja_file();
        write_file(&path, |w| self.emit_ninja(w, graph, roots, orig_args))?;

        let script = self.cfg.shell_script_file();
        write_file(&script, |w| self.emit_shell_script(w))?;
        make_executable(&script)?;

        info!(rules = self.rule_id, ninja = %path, "generation finished");
        Ok(())
    }

    /// Write the `KEY=VALUE` snapshot of every consumed env variable.
    pub fn emit_env_file(&self, w: &mut impl Write) -> io::Result<()> {
        for (name, value) in &self.used_envs {
            writeln!(w, "{name}={value}")?;
        }
        Ok(())
    }

    /// Write the complete Ninja file to `w`.
    pub fn emit_ninja(
        &mut self,
        w: &mut impl Write,
        graph: &DepGraph,
        roots: &[NodeId],
        orig_args: &str,
    ) -> io::Result<()> {
        writeln!(w, "# Generated by katydid. Do not edit.")?;
        writeln!(w)?;
        if !self.used_envs.is_empty() {
            writeln!(w, "# Environment variables used:")?;
            for (name, value) in &self.used_envs {
                writeln!(w, "# {name}={value}")?;
            }
            writeln!(w)?;
        }
        if self.cfg.goma_dir.is_some() {
            writeln!(w, "pool local_pool")?;
            writeln!(w, " depth = {}", self.cfg.num_jobs)?;
            writeln!(w)?;
        }
        self.emit_regen_rules(w, orig_args)?;

        for &root in roots {
            self.emit_node(w, graph, root)?;
        }

        self.emit_shortcuts(w)?;

        if !self.cfg.build_all_targets
            && let Some(&first) = roots.first()
        {
            let node = graph.lookup_node(first).expect("node should exist");
            writeln!(w)?;
            writeln!(w, "default {}", escape_target(&node.output))?;
        }
        Ok(())
    }

    fn emit_node(&mut self, w: &mut impl Write, graph: &DepGraph, id: NodeId) -> io::Result<()> {
        let node = graph.lookup_node(id).expect("node should exist");
        if !self.done.insert(node.output.clone()) {
            return Ok(());
        }

        // Plain source files get no stanza.
        if node.cmds.is_empty() && node.deps.is_empty() && node.order_onlys.is_empty() && !node.is_phony
        {
            return Ok(());
        }

        let base = basename(&node.output);
        if base != node.output {
            match self.short_names.entry(SmolStr::new(base)) {
                Entry::Vacant(entry) => {
                    entry.insert(node.output.clone());
                }
                Entry::Occupied(mut entry) => {
                    // Shortcuts only exist for unique basenames.
                    entry.insert(SmolStr::default());
                }
            }
        }

        let commands = self.ev.evaluate(graph, id);

        let mut rule_name = SmolStr::new_static("phony");
        let mut use_local_pool = false;
        if !commands.is_empty() {
            let minted = format_smolstr!("rule{}", self.rule_id);
            self.rule_id += 1;
            writeln!(w, "rule {minted}")?;

            let mut script = shell::compose(self.cfg, &commands);
            use_local_pool = script.use_local_pool;
            writeln!(
                w,
                " description = {}",
                script.description.as_deref().unwrap_or("build $out")
            )?;
            if let Some(depfile) = compiler::infer_depfile(&mut script.command) {
                writeln!(w, " depfile = {depfile}")?;
                writeln!(w, " deps = gcc")?;
            }
            if script.command.len() > RSPFILE_THRESHOLD {
                writeln!(w, " rspfile = $out.rsp")?;
                writeln!(w, " rspfile_content = {}", script.command)?;
                writeln!(w, " command = {} $out.rsp", self.shell)?;
            } else {
                writeln!(
                    w,
                    " command = {} -c \"{}\"",
                    self.shell,
                    escape_shell(&script.command)
                )?;
            }
            rule_name = minted;
        }

        self.emit_build(w, graph, node, &rule_name, use_local_pool)?;

        for &dep in &node.deps {
            self.emit_node(w, graph, dep)?;
        }
        for &dep in &node.order_onlys {
            self.emit_node(w, graph, dep)?;
        }
        Ok(())
    }

    fn emit_build(
        &self,
        w: &mut impl Write,
        graph: &DepGraph,
        node: &DepNode,
        rule_name: &str,
        use_local_pool: bool,
    ) -> io::Result<()> {
        write!(w, "build {}: {rule_name}", escape_target(&node.output))?;
        for &dep in &node.deps {
            let dep = graph.lookup_node(dep).expect("node should exist");
            write!(w, " {}", escape_target(&dep.output))?;
        }
        if !node.order_onlys.is_empty() {
            write!(w, " ||")?;
            for &dep in &node.order_onlys {
                let dep = graph.lookup_node(dep).expect("node should exist");
                write!(w, " {}", escape_target(&dep.output))?;
            }
        }
        writeln!(w)?;
        if use_local_pool {
            writeln!(w, " pool = local_pool")?;
        }
        Ok(())
    }

    fn emit_regen_rules(&self, w: &mut impl Write, orig_args: &str) -> io::Result<()> {
        if !self.cfg.gen_regen_rule {
            return Ok(());
        }

        writeln!(w, "rule regen_ninja")?;
        writeln!(w, " command = {orig_args}")?;
        writeln!(w, " generator = 1")?;
        write!(w, "build {}: regen_ninja", escape_target(&self.cfg.ninja_file()))?;
        let mut makefiles = self.makefiles.all_filenames();
        makefiles.sort_unstable();
        for makefile in &makefiles {
            write!(w, " {}", escape_target(makefile))?;
        }
        if !self.used_envs.is_empty() {
            write!(w, " {}", escape_target(&self.cfg.env_file()))?;
        }
        writeln!(w)?;
        writeln!(w)?;

        if self.used_envs.is_empty() {
            return Ok(());
        }

        writeln!(w, "build {ALWAYS_BUILD}: phony")?;
        writeln!(w, "rule regen_envlist")?;
        write!(w, " command = rm -f $out.tmp")?;
        for name in self.used_envs.keys() {
            write!(w, " && echo {name}=$${name} >> $out.tmp")?;
        }
        if self.cfg.error_on_env_change {
            writeln!(w, " && diff $out.tmp $out")?;
        } else {
            writeln!(w, " && (diff $out.tmp $out > /dev/null 2>&1 || mv $out.tmp $out)")?;
        }
        writeln!(w, " restat = 1")?;
        writeln!(w, " generator = 1")?;
        writeln!(
            w,
            "build {}: regen_envlist {ALWAYS_BUILD}",
            escape_target(&self.cfg.env_file())
        )?;
        writeln!(w)?;
        Ok(())
    }

    fn emit_shortcuts(&self, w: &mut impl Write) -> io::Result<()> {
        let mut first = true;
        for (base, output) in &self.short_names {
            if output.is_empty() || self.done.contains(base) {
                continue;
            }
            if first {
                writeln!(w)?;
                first = false;
            }
            writeln!(w, "build {}: phony {}", escape_target(base), escape_target(output))?;
        }
        Ok(())
    }

    /// Write the wrapper that restores the environment and launches
    /// Ninja.
    pub fn emit_shell_script(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "#!{}", self.shell)?;
        writeln!(w, "# Generated by katydid. Do not edit.")?;
        writeln!(w)?;
        if self.cfg.ninja_dir.is_none() {
            writeln!(w, "cd $(dirname \"$0\")")?;
        }
        if !self.used_envs.is_empty() {
            writeln!(w, ". {}", self.cfg.env_file())?;
        }
        writeln!(
            w,
            "if [ -f {lunch} ]; then . {lunch}; fi",
            lunch = self.cfg.lunch_file()
        )?;
        for (name, exported) in self.ev.exports() {
            if exported {
                let value = self.ev.eval_var(&name);
                let quoted = shlex::try_quote(&value)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
                writeln!(w, "export {name}={quoted}")?;
            } else {
                writeln!(w, "unset {name}")?;
            }
        }
        write!(w, "exec ninja -f {}", self.cfg.ninja_file())?;
        if self.cfg.goma_dir.is_some() {
            write!(w, " -j500")?;
        }
        writeln!(w, " \"$@\"")?;
        Ok(())
    }
}

fn write_file(
    path: &str,
    emit: impl FnOnce(&mut BufWriter<fs::File>) -> io::Result<()>,
) -> Result<(), GenError> {
    let file = fs::File::create(path).map_err(|source| GenError::Create {
        path: path.to_owned(),
        source,
    })?;
    let mut w = BufWriter::new(file);
    emit(&mut w)
        .and_then(|()| w.flush())
        .map_err(|source| GenError::Write {
            path: path.to_owned(),
            source,
        })
}

#[cfg(unix)]
fn make_executable(path: &str) -> Result<(), GenError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        GenError::Chmod {
            path: path.to_owned(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &str) -> Result<(), GenError> {
    Ok(())
}
