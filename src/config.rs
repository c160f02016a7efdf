//! Generator configuration.

/// Configuration for one generator run.
///
/// Created once at startup and threaded through the generator; nothing
/// mutates it afterwards.
#[derive(Debug, Clone)]
pub struct GenConfig {
    /// Appended to every output filename.
    pub ninja_suffix: String,
    /// Output directory. `None` emits into the current directory and
    /// makes the shell wrapper `cd` to its own location first.
    pub ninja_dir: Option<String>,
    /// Distributed-build wrapper directory. Setting this enables wrapper
    /// injection and the local pool for commands left unwrapped.
    pub goma_dir: Option<String>,
    /// Depth of `local_pool` when `goma_dir` is set.
    pub num_jobs: usize,
    /// Extract leading `echo` recipes into rule descriptions.
    pub detect_android_echo: bool,
    /// Emit the rules that re-run the translator when inputs change.
    pub gen_regen_rule: bool,
    /// Fail the build on environment changes instead of resnapshotting.
    pub error_on_env_change: bool,
    /// Build every target; suppresses the `default` line.
    pub build_all_targets: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            ninja_suffix: String::new(),
            ninja_dir: None,
            goma_dir: None,
            num_jobs: 1,
            detect_android_echo: false,
            gen_regen_rule: false,
            error_on_env_change: false,
            build_all_targets: false,
        }
    }
}

impl GenConfig {
    fn in_dir(&self, stem: &str, ext: &str) -> String {
        match &self.ninja_dir {
            Some(dir) => format!("{dir}/{stem}{}{ext}", self.ninja_suffix),
            None => format!("{stem}{}{ext}", self.ninja_suffix),
        }
    }

    /// Path of the generated Ninja file.
    pub fn ninja_file(&self) -> String {
        self.in_dir("build", ".ninja")
    }

    /// Path of the generated shell wrapper.
    pub fn shell_script_file(&self) -> String {
        self.in_dir("ninja", ".sh")
    }

    /// Path of the environment snapshot checked by the regen rules.
    pub fn env_file(&self) -> String {
        self.in_dir(".kati_env", "")
    }

    /// Path of the lunch sidecar sourced by the shell wrapper.
    pub fn lunch_file(&self) -> String {
        self.in_dir(".kati_lunch", "")
    }
}
