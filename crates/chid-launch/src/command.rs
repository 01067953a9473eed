//! Pure assembly of the distributed launcher command line

use chid_config::FinetuneSettings;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

/// Rendezvous port used when none is given
pub const DEFAULT_MASTER_PORT: &str = "1122";

/// Port to pass as `--master_port`
///
/// `None` and the empty string fall back to [`DEFAULT_MASTER_PORT`]. Anything
/// else is passed through verbatim; the distributed launcher validates it.
pub fn resolve_master_port(port: Option<&str>) -> &str {
    match port {
        Some(port) if !port.is_empty() => port,
        _ => DEFAULT_MASTER_PORT,
    }
}

/// One external process invocation: a program and its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl LaunchCommand {
    /// Command with no arguments
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Program to execute
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments, in order
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Append one argument
    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append a named flag followed by its value
    pub fn flag_value(&mut self, name: &str, value: impl Into<OsString>) -> &mut Self {
        self.arg(name).arg(value)
    }

    /// Append a flag only when `enabled`
    pub fn switch(&mut self, name: &str, enabled: bool) -> &mut Self {
        if enabled {
            self.arg(name);
        }
        self
    }

    /// Value following the first occurrence of `name`
    pub fn value_of(&self, name: &str) -> Option<&OsStr> {
        let position = self.args.iter().position(|arg| arg == name)?;
        self.args.get(position + 1).map(OsString::as_os_str)
    }

    /// Number of occurrences of `name` among the arguments
    pub fn count_of(&self, name: &str) -> usize {
        self.args.iter().filter(|arg| *arg == name).count()
    }

    /// Single shell line that reproduces this command
    ///
    /// Tokens made only of shell-safe characters are left bare, everything
    /// else is single-quoted.
    pub fn to_shell_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|token| shell_quote(&token.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `std::process::Command` with inherited environment and stdio
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

fn shell_quote(token: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c);
    if !token.is_empty() && token.chars().all(safe) {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

/// Build the fine-tuning command line
///
/// The entry point and DeepSpeed settings file are resolved against
/// `launcher_dir`, never against the current working directory. The result
/// depends only on the arguments, so identical inputs give identical commands.
///
/// # Example
/// ```
/// use chid_config::FinetuneSettings;
/// use chid_launch::build_command;
/// use std::path::Path;
///
/// let command = build_command(&FinetuneSettings::default(), Path::new("/opt/chid/scripts"), None);
/// assert_eq!(command.value_of("--master_port").unwrap(), "1122");
/// assert_eq!(command.value_of("--batch-size").unwrap(), "8");
/// ```
pub fn build_command(
    settings: &FinetuneSettings,
    launcher_dir: &Path,
    port: Option<&str>,
) -> LaunchCommand {
    let paths = &settings.paths;
    let model = &settings.model;
    let training = &settings.training;
    let launch = &settings.launch;

    let mut command = LaunchCommand::new(&launch.python);
    command
        .flag_value("-m", &launch.launcher_module)
        .flag_value("--master_port", resolve_master_port(port))
        .flag_value("--nproc_per_node", launch.nproc_per_node.to_string())
        .arg(launcher_dir.join(&launch.entry_point))
        .switch("--do_train", training.do_train)
        .switch("--do_eval", training.do_eval)
        .flag_value("--data_dir", &paths.data_dir)
        .flag_value("--model-parallel-size", model.model_parallel_size.to_string())
        .flag_value("--num-layers", model.num_layers.to_string())
        .flag_value("--hidden-size", model.hidden_size.to_string())
        .flag_value("--load", &paths.checkpoint_path)
        .flag_value("--num-attention-heads", model.num_attention_heads.to_string())
        .flag_value("--seq-length", model.seq_length.to_string())
        .flag_value(
            "--max-position-embeddings",
            model.max_position_embeddings.to_string(),
        )
        .flag_value("--tokenizer-type", &model.tokenizer_type)
        .switch("--fp16", training.fp16)
        .flag_value("--cache-dir", &paths.cache_dir)
        .flag_value("--tokenizer-path", &paths.tokenizer_path)
        .flag_value("--vocab-size", model.vocab_size.to_string())
        .flag_value("--lr", training.learning_rate.to_string())
        .flag_value("--warmup", training.warmup.to_string())
        .flag_value("--batch-size", training.batch_size.to_string())
        .switch("--deepspeed", launch.deepspeed);
    if launch.deepspeed {
        command.flag_value("--deepspeed_config", launcher_dir.join(&launch.deepspeed_config));
    }
    command
        .flag_value("--log-interval", training.log_interval.to_string())
        .flag_value("--eval-interval", training.eval_interval.to_string())
        .flag_value("--seed", training.seed.to_string())
        .flag_value("--results_dir", &paths.results_dir)
        .flag_value("--model_name", &launch.model_name)
        .flag_value("--epoch", training.epochs.to_string())
        .switch("--checkpoint-activations", training.checkpoint_activations)
        .switch(
            "--deepspeed-activation-checkpointing",
            launch.deepspeed && training.checkpoint_activations,
        );
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_master_port() {
        assert_eq!(resolve_master_port(None), "1122");
        assert_eq!(resolve_master_port(Some("")), "1122");
        assert_eq!(resolve_master_port(Some("9090")), "9090");
        assert_eq!(resolve_master_port(Some("not-a-port")), "not-a-port");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("--lr"), "--lr");
        assert_eq!(shell_quote("/data/chid/"), "/data/chid/");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("my dir"), "'my dir'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_value_of_missing_flag() {
        let mut command = LaunchCommand::new("python3");
        command.arg("--fp16");
        assert_eq!(command.value_of("--lr"), None);
        assert_eq!(command.value_of("--fp16"), None);
        assert_eq!(command.count_of("--fp16"), 1);
    }
}
