//! Input classification.
//!
//! Every non-blank input line maps to exactly one [`ExecutionPlan`].
//! Rules are checked in priority order and the first match wins:
//!
//! 1. Built-ins (`/help`, `!name`, `exit`, `clear`, `cd`, `deactivate`)
//! 2. Environment-mutating scripts (`source`, `.../activate`, `activate <env>`)
//! 3. Interactive commands, streamed or handed the terminal
//! 4. Everything else runs captured

use std::collections::BTreeSet;
use std::path::Path;

use crate::config::ShellConfig;
use crate::shell::platform;

/// Leading tokens that only an interpreter understands.
const INTERPRETER_BUILTINS: &[&str] = &[
    "source", "export", "unset", "alias", "unalias", "declare", "typeset", "readonly", "type",
    "umask", "ulimit", "command", "hash", "set", "shopt", "wait",
];

/// Substrings that signal control operators or builtins.
const INTERPRETER_MARKERS: &[&str] = &["&&", "||", ";", "export ", "unset "];

/// Characters whose meaning depends on interpreter expansion.
const METACHARACTERS: &[char] = &[
    '|', '<', '>', '*', '?', '[', '$', '`', '~', '(', ')', '{', '}', '&',
];

/// A command handled inside the engine without spawning a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Clear,
    Help,
    /// `cd` with its unquoted target, `None` for the home directory.
    Cd(Option<String>),
    Deactivate,
    /// `!name` environment-status command.
    Environment(String),
}

/// How an environment-mutating script is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `source <file>`
    Source,
    /// A path ending in `/activate` or `\activate`.
    ActivateScript,
    /// `activate <env>` through conda.
    CondaActivate,
}

impl MutationKind {
    /// Name used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::Source => "source",
            MutationKind::ActivateScript | MutationKind::CondaActivate => "activate",
        }
    }
}

/// The resolved execution strategy for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPlan {
    Builtin(Builtin),
    ShellMutating { kind: MutationKind, target: String },
    StreamingInteractive(String),
    PassthroughInteractive(String),
    Regular {
        command: String,
        needs_interpreter: bool,
    },
}

impl ExecutionPlan {
    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionPlan::Builtin(_) => "builtin",
            ExecutionPlan::ShellMutating { .. } => "shell-mutating",
            ExecutionPlan::StreamingInteractive(_) => "streaming",
            ExecutionPlan::PassthroughInteractive(_) => "passthrough",
            ExecutionPlan::Regular { .. } => "regular",
        }
    }
}

/// Decides how each input line is run.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    interactive: BTreeSet<String>,
    streaming: BTreeSet<String>,
    streaming_supported: bool,
}

impl CommandClassifier {
    /// Build from the configured command sets.
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            interactive: config.interactive_commands.clone(),
            streaming: config.streaming_commands.clone(),
            streaming_supported: platform::supports_streaming(),
        }
    }

    /// Override platform streaming support.
    pub fn with_streaming_support(mut self, supported: bool) -> Self {
        self.streaming_supported = supported;
        self
    }

    /// Classify one input line.
    ///
    /// Returns `None` only for blank input.
    pub fn classify(&self, text: &str) -> Option<ExecutionPlan> {
        let normalized = text.trim();
        if normalized.is_empty() {
            return None;
        }

        let plan = self
            .classify_builtin(normalized)
            .or_else(|| classify_mutating(normalized))
            .unwrap_or_else(|| self.classify_external(normalized));

        tracing::debug!("Classified {:?} as {}", normalized, plan.kind());
        Some(plan)
    }

    fn classify_builtin(&self, normalized: &str) -> Option<ExecutionPlan> {
        if normalized == "/help" {
            return Some(ExecutionPlan::Builtin(Builtin::Help));
        }
        if let Some(name) = normalized.strip_prefix('!') {
            return Some(ExecutionPlan::Builtin(Builtin::Environment(
                name.trim().to_string(),
            )));
        }

        let builtin = match normalized {
            "exit" => Builtin::Exit,
            "clear" => Builtin::Clear,
            "deactivate" => Builtin::Deactivate,
            "cd" => Builtin::Cd(None),
            _ => {
                let (head, rest) = split_first_word(normalized);
                if head != "cd" {
                    return None;
                }
                Builtin::Cd(Some(unquote(rest)).filter(|p| !p.is_empty()))
            }
        };
        Some(ExecutionPlan::Builtin(builtin))
    }

    fn classify_external(&self, normalized: &str) -> ExecutionPlan {
        if self.is_interactive(normalized) {
            if self.streaming_supported && self.is_streaming(normalized) {
                return ExecutionPlan::StreamingInteractive(normalized.to_string());
            }
            return ExecutionPlan::PassthroughInteractive(normalized.to_string());
        }

        ExecutionPlan::Regular {
            command: normalized.to_string(),
            needs_interpreter: needs_interpreter(normalized),
        }
    }

    fn is_interactive(&self, text: &str) -> bool {
        let mut words = text.split_whitespace();
        let Some(first) = words.next() else {
            return false;
        };
        if self.interactive.contains(first) {
            return true;
        }
        if first == "sudo" && words.next().is_some_and(|w| self.interactive.contains(w)) {
            return true;
        }
        text.contains('|')
            && text
                .split('|')
                .filter_map(|segment| segment.split_whitespace().next())
                .any(|head| self.interactive.contains(head))
    }

    fn is_streaming(&self, text: &str) -> bool {
        let mut words = text.split_whitespace();
        let Some(mut base) = words.next() else {
            return false;
        };
        if base == "sudo" {
            match words.next() {
                Some(next) => base = next,
                None => return false,
            }
        }
        let name = Path::new(base)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(base);
        self.streaming.contains(name)
    }
}

fn classify_mutating(normalized: &str) -> Option<ExecutionPlan> {
    let (head, rest) = split_first_word(normalized);

    if head == "source" {
        return Some(ExecutionPlan::ShellMutating {
            kind: MutationKind::Source,
            target: unquote(rest),
        });
    }
    if normalized.ends_with("/activate") || normalized.ends_with("\\activate") {
        return Some(ExecutionPlan::ShellMutating {
            kind: MutationKind::ActivateScript,
            target: normalized.to_string(),
        });
    }
    if head == "activate" && !rest.is_empty() {
        return Some(ExecutionPlan::ShellMutating {
            kind: MutationKind::CondaActivate,
            target: rest.to_string(),
        });
    }
    None
}

/// Whether a captured command must run as `<shell> -c <text>`.
///
/// Unbalanced quoting also forces the interpreter so the user sees the
/// interpreter's own syntax error.
pub fn needs_interpreter(text: &str) -> bool {
    let head = text.split_whitespace().next().unwrap_or("");
    INTERPRETER_BUILTINS.contains(&head)
        || is_assignment(head)
        || INTERPRETER_MARKERS.iter().any(|m| text.contains(m))
        || text.contains("source ")
        || text.contains(METACHARACTERS)
        || shlex::split(text).is_none()
}

/// `NAME=value` prefix token, as in `LANG=C sort data.txt`.
fn is_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// First whitespace-delimited token of a command line.
pub fn base_command(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

fn split_first_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

/// Strip shell quoting from a single operand, keeping the raw text when
/// it does not form exactly one word.
fn unquote(raw: &str) -> String {
    match shlex::split(raw) {
        Some(words) if words.len() == 1 => words.into_iter().next().unwrap_or_default(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CommandClassifier {
        CommandClassifier::new(&ShellConfig::default()).with_streaming_support(true)
    }

    fn classify(text: &str) -> ExecutionPlan {
        classifier().classify(text).unwrap()
    }

    #[test]
    fn blank_input_has_no_plan() {
        assert!(classifier().classify("").is_none());
        assert!(classifier().classify("   \t").is_none());
    }

    #[test]
    fn exact_builtins() {
        assert_eq!(classify("exit"), ExecutionPlan::Builtin(Builtin::Exit));
        assert_eq!(classify("  clear "), ExecutionPlan::Builtin(Builtin::Clear));
        assert_eq!(
            classify("deactivate"),
            ExecutionPlan::Builtin(Builtin::Deactivate)
        );
        assert_eq!(classify("/help"), ExecutionPlan::Builtin(Builtin::Help));
    }

    #[test]
    fn exit_with_arguments_is_not_the_builtin() {
        assert!(matches!(classify("exit 3"), ExecutionPlan::Regular { .. }));
    }

    #[test]
    fn cd_variants() {
        assert_eq!(classify("cd"), ExecutionPlan::Builtin(Builtin::Cd(None)));
        assert_eq!(
            classify("cd /tmp"),
            ExecutionPlan::Builtin(Builtin::Cd(Some("/tmp".into())))
        );
        assert_eq!(
            classify("cd \"my dir\""),
            ExecutionPlan::Builtin(Builtin::Cd(Some("my dir".into())))
        );
        assert!(matches!(classify("cdrecord"), ExecutionPlan::Regular { .. }));
    }

    #[test]
    fn environment_commands() {
        assert_eq!(
            classify("!git"),
            ExecutionPlan::Builtin(Builtin::Environment("git".into()))
        );
        assert_eq!(
            classify("!nope"),
            ExecutionPlan::Builtin(Builtin::Environment("nope".into()))
        );
    }

    #[test]
    fn source_is_shell_mutating() {
        assert_eq!(
            classify("source env.sh"),
            ExecutionPlan::ShellMutating {
                kind: MutationKind::Source,
                target: "env.sh".into()
            }
        );
        assert_eq!(
            classify("source"),
            ExecutionPlan::ShellMutating {
                kind: MutationKind::Source,
                target: String::new()
            }
        );
    }

    #[test]
    fn activate_scripts_and_conda() {
        assert_eq!(
            classify("venv/bin/activate"),
            ExecutionPlan::ShellMutating {
                kind: MutationKind::ActivateScript,
                target: "venv/bin/activate".into()
            }
        );
        assert_eq!(
            classify("env\\Scripts\\activate"),
            ExecutionPlan::ShellMutating {
                kind: MutationKind::ActivateScript,
                target: "env\\Scripts\\activate".into()
            }
        );
        assert_eq!(
            classify("activate ml"),
            ExecutionPlan::ShellMutating {
                kind: MutationKind::CondaActivate,
                target: "ml".into()
            }
        );
    }

    #[test]
    fn vim_is_passthrough() {
        assert_eq!(
            classify("vim file.txt"),
            ExecutionPlan::PassthroughInteractive("vim file.txt".into())
        );
    }

    #[test]
    fn sudo_is_unwrapped_for_streaming() {
        assert_eq!(
            classify("sudo apt upgrade"),
            ExecutionPlan::StreamingInteractive("sudo apt upgrade".into())
        );
        assert_eq!(
            classify("sudo vim /etc/hosts"),
            ExecutionPlan::PassthroughInteractive("sudo vim /etc/hosts".into())
        );
    }

    #[test]
    fn streaming_falls_back_without_platform_support() {
        let plan = CommandClassifier::new(&ShellConfig::default())
            .with_streaming_support(false)
            .classify("apt install jq")
            .unwrap();
        assert_eq!(plan, ExecutionPlan::PassthroughInteractive("apt install jq".into()));
    }

    #[test]
    fn streaming_matches_executable_basename() {
        assert_eq!(
            classify("sudo /usr/bin/apt list"),
            ExecutionPlan::StreamingInteractive("sudo /usr/bin/apt list".into())
        );
    }

    #[test]
    fn pipeline_into_interactive_segment() {
        assert_eq!(
            classify("cat log.txt | less"),
            ExecutionPlan::PassthroughInteractive("cat log.txt | less".into())
        );
    }

    #[test]
    fn ls_is_regular_direct() {
        assert_eq!(
            classify("ls -l"),
            ExecutionPlan::Regular {
                command: "ls -l".into(),
                needs_interpreter: false
            }
        );
    }

    #[test]
    fn control_operators_need_interpreter() {
        for text in [
            "make && make install",
            "false || echo fallback",
            "echo a; echo b",
            "export FOO=bar",
            "alias ll='ls -l'",
            "FOO=1 unset BAR",
            "echo $HOME",
            "ls *.rs",
            "grep foo < input.txt",
        ] {
            match classify(text) {
                ExecutionPlan::Regular {
                    needs_interpreter, ..
                } => assert!(needs_interpreter, "{text}"),
                other => panic!("{text} classified as {other:?}"),
            }
        }
    }

    #[test]
    fn assignments_and_shell_builtins_need_interpreter() {
        for text in [
            "GREETING=hello printenv GREETING",
            "_X1=1 env",
            "type ls",
            "umask",
            "ulimit -n",
            "command -v git",
            "hash -r",
            "set -o",
            "shopt -s globstar",
            "wait",
        ] {
            assert!(needs_interpreter(text), "{text}");
        }
    }

    #[test]
    fn equals_inside_arguments_stays_direct() {
        assert!(!needs_interpreter("git config user.name=me"));
        assert!(!needs_interpreter("dd if=in.img of=out.img"));
        assert!(!is_assignment("=value"));
        assert!(!is_assignment("9LIVES=1"));
        assert!(is_assignment("LANG=C"));
    }

    #[test]
    fn unbalanced_quotes_degrade_to_interpreter() {
        assert_eq!(
            classify("echo \"unterminated"),
            ExecutionPlan::Regular {
                command: "echo \"unterminated".into(),
                needs_interpreter: true
            }
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        for text in ["ls -la", "sudo apt upgrade", "cd ..", "echo 'x"] {
            assert_eq!(c.classify(text), c.classify(text));
        }
    }

    #[test]
    fn base_command_is_first_word() {
        assert_eq!(base_command("  touch a b"), Some("touch"));
        assert_eq!(base_command("   "), None);
    }
}
