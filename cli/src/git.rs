#![deny(missing_docs)]

//! # Git Access
//!
//! Reads document revisions out of a git repository by shelling out to `git`.
//!
//! Command execution sits behind [`CommandExecutor`] so the revision logic can be
//! tested without a real repository.

use crate::error::{CliError, CliResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Interface for executing an external command.
pub trait CommandExecutor {
    /// Executes the command and returns the output.
    fn execute(&self, program: &str, args: &[&str]) -> CliResult<Output>;
}

/// Standard executor using `std::process::Command`.
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn execute(&self, program: &str, args: &[&str]) -> CliResult<Output> {
        let output = Command::new(program).args(args).output()?;
        Ok(output)
    }
}

/// A git working copy, addressed through `git -C <root>`.
pub struct GitRepo<E: CommandExecutor> {
    root: PathBuf,
    program: String,
    executor: E,
}

impl<E: CommandExecutor> GitRepo<E> {
    /// Opens `root`. The git binary is taken from `GIT`, defaulting to `git`.
    pub fn new(root: impl Into<PathBuf>, executor: E) -> Self {
        let program = std::env::var("GIT").unwrap_or_else(|_| String::from("git"));
        Self {
            root: root.into(),
            program,
            executor,
        }
    }

    /// Top-level directory of the working copy. Fails when `root` is not inside one.
    pub fn toplevel(&self) -> CliResult<PathBuf> {
        let stdout = self.run(&["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(stdout.trim_end()))
    }

    /// Expresses `file` relative to the top-level directory, as git object paths expect.
    ///
    /// Relative inputs are taken to be repository-relative already.
    pub fn relative_path(&self, file: &Path) -> CliResult<String> {
        let relative = if file.is_absolute() {
            let top = self.toplevel()?;
            file.strip_prefix(&top)
                .map_err(|_| {
                    CliError::Git(format!(
                        "{} is outside the repository at {}",
                        file.display(),
                        top.display()
                    ))
                })?
                .to_path_buf()
        } else {
            file.to_path_buf()
        };
        Ok(relative.to_string_lossy().replace('\\', "/"))
    }

    /// Whether `path` has changes staged in the index relative to `HEAD`.
    pub fn is_staged(&self, path: &str) -> CliResult<bool> {
        let stdout = self.run(&["diff", "--cached", "--name-only"])?;
        Ok(stdout.lines().any(|line| line == path))
    }

    /// Contents of `path` at `HEAD`, or `None` when it does not exist there.
    pub fn show_head(&self, path: &str) -> CliResult<Option<String>> {
        self.show_revision("HEAD", path)
    }

    /// Staged (index) contents of `path`, or `None` when it is not in the index.
    pub fn show_index(&self, path: &str) -> CliResult<Option<String>> {
        self.show(&format!(":{path}"))
    }

    /// Contents of `path` at `revision`, or `None` when it does not exist there.
    pub fn show_revision(&self, revision: &str, path: &str) -> CliResult<Option<String>> {
        self.show(&format!("{revision}:{path}"))
    }

    fn show(&self, object: &str) -> CliResult<Option<String>> {
        let output = self.execute(&["show", object])?;
        if output.status.success() {
            return utf8(object, output.stdout).map(Some);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_object(&stderr) {
            tracing::debug!(object, "object not present in revision");
            return Ok(None);
        }
        Err(failure(&self.label(&["show", object]), &output))
    }

    fn run(&self, args: &[&str]) -> CliResult<String> {
        let output = self.execute(args)?;
        if !output.status.success() {
            return Err(failure(&self.label(args), &output));
        }
        utf8(&self.label(args), output.stdout)
    }

    fn execute(&self, args: &[&str]) -> CliResult<Output> {
        let root = self.root.to_string_lossy();
        let mut full = vec!["-C", root.as_ref()];
        full.extend_from_slice(args);
        tracing::debug!(command = %self.label(args), "running git");
        self.executor.execute(&self.program, &full)
    }

    fn label(&self, args: &[&str]) -> String {
        format!("{} -C {} {}", self.program, self.root.display(), args.join(" "))
    }
}

/// `git show` reports a path absent from a tree in a few ways depending on version.
fn is_missing_object(stderr: &str) -> bool {
    stderr.contains("does not exist") || stderr.contains("exists on disk, but not in")
}

fn utf8(label: &str, bytes: Vec<u8>) -> CliResult<String> {
    String::from_utf8(bytes)
        .map_err(|_| CliError::Git(format!("command succeeded, but output was not UTF-8: {label}")))
}

fn failure(label: &str, output: &Output) -> CliError {
    CliError::Git(format!(
        "command failed: {}: {}\nstderr:\n-----\n{}\n-----",
        label,
        output.status,
        String::from_utf8_lossy(&output.stderr).trim_end()
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    /// Answers git commands from a table keyed by the arguments after `-C <root>`.
    #[derive(Default)]
    pub(crate) struct MockExecutor {
        responses: HashMap<String, (i32, String, String)>,
        pub(crate) calls: RefCell<Vec<Vec<String>>>,
    }

    impl MockExecutor {
        pub(crate) fn ok(mut self, args: &str, stdout: &str) -> Self {
            self.responses
                .insert(args.to_string(), (0, stdout.to_string(), String::new()));
            self
        }

        pub(crate) fn fail(mut self, args: &str, stderr: &str) -> Self {
            self.responses
                .insert(args.to_string(), (128, String::new(), stderr.to_string()));
            self
        }
    }

    impl CommandExecutor for MockExecutor {
        fn execute(&self, _program: &str, args: &[&str]) -> CliResult<Output> {
            self.calls
                .borrow_mut()
                .push(args.iter().map(|s| s.to_string()).collect());
            let key = args[2..].join(" ");
            let (code, stdout, stderr) = self
                .responses
                .get(&key)
                .cloned()
                .unwrap_or((1, String::new(), format!("unexpected command: {key}")));
            Ok(Output {
                status: ExitStatus::from_raw(code << 8),
                stdout: stdout.into_bytes(),
                stderr: stderr.into_bytes(),
            })
        }
    }

    #[test]
    fn test_show_passes_repo_root() {
        let mock = MockExecutor::default().ok("show HEAD:api.yaml", "paths: {}\n");
        let repo = GitRepo::new("/work/repo", mock);

        assert_eq!(
            repo.show_head("api.yaml").unwrap().as_deref(),
            Some("paths: {}\n")
        );
        let calls = repo.executor.calls.borrow();
        assert_eq!(calls[0][..3], ["-C", "/work/repo", "show"]);
    }

    #[test]
    fn test_missing_object_is_none() {
        let mock = MockExecutor::default()
            .fail(
                "show HEAD:api.yaml",
                "fatal: path 'api.yaml' does not exist in 'HEAD'",
            )
            .fail(
                "show :api.yaml",
                "fatal: path 'api.yaml' exists on disk, but not in the index",
            );
        let repo = GitRepo::new(".", mock);

        assert!(repo.show_head("api.yaml").unwrap().is_none());
        assert!(repo.show_index("api.yaml").unwrap().is_none());
    }

    #[test]
    fn test_other_failures_are_errors() {
        let mock =
            MockExecutor::default().fail("show v9:api.yaml", "fatal: invalid object name 'v9'");
        let repo = GitRepo::new(".", mock);

        let err = repo.show_revision("v9", "api.yaml").unwrap_err();
        assert!(matches!(err, CliError::Git(_)));
        assert!(err.to_string().contains("invalid object name"));
    }

    #[test]
    fn test_is_staged_matches_whole_lines() {
        let mock = MockExecutor::default()
            .ok("diff --cached --name-only", "docs/api.yaml\nREADME.md\n");
        let repo = GitRepo::new(".", mock);

        assert!(repo.is_staged("docs/api.yaml").unwrap());
        assert!(!repo.is_staged("api.yaml").unwrap());
    }

    #[test]
    fn test_relative_path() {
        let mock = MockExecutor::default().ok("rev-parse --show-toplevel", "/work/repo\n");
        let repo = GitRepo::new("/work/repo", mock);

        assert_eq!(
            repo.relative_path(Path::new("/work/repo/docs/api.yaml")).unwrap(),
            "docs/api.yaml"
        );
        assert_eq!(
            repo.relative_path(Path::new("docs/api.yaml")).unwrap(),
            "docs/api.yaml"
        );
        assert!(repo.relative_path(Path::new("/elsewhere/api.yaml")).is_err());
    }
}
