// External command recipe source (asp, pkgctl, ...)

use super::{
    RawRecipe, RecipeSource, SourceError, SourceResult, detect_alias, detect_alias_in_diagnostic,
};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Default time allowed for a single recipe fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// How recipe text is fetched from an external tool
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Program to run
    pub program: String,
    /// Arguments placed before the package name
    pub args: Vec<String>,
    /// Kill the fetch after this long
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            program: "asp".to_string(),
            args: vec!["show".to_string()],
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl SourceConfig {
    /// Build from a command line such as `["pkgctl", "repo", "show"]`
    pub fn from_command_line(words: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = words.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn display(&self, package: &str) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(package);
        parts.join(" ")
    }
}

/// Runs `<program> <args..> <package>` and returns its stdout as recipe text
#[derive(Debug, Clone, Default)]
pub struct CommandSource {
    config: SourceConfig,
}

impl CommandSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

impl RecipeSource for CommandSource {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe> {
        let command_line = self.config.display(package);
        debug!("Running {}", command_line);

        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(package)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        // Drain pipes on separate threads so a large PKGBUILD cannot block the child
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match child.wait_timeout(self.config.timeout)? {
            Some(status) => status,
            None => {
                child.kill()?;
                let _ = child.wait();
                return Err(SourceError::Timeout {
                    package: package.to_string(),
                    timeout: self.config.timeout,
                });
            }
        };

        let text = join_reader(stdout_reader)?;
        let diagnostic = join_reader(stderr_reader)?;

        // Split packages are reported on either stream depending on the tool
        let alias_target = detect_alias(&text).or_else(|| detect_alias_in_diagnostic(&diagnostic));
        if let Some(target) = &alias_target {
            info!("{} is part of package {}", package, target);
            return Ok(RawRecipe {
                text,
                diagnostic,
                alias_target,
            });
        }

        if !status.success() {
            return Err(SourceError::Failed {
                package: package.to_string(),
                status: status.to_string(),
                stderr: diagnostic.trim().to_string(),
            });
        }

        if text.trim().is_empty() {
            return Err(SourceError::Empty(package.to_string()));
        }

        Ok(RawRecipe {
            text,
            diagnostic,
            alias_target: None,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join_reader(
    handle: Option<thread::JoinHandle<std::io::Result<String>>>,
) -> SourceResult<String> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| SourceError::Io(std::io::Error::other("pipe reader panicked")))?
            .map_err(SourceError::from),
        None => Ok(String::new()),
    }
}
