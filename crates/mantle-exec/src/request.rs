//! Structured command requests

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

const REDACTED: &str = "<redacted>";

/// A single argument or environment value.
#[derive(Clone)]
pub enum Value {
    Plain(String),
    /// Passed to the child verbatim, rendered as `<redacted>` everywhere else
    Secret(SecretString),
}

impl Value {
    /// The value handed to the child process.
    pub fn expose(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Secret(s) => s.expose_secret(),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => write!(f, "{s:?}"),
            Self::Secret(_) => f.write_str(REDACTED),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) if s.is_empty() => f.write_str("''"),
            Self::Plain(s) if s.chars().any(|c| c.is_whitespace() || c == '\'') => {
                write!(f, "'{}'", s.replace('\'', r"'\''"))
            }
            Self::Plain(s) => f.write_str(s),
            Self::Secret(_) => f.write_str(REDACTED),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Plain(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Plain(s.clone())
    }
}

impl From<&Path> for Value {
    fn from(p: &Path) -> Self {
        Self::Plain(p.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Value {
    fn from(p: PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl From<&PathBuf> for Value {
    fn from(p: &PathBuf) -> Self {
        Self::from(p.as_path())
    }
}

impl From<SecretString> for Value {
    fn from(s: SecretString) -> Self {
        Self::Secret(s)
    }
}

/// An external invocation: program identity plus typed arguments.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    program: String,
    args: Vec<Value>,
    /// `None` removes the variable from the child's environment
    env: BTreeMap<String, Option<Value>>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandRequest {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value.
    pub fn opt(self, flag: &str, value: impl Into<Value>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), Some(value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env.insert(key.into(), None);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply a timeout only when one was given.
    pub fn maybe_timeout(mut self, timeout: Option<Duration>) -> Self {
        if timeout.is_some() {
            self.timeout = timeout;
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[Value] {
        &self.args
    }

    pub fn get_env(&self) -> &BTreeMap<String, Option<Value>> {
        &self.env
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Value of the argument following `flag`, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .find(|pair| !pair[0].is_secret() && pair[0].expose() == flag)
            .map(|pair| pair[1].expose())
    }

    /// Every value following an occurrence of `flag`, in order.
    pub fn flag_values(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|pair| !pair[0].is_secret() && pair[0].expose() == flag)
            .map(|pair| pair[1].expose())
            .collect()
    }

    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args.iter().map(Value::expose));
        for (key, value) in &self.env {
            match value {
                Some(value) => {
                    command.env(key, value.expose());
                }
                None => {
                    command.env_remove(key);
                }
            }
        }
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_redacts_secrets() {
        let request = CommandRequest::new("credhub")
            .arg("login")
            .opt("-u", "credhub-admin")
            .arg("-p")
            .arg(SecretString::from("hunter2"))
            .env("CREDHUB_SECRET", SecretString::from("hunter2"));

        let rendered = request.to_string();
        assert_eq!(rendered, "credhub login -u credhub-admin -p <redacted>");
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn display_quotes_whitespace() {
        let request = CommandRequest::new("bosh").arg("my file.yml").arg("it's").arg("");
        assert_eq!(request.to_string(), r"bosh 'my file.yml' 'it'\''s' ''");
    }

    #[test]
    fn secret_is_exposed_to_child_only() {
        let value = Value::from(SecretString::from("s3cret"));
        assert_eq!(value.expose(), "s3cret");
        assert_eq!(value.to_string(), "<redacted>");
    }

    #[test]
    fn flag_values_in_order() {
        let request = CommandRequest::new("bosh")
            .arg("interpolate")
            .arg("base.yml")
            .opt("-o", "a.yml")
            .opt("-l", "vars.yml")
            .opt("-o", "b.yml");

        assert_eq!(request.flag_values("-o"), vec!["a.yml", "b.yml"]);
        assert_eq!(request.flag_value("-l"), Some("vars.yml"));
        assert_eq!(request.flag_value("--path"), None);
    }

    #[test]
    fn env_remove_is_recorded() {
        let request = CommandRequest::new("bosh")
            .env("BOSH_ENVIRONMENT", "10.0.0.5")
            .env_remove("BOSH_CLIENT");

        assert_eq!(
            request.get_env().get("BOSH_ENVIRONMENT").and_then(|v| v.as_ref()).map(Value::expose),
            Some("10.0.0.5")
        );
        assert!(matches!(request.get_env().get("BOSH_CLIENT"), Some(None)));
    }
}
