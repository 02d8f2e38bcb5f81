//! [`FakeToolchain`]: an in-process stand-in for the external clients.
//!
//! Realism level: **FAKE**. The interpolation engine's extraction mode
//! really reads YAML (so lookups behave like the real engine), rendering
//! concatenates the base and overlay documents, and director/credential
//! store commands succeed with canned output unless overridden.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use mantle_exec::{CommandOutput, CommandRequest, CommandRunner, Result};
use serde_yaml::Value;

/// Output of the fake director's `env` query.
pub const ENV_OUTPUT: &str = "\
Using environment '10.0.0.5' as client 'admin'

Name               bosh-lab
UUID               7d9c0f3e-2d4a-4b8e-9a61-1f2e3d4c5b6a
Version            280.0.0 (00000000)
Director Stemcell  -/1.0
CPI                vsphere_cpi
Features           config_server: enabled
User               admin

Succeeded
";

/// A file referenced by `--ca-cert`, captured while the command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedFile {
    pub path: PathBuf,
    /// Contents at call time, `None` if the file was missing
    pub contents: Option<String>,
}

#[derive(Default)]
pub struct FakeToolchain {
    calls: Mutex<Vec<CommandRequest>>,
    overrides: Mutex<HashMap<(String, String), CommandOutput>>,
    observed: Mutex<Vec<ObservedFile>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `<program> <subcommand>` call return `output`.
    pub fn respond(&self, program: &str, subcommand: &str, output: CommandOutput) {
        self.overrides
            .lock()
            .unwrap()
            .insert((program.to_string(), subcommand.to_string()), output);
    }

    /// Make every `<program> <subcommand>` call exit with `code`.
    pub fn fail(&self, program: &str, subcommand: &str, code: i32, stderr: &str) {
        self.respond(program, subcommand, CommandOutput::new(code, "", stderr));
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<CommandRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests whose first argument is `subcommand`.
    pub fn calls_to(&self, subcommand: &str) -> Vec<CommandRequest> {
        self.calls()
            .into_iter()
            .filter(|r| r.get_args().first().map(|a| a.expose()) == Some(subcommand))
            .collect()
    }

    /// Extraction probes as `(source file, key)` pairs, in order.
    pub fn lookups(&self) -> Vec<(PathBuf, String)> {
        self.calls_to("interpolate")
            .into_iter()
            .filter_map(|r| {
                let key = r.flag_value("--path")?.to_string();
                let source = PathBuf::from(r.get_args().get(1)?.expose());
                Some((source, key))
            })
            .collect()
    }

    pub fn observed_files(&self) -> Vec<ObservedFile> {
        self.observed.lock().unwrap().clone()
    }

    fn interpolate(&self, request: &CommandRequest) -> CommandOutput {
        let Some(base) = request.get_args().get(1).map(|a| PathBuf::from(a.expose())) else {
            return CommandOutput::new(1, "", "Expected one argument for the manifest path");
        };
        let Ok(base_content) = fs::read_to_string(&base) else {
            return CommandOutput::new(1, "", format!("Reading file {}: not found", base.display()));
        };

        if let Some(key) = request.flag_value("--path") {
            return extract(&base_content, key);
        }

        let mut rendered = base_content;
        for overlay in request.flag_values("-o") {
            match fs::read_to_string(overlay) {
                Ok(content) => {
                    if !rendered.ends_with('\n') {
                        rendered.push('\n');
                    }
                    rendered.push_str(&content);
                }
                Err(_) => {
                    return CommandOutput::new(1, "", format!("Reading file {overlay}: not found"));
                }
            }
        }
        for vars in request.flag_values("-l") {
            if fs::metadata(vars).is_err() {
                return CommandOutput::new(1, "", format!("Reading file {vars}: not found"));
            }
        }
        CommandOutput::new(0, rendered, "")
    }
}

impl CommandRunner for FakeToolchain {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(request.clone());

        for path in request.flag_values("--ca-cert") {
            self.observed.lock().unwrap().push(ObservedFile {
                path: PathBuf::from(path),
                contents: fs::read_to_string(path).ok(),
            });
        }

        let subcommand = request
            .get_args()
            .first()
            .map(|a| a.expose().to_string())
            .unwrap_or_default();
        let program = request.program().to_string();

        if let Some(output) = self
            .overrides
            .lock()
            .unwrap()
            .get(&(program, subcommand.clone()))
        {
            return Ok(output.clone());
        }

        Ok(match subcommand.as_str() {
            "interpolate" => self.interpolate(request),
            "env" => CommandOutput::new(0, ENV_OUTPUT, ""),
            "login" => CommandOutput::new(0, "Login Successful\n", ""),
            "create-env" | "delete-env" | "update-cloud-config" | "update-runtime-config" => {
                CommandOutput::new(0, "Succeeded\n", "")
            }
            other => CommandOutput::new(1, "", format!("Unknown command '{other}'")),
        })
    }
}

fn extract(content: &str, key: &str) -> CommandOutput {
    let document: Value = match serde_yaml::from_str(content) {
        Ok(doc) => doc,
        Err(e) => return CommandOutput::new(1, "", format!("Deserializing file: {e}")),
    };

    let mut current = &document;
    for segment in key.trim_start_matches('/').split('/') {
        match current.get(segment) {
            Some(next) => current = next,
            None => {
                return CommandOutput::new(
                    1,
                    "",
                    format!("Expected to find a map key '{segment}' for path '{key}'"),
                );
            }
        }
    }

    let rendered = match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    };
    let rendered = if rendered.ends_with('\n') {
        rendered
    } else {
        format!("{rendered}\n")
    };
    CommandOutput::new(0, rendered, "")
}
