//! # Workflow Definitions
//!
//! A workflow is a YAML document describing an ordered pipeline of shell
//! steps:
//!
//! ```yaml
//! name: recon
//! description: passive subdomain recon
//! pipeline:
//!   - name: subfinder
//!     cat_base: subdomains
//!     output_file: subs.txt
//!     command: subfinder -d {domain} -o {output_file}
//!   - name: httpx
//!     command: httpx -l subfinder.output_file -o {output_file}
//! ```
//!
//! Step order is execution order, and it also decides which
//! `name.output_file` references a step may use: only earlier steps are
//! visible.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::PipelineError;

/// One unit of work, bound to a single command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub name: String,
    /// Extra directory level grouping related steps in the output tree.
    pub category: Option<String>,
    /// Suffix appended to the generated output file name.
    pub output_file: Option<String>,
    pub command: String,
}

impl PipelineStep {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            output_file: None,
            command: command.into(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(Some(category.into()));
        self
    }

    pub fn with_output_file(mut self, hint: impl Into<String>) -> Self {
        self.output_file = non_blank(Some(hint.into()));
        self
    }
}

/// An ordered, validated list of steps with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    pub fn new(steps: Vec<PipelineStep>) -> Result<Self, PipelineError> {
        let mut names: HashSet<&str> = HashSet::new();

        for (idx, step) in steps.iter().enumerate() {
            if !is_valid_step_name(&step.name) {
                return Err(PipelineError::InvalidStepName {
                    index: idx + 1,
                    name: step.name.clone(),
                });
            }
            if !names.insert(step.name.as_str()) {
                return Err(PipelineError::DuplicateStep(step.name.clone()));
            }
            if step.command.trim().is_empty() {
                return Err(PipelineError::EmptyCommand(step.name.clone()));
            }
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.name == name)
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name.as_str())
    }
}

/// A named pipeline loaded from a workflow file.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub description: Option<String>,
    pub pipeline: Pipeline,
}

#[derive(Deserialize)]
struct RawWorkflow {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    pipeline: Vec<RawStep>,
}

#[derive(Deserialize)]
struct RawStep {
    name: String,
    #[serde(default, alias = "cat_base")]
    category: Option<String>,
    #[serde(default)]
    output_file: Option<String>,
    command: String,
}

impl From<RawStep> for PipelineStep {
    fn from(raw: RawStep) -> Self {
        Self {
            name: raw.name.trim().to_string(),
            category: non_blank(raw.category),
            output_file: non_blank(raw.output_file),
            command: raw.command,
        }
    }
}

impl Workflow {
    /// Parses a workflow document. `fallback_name` is used when the document
    /// has no `name` key.
    pub fn from_yaml(yaml: &str, fallback_name: &str) -> Result<Self, PipelineError> {
        let raw: RawWorkflow = serde_yaml::from_str(yaml)?;

        let name: String = non_blank(raw.name).unwrap_or_else(|| fallback_name.to_string());
        if raw.pipeline.is_empty() {
            return Err(PipelineError::Empty(name));
        }

        let steps: Vec<PipelineStep> = raw.pipeline.into_iter().map(PipelineStep::from).collect();

        Ok(Self {
            name,
            description: non_blank(raw.description),
            pipeline: Pipeline::new(steps)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let yaml: String = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let stem: String = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workflow".to_string());

        Self::from_yaml(&yaml, &stem)
    }
}

/// A step name becomes one directory of the output tree, so it must be a
/// single path component. Anything else goes.
pub fn is_valid_step_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
