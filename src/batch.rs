//! Batch file handling for loading and validating project specs.
//!
//! A batch file is a JSON array of project specs; each spec names a
//! project to generate and an optional sequence of steps to execute
//! against it. The resolved spec is written back into the generated
//! project as a `project_info.json` sidecar so artifacts stay
//! self-describing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::step::Step;
use crate::types::{rtos_object_id, ProjectKind};

/// File name of the per-project sidecar.
pub const SIDECAR_FILE: &str = "project_info.json";

/// File name of the generation marker consumed by progress tickers.
pub const GENERATED_MARKER: &str = ".generated";

/// Characters the IDE refuses in project names (see
/// [`crate::types::safe_project_name`]).
const UNSAFE_NAME_CHARS: &[char] = &['-', ' ', '+', '.', '(', ')'];

/// One project to generate and exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Project name; must be unique within the batch.
    pub name: String,

    /// SDK version, or `"default"` for the newest installed one.
    #[serde(default = "default_literal")]
    pub sdk_version: String,

    /// Board display name, or a device part number (part numbers start
    /// with `r7f`).
    pub board_or_device: String,

    /// Free-form toolchain name; resolved by family (gcc/iar/ac6).
    pub toolchain: String,

    /// Toolchain version, or `"default"` for the family's default.
    #[serde(default = "default_literal")]
    pub toolchain_version: String,

    /// RTOS short name, matched by substring against the installed RTOS
    /// display names ("FreeRTOS", "Azure", "No RTOS").
    pub rtos: String,

    /// Project template display name.
    pub template: String,

    #[serde(default, rename = "type")]
    pub kind: ProjectKind,

    /// For non-secure projects: the secure project whose bundle to link.
    #[serde(default)]
    pub secure_project: Option<String>,

    /// Path fragment identifying SDK-owned sources in build warnings.
    #[serde(default = "default_warnings_marker")]
    pub warnings_path_marker: String,

    #[serde(default)]
    pub sequence: Vec<Step>,
}

fn default_literal() -> String {
    "default".to_string()
}

fn default_warnings_marker() -> String {
    "/fsp/".to_string()
}

impl ProjectSpec {
    /// Whether `board_or_device` names a device part number rather than a
    /// board.
    pub fn is_device(&self) -> bool {
        self.board_or_device.to_lowercase().starts_with("r7f")
    }

    /// Validate one spec. Sequence steps are checked for the mistakes the
    /// parser cannot catch: conditional required fields, out-of-range
    /// values, unknown RTOS object types, and allow-list patterns that do
    /// not compile.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("project name must not be empty");
        }
        if let Some(bad) = self.name.chars().find(|c| UNSAFE_NAME_CHARS.contains(c)) {
            anyhow::bail!(
                "project name '{}' contains '{}' which the IDE rejects; \
                 mangle the name first (see safe_project_name)",
                self.name,
                bad
            );
        }
        if self.template.trim().is_empty() {
            anyhow::bail!("project '{}': template must not be empty", self.name);
        }
        if self.kind == ProjectKind::Nonsecure && self.secure_project.is_none() {
            anyhow::bail!(
                "project '{}': non-secure projects need a secure_project",
                self.name
            );
        }

        for (index, step) in self.sequence.iter().enumerate() {
            self.validate_step(index, step)?;
        }
        Ok(())
    }

    fn validate_step(&self, index: usize, step: &Step) -> Result<()> {
        let fail = |msg: String| -> Result<()> {
            anyhow::bail!("project '{}', step {} ({}): {}", self.name, index, step.op(), msg)
        };

        match step {
            Step::CreateRtosObject { kind, .. } => {
                if rtos_object_id(kind).is_none() {
                    return fail(format!("unknown RTOS object type '{}'", kind));
                }
            }
            Step::FillRequires {
                use_existing,
                dependant_instance_name,
                module_id,
                name,
                ..
            } => {
                if *use_existing {
                    if dependant_instance_name.is_none() {
                        return fail("use: true needs dependant_instance_name".to_string());
                    }
                } else if module_id.is_none() {
                    return fail("module_id is required unless use: true".to_string());
                } else if name.is_none() {
                    return fail("name is required when creating a module".to_string());
                }
            }
            Step::Build {
                completed,
                warnings_allowed,
            } => {
                if *completed > 1 {
                    return fail(format!("completed must be 0 or 1, got {}", completed));
                }
                for pattern in warnings_allowed.iter().flatten() {
                    if let Err(e) = regex::Regex::new(pattern) {
                        return fail(format!("bad warnings_allowed pattern '{}': {}", pattern, e));
                    }
                }
            }
            Step::SearchFile { regex_matches, .. } => {
                for pattern in regex_matches {
                    if let Err(e) = regex::Regex::new(pattern) {
                        return fail(format!("bad regex_matches pattern '{}': {}", pattern, e));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Write the resolved spec into the generated project so artifacts
    /// don't have to be decoded from the project name.
    pub fn write_sidecar(&self, project_root: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize project spec to JSON")?;
        let path = project_root.join(SIDECAR_FILE);
        fs::write(&path, json)
            .with_context(|| format!("Failed to write sidecar to {:?}", path))?;
        Ok(())
    }
}

/// An ordered batch of project specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    pub projects: Vec<ProjectSpec>,
}

impl Batch {
    /// Load a batch from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read batch file {:?}", path.as_ref()))?;
        let batch: Self =
            serde_json::from_str(&content).context("Failed to parse batch JSON")?;
        Ok(batch)
    }

    /// Save a batch to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize batch to JSON")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write batch file {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate every spec and check cross-project rules. Duplicate names
    /// are flagged here even though the runner also reports them at
    /// generation time; failing before a long batch is cheaper.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for spec in &self.projects {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                anyhow::bail!("duplicate project name '{}' in batch", spec.name);
            }
        }
        Ok(())
    }
}
