//! Sequence step definitions
//!
//! A project's sequence is an ordered list of steps, each tagged by its
//! `op` field. The whole set of operations is modeled as one exhaustive
//! enum so that dispatch in the runner is compile-time checked and an
//! unrecognized `op` fails at parse time as a spec error instead of being
//! silently skipped.
//!
//! Field names follow the batch file format: steps that create or look up
//! configurator objects register them under `name`, and later steps refer
//! back to those registrations through `thread` / `module` /
//! `module_or_thread` fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Expect, PropertyScope};

/// A property or clock value as written in a batch file. Values may be
/// numeric or textual; the bridge always receives them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Insertion point for `insert_in_file`: a zero-based line index or the
/// literal marker `"EOF"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertAt {
    Line(usize),
    Eof(EofMarker),
}

/// Only the exact string `"EOF"` is accepted as a non-numeric insertion
/// point; anything else is rejected when the batch file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EofMarker {
    #[serde(rename = "EOF")]
    Eof,
}

/// One declarative instruction in a project's sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Look up the HAL/Common thread and register it under `name`.
    GetHal { name: String },

    /// Create a new thread and register it under `name`.
    CreateThread { name: String },

    /// Create an RTOS object (queue, mutex, timer, ...) and register it
    /// under `name`. `os` selects which RTOS owns the object.
    CreateRtosObject {
        name: String,
        #[serde(rename = "type")]
        kind: String,
        #[serde(default = "default_rtos_os")]
        os: String,
    },

    /// Create a module instance (top of stack) on a registered thread.
    Add {
        name: String,
        id: String,
        thread: String,
    },

    /// Fill a `<requires>` dependency of a registered module, either by
    /// creating a new module (`module_id`) or by attaching an existing
    /// registered stack (`use: true` + `dependant_instance_name`).
    FillRequires {
        #[serde(default)]
        name: Option<String>,
        module: String,
        requires_id: String,
        #[serde(default)]
        module_id: Option<String>,
        #[serde(rename = "use", default)]
        use_existing: bool,
        #[serde(default)]
        dependant_instance_name: Option<String>,
    },

    /// Register the module currently filling a `<requires>` dependency.
    GetDependency {
        name: String,
        module: String,
        requires_id: String,
    },

    /// Set an attribute of a pin-configuration component.
    ChangePin {
        id: String,
        attr: String,
        value: String,
        #[serde(default)]
        success: Expect,
    },

    /// Connect a component pin to a port.
    ChangeConnectivity {
        id: String,
        pin: String,
        port: String,
        #[serde(default)]
        success: Expect,
    },

    /// Set a property of a registered module, thread, RTOS object, or the
    /// BSP (`module_or_thread: bsp`).
    ChangeProperty {
        #[serde(rename = "type", default)]
        scope: PropertyScope,
        module_or_thread: String,
        id: String,
        value: PropertyValue,
        #[serde(default)]
        success: Expect,
        #[serde(default)]
        name: Option<String>,
    },

    /// Deselect an option of a multi-select property.
    DeselectOption {
        #[serde(rename = "type", default)]
        scope: PropertyScope,
        module_or_thread: String,
        id: String,
        value: PropertyValue,
        #[serde(default)]
        success: Expect,
        #[serde(default)]
        name: Option<String>,
    },

    /// Check whether any active constraint message contains `search_text`.
    CheckConstraintsMessage {
        search_text: String,
        #[serde(default)]
        found: Expect,
    },

    /// Check the number of currently active constraint messages.
    CheckConstraintsNumber { number: usize },

    /// Replace every occurrence of a literal string in a project file.
    ReplaceInFile {
        src: String,
        #[serde(rename = "match")]
        needle: String,
        replace: String,
    },

    /// Insert text into a project file at a line index or at EOF.
    InsertInFile {
        src: String,
        line: InsertAt,
        text: String,
    },

    /// Add an include path to the project's build settings.
    AddInclude {
        path: String,
        #[serde(default)]
        absolute: bool,
    },

    /// Remove an include path from the project's build settings.
    RemoveInclude {
        path: String,
        #[serde(default)]
        absolute: bool,
    },

    /// Add a library search path and library files to the build settings.
    AddLibrary {
        libs: Vec<String>,
        path: String,
        #[serde(default)]
        absolute: bool,
    },

    /// Remove library files and their search path from the build settings.
    RemoveLibrary {
        libs: Vec<String>,
        path: String,
        #[serde(default)]
        absolute: bool,
    },

    /// Copy a file into the project tree. `src` is resolved from the
    /// invocation directory, `dst` from the project root.
    AddFile { src: String, dst: String },

    /// Copy a directory tree into the project tree.
    AddFolder { src: String, dst: String },

    /// Build the project and compare the outcome against the expectation.
    ///
    /// `completed` is `1` for a build that must finish with zero errors and
    /// `0` for a build that must fail. Warnings within the project's path
    /// marker must all be matched by a `warnings_allowed` regex.
    Build {
        completed: u8,
        #[serde(default)]
        warnings_allowed: Option<Vec<String>>,
    },

    /// Generate project content and write the completion marker file.
    Generate,

    /// Remove the module filling a `<requires>` dependency.
    DeleteDependency { module: String, requires_id: String },

    /// Search a registered module's stack tree for the module satisfying
    /// `requires_id` and register it under `name`.
    FindModule {
        name: String,
        module: String,
        requires_id: String,
    },

    /// Check that a project file matches every regex in `regex_matches`.
    /// Patterns are anchored at the start of the file and `.` matches
    /// newlines, so they are usually written with a leading `.*`.
    SearchFile {
        src: String,
        regex_matches: Vec<String>,
    },

    /// Find a top-of-stack module on a registered thread by module id,
    /// optionally disambiguated by a property value, and register it.
    GetStack {
        name: String,
        thread: String,
        id: String,
        #[serde(default)]
        property_id: Option<String>,
        #[serde(default)]
        property_value: Option<String>,
    },

    /// Set a clock tree node value.
    ChangeClock { id: String, value: PropertyValue },

    /// Check whether a module id can be added to a registered thread.
    CheckIfModuleCanBeAdded {
        thread: String,
        id: String,
        #[serde(default)]
        success: Expect,
    },

    /// Delete a registered top-of-stack module and unregister its name.
    DeleteStack { name: String, thread: String },

    /// Emit a message; with `fail: true` the message is recorded as an
    /// error and fails the batch.
    Log {
        message: String,
        #[serde(default)]
        fail: bool,
    },
}

fn default_rtos_os() -> String {
    "awsfreertos".to_string()
}

impl Step {
    /// The `op` discriminator of this step, for logging and error context.
    pub fn op(&self) -> &'static str {
        match self {
            Step::GetHal { .. } => "get_hal",
            Step::CreateThread { .. } => "create_thread",
            Step::CreateRtosObject { .. } => "create_rtos_object",
            Step::Add { .. } => "add",
            Step::FillRequires { .. } => "fill_requires",
            Step::GetDependency { .. } => "get_dependency",
            Step::ChangePin { .. } => "change_pin",
            Step::ChangeConnectivity { .. } => "change_connectivity",
            Step::ChangeProperty { .. } => "change_property",
            Step::DeselectOption { .. } => "deselect_option",
            Step::CheckConstraintsMessage { .. } => "check_constraints_message",
            Step::CheckConstraintsNumber { .. } => "check_constraints_number",
            Step::ReplaceInFile { .. } => "replace_in_file",
            Step::InsertInFile { .. } => "insert_in_file",
            Step::AddInclude { .. } => "add_include",
            Step::RemoveInclude { .. } => "remove_include",
            Step::AddLibrary { .. } => "add_library",
            Step::RemoveLibrary { .. } => "remove_library",
            Step::AddFile { .. } => "add_file",
            Step::AddFolder { .. } => "add_folder",
            Step::Build { .. } => "build",
            Step::Generate => "generate",
            Step::DeleteDependency { .. } => "delete_dependency",
            Step::FindModule { .. } => "find_module",
            Step::SearchFile { .. } => "search_file",
            Step::GetStack { .. } => "get_stack",
            Step::ChangeClock { .. } => "change_clock",
            Step::CheckIfModuleCanBeAdded { .. } => "check_if_module_can_be_added",
            Step::DeleteStack { .. } => "delete_stack",
            Step::Log { .. } => "log",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_parses_with_defaults() {
        let step: Step = serde_json::from_str(
            r#"{ "op": "change_property", "module_or_thread": "t0",
                 "id": "config.driver.timer.mode", "value": 5 }"#,
        )
        .unwrap();
        match step {
            Step::ChangeProperty {
                scope,
                success,
                value,
                name,
                ..
            } => {
                assert_eq!(scope, PropertyScope::Instance);
                assert_eq!(success, Expect::Yes);
                assert_eq!(value, PropertyValue::Int(5));
                assert!(name.is_none());
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        // The old scripting console silently ignored unknown operations;
        // here they must fail at parse time.
        let result: Result<Step, _> =
            serde_json::from_str(r#"{ "op": "create_rots_object", "name": "q0" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_at_accepts_line_and_eof() {
        let at: InsertAt = serde_json::from_str("12").unwrap();
        assert_eq!(at, InsertAt::Line(12));

        let at: InsertAt = serde_json::from_str("\"EOF\"").unwrap();
        assert_eq!(at, InsertAt::Eof(EofMarker::Eof));

        let bad: Result<InsertAt, _> = serde_json::from_str("\"END\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_fill_requires_use_existing() {
        let step: Step = serde_json::from_str(
            r#"{ "op": "fill_requires", "module": "mod0",
                 "requires_id": "module.driver.transfer",
                 "use": true, "dependant_instance_name": "dma0" }"#,
        )
        .unwrap();
        match step {
            Step::FillRequires {
                use_existing,
                dependant_instance_name,
                module_id,
                ..
            } => {
                assert!(use_existing);
                assert_eq!(dependant_instance_name.as_deref(), Some("dma0"));
                assert!(module_id.is_none());
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_op_names_match_batch_format() {
        let step: Step = serde_json::from_str(r#"{ "op": "generate" }"#).unwrap();
        assert_eq!(step.op(), "generate");

        let step: Step =
            serde_json::from_str(r#"{ "op": "create_thread", "name": "t0" }"#).unwrap();
        assert_eq!(step.op(), "create_thread");
    }
}
