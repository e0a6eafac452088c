//! Type-safe vocabulary for project specs and sequence steps
//!
//! This module replaces stringly-typed batch fields with proper Rust enums
//! that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Declared expectation for an operation outcome.
///
/// Mutating steps carry `success: yes|no` and verification steps carry
/// `found: yes|no`. The default is `yes` everywhere, matching the batch
/// format: an omitted expectation means "this is supposed to work".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Expect {
    #[default]
    Yes,
    No,
}

impl Expect {
    /// The expectation as a bool: `yes` expects the operation to be accepted.
    #[inline]
    pub const fn as_bool(self) -> bool {
        matches!(self, Self::Yes)
    }
}

/// TrustZone flavor of a generated project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectKind {
    #[default]
    Flat,
    Secure,
    /// Non-secure projects additionally need the secure bundle of a
    /// previously generated secure project.
    Nonsecure,
}

/// Build invocation mode passed to the build bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Incremental,
    Full,
}

/// Toolchain families the batch format understands.
///
/// Batch files name toolchains loosely ("gcc", "GNU ARM Embedded", "IAR",
/// "arm compiler 6"); the family drives how the concrete toolchain and its
/// default version are resolved against the bridge's installed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ToolchainFamily {
    Gcc,
    Iar,
    Ac6,
    /// Anything else is passed through to the bridge verbatim.
    Other,
}

impl ToolchainFamily {
    /// Classify a free-form toolchain name from a batch file.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("gcc") || lower.contains("gnu") {
            Self::Gcc
        } else if lower.contains("iar") {
            Self::Iar
        } else if lower.contains("ac6") || lower.contains("arm compiler") {
            Self::Ac6
        } else {
            Self::Other
        }
    }
}

/// Which property table a `change_property` / `deselect_option` step targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyScope {
    /// A property on the module instance or thread itself.
    #[default]
    Instance,
    /// A property shared by all instances of the module.
    Common,
    /// A property of an RTOS object; the property id is resolved relative
    /// to the object's id.
    Rtos,
}

/// Resolve an RTOS object type name (as written in batch files, e.g.
/// `"QUEUE"` or `"Binary Semaphore"`) to the object-id fragment used by the
/// configurator.
pub fn rtos_object_id(kind: &str) -> Option<&'static str> {
    match kind.to_uppercase().as_str() {
        "EVENT GROUP" | "EVENT FLAGS" => Some("flags"),
        "MUTEX" => Some("mutex"),
        "COUNTING SEMAPHORE" => Some("semaphore"),
        "BINARY SEMAPHORE" => Some("binary_semaphore"),
        "QUEUE" => Some("queue"),
        "STREAM BUFFER" => Some("stream_buffer"),
        "MESSAGE BUFFER" => Some("message_buffer"),
        "TIMER" => Some("timer"),
        _ => None,
    }
}

/// Mangle a descriptive project name into one the IDE accepts.
///
/// The IDE rejects most punctuation in project names, so characters that
/// commonly appear in template and board names are spelled out.
pub fn safe_project_name(input: &str) -> String {
    input
        .replace('-', "dash")
        .replace(' ', "space")
        .replace('+', "plus")
        .replace('.', "dot")
        .replace('(', "op")
        .replace(')', "cp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_defaults_to_yes() {
        assert_eq!(Expect::default(), Expect::Yes);
        assert!(Expect::Yes.as_bool());
        assert!(!Expect::No.as_bool());
    }

    #[test]
    fn test_expect_serde_round_trip() {
        let e: Expect = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(e, Expect::No);
        assert_eq!(serde_json::to_string(&Expect::Yes).unwrap(), "\"yes\"");
    }

    #[test]
    fn test_toolchain_classification() {
        assert_eq!(ToolchainFamily::classify("GNU ARM Embedded"), ToolchainFamily::Gcc);
        assert_eq!(ToolchainFamily::classify("gcc"), ToolchainFamily::Gcc);
        assert_eq!(ToolchainFamily::classify("IAR Toolchain for Arm"), ToolchainFamily::Iar);
        assert_eq!(ToolchainFamily::classify("ARM Compiler 6"), ToolchainFamily::Ac6);
        assert_eq!(ToolchainFamily::classify("ac6"), ToolchainFamily::Ac6);
        assert_eq!(ToolchainFamily::classify("llvm"), ToolchainFamily::Other);
    }

    #[test]
    fn test_rtos_object_id_mapping() {
        assert_eq!(rtos_object_id("queue"), Some("queue"));
        assert_eq!(rtos_object_id("Binary Semaphore"), Some("binary_semaphore"));
        assert_eq!(rtos_object_id("EVENT GROUP"), Some("flags"));
        assert_eq!(rtos_object_id("EVENT FLAGS"), Some("flags"));
        assert_eq!(rtos_object_id("mailbox"), None);
    }

    #[test]
    fn test_safe_project_name() {
        assert_eq!(
            safe_project_name("2.3.0_FreeRTOS - Minimal_EK-RA6M3"),
            "2dot3dot0_FreeRTOSspacedashspaceMinimal_EKdashRA6M3"
        );
        assert_eq!(safe_project_name("plain_name"), "plain_name");
    }
}
