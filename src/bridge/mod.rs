//! Bridge traits for the external project-generation and configuration APIs
//!
//! The IDE's scripting surface is out of scope for this crate; the batch
//! runner is generic over these traits instead. Two seams exist:
//!
//! - [`ProjectBridge`]: workspace-level operations (catalog queries,
//!   project generation, builds, managed build settings).
//! - [`ConfigBridge`]: one project's live configuration handle (threads,
//!   stacks, properties, pins, clocks, problems).
//!
//! Handles returned by a [`ConfigBridge`] are opaque tokens scoped to that
//! configuration; the runner stores them in its per-project registry and
//! never interprets them.
//!
//! Operations that a constraint may legitimately reject (setting a
//! property, pin, or clock value) return an [`Attempt`] instead of an
//! error: the runner compares the attempt against the step's declared
//! expectation. A [`BridgeError`] is reserved for real failures (unknown
//! handles, missing interfaces, a broken scripting connection) and aborts
//! the remainder of the affected project's sequence.

pub mod sim;

pub use sim::SimBridge;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{BuildMode, ProjectKind};

/// Opaque token for an object owned by a configuration bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a mutation the configurator is allowed to reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Accepted,
    Rejected { reason: String },
}

impl Attempt {
    /// Convenience constructor for a rejection.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Structured result of a project generation request.
///
/// Generation failures (most commonly a duplicate project name) are
/// ordinary outcomes the runner records and skips past, not bridge errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    Ok,
    Error { message: String },
}

/// Errors raised by a bridge implementation.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),

    #[error("handle {handle} is not a {expected}")]
    WrongHandleKind {
        handle: Handle,
        expected: &'static str,
    },

    #[error("no <requires> interface '{requires_id}' on module '{module_id}'")]
    NoSuchInterface {
        module_id: String,
        requires_id: String,
    },

    #[error("no module attached to '{requires_id}' on module '{module_id}'")]
    EmptyInterface {
        module_id: String,
        requires_id: String,
    },

    #[error("no project named '{0}' in the workspace")]
    NoSuchProject(String),

    #[error("no clock node '{0}'")]
    NoSuchClockNode(String),

    #[error("scripting bridge failure: {0}")]
    Script(String),

    #[error("IO error behind the bridge: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the runner needs to request a project generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRequest {
    pub name: String,
    /// Resolved SDK version (never the literal `"default"`).
    pub sdk_version: String,
    pub board_or_device: String,
    /// True when `board_or_device` is a device part number rather than a
    /// board name.
    pub is_device: bool,
    pub toolchain: String,
    pub toolchain_version: String,
    pub kind: ProjectKind,
    /// Secure bundle location, required for non-secure projects.
    pub secure_bundle: Option<PathBuf>,
    pub rtos: String,
    pub template: String,
}

/// Workspace-level bridge: catalogs, project generation, builds, and
/// managed build settings.
pub trait ProjectBridge {
    type Config: ConfigBridge;

    /// Installed SDK versions for an MCU family, newest first.
    fn sdk_versions(&mut self, family: &str) -> Result<Vec<String>, BridgeError>;

    /// Installed toolchain names.
    fn toolchains(&mut self) -> Result<Vec<String>, BridgeError>;

    /// Installed versions of one toolchain. Empty when the toolchain
    /// carries its version in its name.
    fn toolchain_versions(&mut self, toolchain: &str) -> Result<Vec<String>, BridgeError>;

    /// Non-versioned display names of the RTOSes available for an SDK
    /// version.
    fn rtos_names(&mut self, sdk_version: &str, family: &str) -> Result<Vec<String>, BridgeError>;

    /// Generate a project. Returns a structured status; a status error
    /// (e.g. duplicate name) is not a bridge failure.
    fn generate_project(
        &mut self,
        request: &ProjectRequest,
    ) -> Result<GenerationStatus, BridgeError>;

    /// Open the configuration of a generated project.
    fn open_configuration(&mut self, project: &str) -> Result<Self::Config, BridgeError>;

    /// Filesystem root of a generated project.
    fn project_location(&mut self, project: &str) -> Result<PathBuf, BridgeError>;

    /// Build a project, mirroring the combined output to `log_path`, and
    /// return that output.
    fn build_project(
        &mut self,
        project: &str,
        mode: BuildMode,
        log_path: &Path,
    ) -> Result<String, BridgeError>;

    fn add_include_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError>;

    fn remove_include_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError>;

    fn add_library_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError>;

    fn remove_library_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError>;

    fn add_library_file(
        &mut self,
        project: &str,
        build_config: &str,
        lib: &str,
    ) -> Result<(), BridgeError>;

    fn remove_library_file(
        &mut self,
        project: &str,
        build_config: &str,
        lib: &str,
    ) -> Result<(), BridgeError>;
}

/// One project's live configuration handle.
pub trait ConfigBridge {
    /// The HAL/Common thread, if the project has one.
    fn hal_thread(&mut self) -> Result<Option<Handle>, BridgeError>;

    /// Create a new thread.
    fn create_thread(&mut self) -> Result<Handle, BridgeError>;

    /// Create an object by its full id (e.g. `rtos.awsfreertos.object.queue`).
    fn create_object(&mut self, object_id: &str) -> Result<Handle, BridgeError>;

    /// The configurator-assigned id of an object (module instance ids look
    /// like `module.driver.timer_on_gpt.1618864991`).
    fn object_id(&mut self, object: Handle) -> Result<String, BridgeError>;

    /// Create a top-of-stack module instance on a thread.
    fn create_stack(&mut self, thread: Handle, module_id: &str) -> Result<Handle, BridgeError>;

    /// All top-of-stack modules of a thread.
    fn stacks(&mut self, thread: Handle) -> Result<Vec<Handle>, BridgeError>;

    /// Delete a top-of-stack module from a thread.
    fn delete_stack(&mut self, thread: Handle, stack: Handle) -> Result<(), BridgeError>;

    /// Module ids that may currently be added to a thread.
    fn creatable_module_ids(&mut self, thread: Handle) -> Result<Vec<String>, BridgeError>;

    /// The `<requires>` interface ids declared by a module.
    fn interface_ids(&mut self, module: Handle) -> Result<Vec<String>, BridgeError>;

    /// The module currently filling a `<requires>` interface, or `None`
    /// when the interface exists but is unfilled.
    fn module_of(
        &mut self,
        module: Handle,
        requires_id: &str,
    ) -> Result<Option<Handle>, BridgeError>;

    /// Create a module filling a `<requires>` interface.
    fn create_module_in(
        &mut self,
        module: Handle,
        requires_id: &str,
        module_id: &str,
    ) -> Result<Handle, BridgeError>;

    /// Attach an existing stack to a `<requires>` interface.
    fn use_existing_module(
        &mut self,
        module: Handle,
        requires_id: &str,
        stack: Handle,
    ) -> Result<(), BridgeError>;

    /// Remove the module filling a `<requires>` interface.
    fn delete_module(&mut self, module: Handle, requires_id: &str) -> Result<(), BridgeError>;

    /// The BSP pseudo-module.
    fn bsp(&mut self) -> Result<Handle, BridgeError>;

    /// An instance property of a module, thread, or RTOS object.
    fn property(&mut self, owner: Handle, id: &str) -> Result<Handle, BridgeError>;

    /// A common (shared across instances) property of a module.
    fn common_property(&mut self, owner: Handle, id: &str) -> Result<Handle, BridgeError>;

    /// Current value of a property.
    fn property_value(&mut self, property: Handle) -> Result<String, BridgeError>;

    /// Try to set a property value. Constraint rejections are an
    /// [`Attempt::Rejected`], not an error.
    fn set_property_value(
        &mut self,
        property: Handle,
        value: &str,
    ) -> Result<Attempt, BridgeError>;

    /// Try to deselect an option of a multi-select property.
    fn exclude_option(&mut self, property: Handle, option: &str) -> Result<Attempt, BridgeError>;

    /// Try to set an attribute (pin, property, config, or option) of a
    /// pin-configuration component. An unknown component or attribute is a
    /// rejection.
    fn set_pin_attr(
        &mut self,
        component_id: &str,
        attr: &str,
        value: &str,
    ) -> Result<Attempt, BridgeError>;

    /// Try to set a clock tree node value.
    fn set_clock_value(&mut self, node_id: &str, value: &str) -> Result<Attempt, BridgeError>;

    /// Currently active constraint-violation messages.
    fn problems(&mut self) -> Result<Vec<String>, BridgeError>;

    /// Persist the configuration.
    fn save(&mut self) -> Result<(), BridgeError>;

    /// Generate the project content from the current configuration.
    fn generate_content(&mut self) -> Result<(), BridgeError>;
}
