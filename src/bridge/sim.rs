//! In-memory bridge implementation
//!
//! `SimBridge` models just enough of the configurator to execute batches
//! offline: a workspace of generated projects, per-project configuration
//! objects (threads, stacks, properties, RTOS objects), acceptance rules
//! for values a constraint should reject, a problems list, and scripted
//! build output.
//!
//! By default the model is permissive: unknown pin components, clock
//! nodes, and property values are accepted, so a batch written against
//! the real IDE can be dry-run without seeding. Tests seed rejections and
//! problems to exercise the expectation paths.
//!
//! Diagnostics go to the `bridge` log target so they can be separated
//! from the batch output (`RUST_LOG=bridge=debug`).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};

use log::debug;

use super::{
    Attempt, BridgeError, ConfigBridge, GenerationStatus, Handle, ProjectBridge, ProjectRequest,
};
use crate::types::BuildMode;

const DEFAULT_BUILD_OUTPUT: &str =
    "13:37:00 Build Finished. 0 errors, 0 warnings. (took 2s.123ms)";

/// Shared configurator model, cloned into every opened configuration.
#[derive(Debug, Clone, Default)]
struct Model {
    /// module id -> declared `<requires>` interface ids
    module_interfaces: HashMap<String, Vec<String>>,
    /// module ids offered for creation on any thread
    creatable: Vec<String>,
    /// property id -> rejected value -> reason
    rejected_properties: HashMap<String, HashMap<String, String>>,
    /// property id -> rejected option -> reason
    rejected_options: HashMap<String, HashMap<String, String>>,
    /// (component id, attr, value) -> reason
    rejected_pin_attrs: HashMap<(String, String, String), String>,
    /// (node id, value) -> reason
    rejected_clocks: HashMap<(String, String), String>,
    /// initial property values
    property_values: HashMap<String, String>,
    /// active constraint-violation messages
    problems: Vec<String>,
}

#[derive(Debug)]
struct SimProject {
    location: PathBuf,
    /// Managed-build-settings edits, recorded as
    /// `"<action> <build-config> <target>"` lines for inspection.
    settings: Vec<String>,
}

/// In-memory implementation of [`ProjectBridge`].
#[derive(Debug)]
pub struct SimBridge {
    workspace: PathBuf,
    sdk_versions: Vec<String>,
    toolchains: Vec<(String, Vec<String>)>,
    rtoses: Vec<String>,
    model: Model,
    projects: BTreeMap<String, SimProject>,
    build_outputs: HashMap<String, VecDeque<String>>,
    default_build_output: String,
}

impl SimBridge {
    /// A permissive bridge rooted at `workspace`.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            sdk_versions: vec!["4.0.0".to_string()],
            toolchains: vec![
                (
                    "GNU ARM Embedded".to_string(),
                    vec!["13.2.1.arm-13-7".to_string()],
                ),
                ("IAR Toolchain for Arm".to_string(), Vec::new()),
                ("Arm Compiler 6".to_string(), Vec::new()),
            ],
            rtoses: vec![
                "No RTOS".to_string(),
                "FreeRTOS".to_string(),
                "Azure RTOS ThreadX".to_string(),
            ],
            model: Model::default(),
            projects: BTreeMap::new(),
            build_outputs: HashMap::new(),
            default_build_output: DEFAULT_BUILD_OUTPUT.to_string(),
        }
    }

    /// Declare a module id with its `<requires>` interfaces and offer it
    /// for creation.
    pub fn declare_module(&mut self, module_id: &str, requires: &[&str]) {
        self.model.module_interfaces.insert(
            module_id.to_string(),
            requires.iter().map(|r| r.to_string()).collect(),
        );
        self.model.creatable.push(module_id.to_string());
    }

    /// Reject `value` for a property, as a `<constraint>` would.
    pub fn reject_property_value(&mut self, property_id: &str, value: &str, reason: &str) {
        self.model
            .rejected_properties
            .entry(property_id.to_string())
            .or_default()
            .insert(value.to_string(), reason.to_string());
    }

    /// Reject deselecting `option` on a property.
    pub fn reject_option(&mut self, property_id: &str, option: &str, reason: &str) {
        self.model
            .rejected_options
            .entry(property_id.to_string())
            .or_default()
            .insert(option.to_string(), reason.to_string());
    }

    /// Reject a pin-component attribute value.
    pub fn reject_pin_value(&mut self, component_id: &str, attr: &str, value: &str, reason: &str) {
        self.model.rejected_pin_attrs.insert(
            (
                component_id.to_string(),
                attr.to_string(),
                value.to_string(),
            ),
            reason.to_string(),
        );
    }

    /// Reject a clock node value.
    pub fn reject_clock_value(&mut self, node_id: &str, value: &str, reason: &str) {
        self.model
            .rejected_clocks
            .insert((node_id.to_string(), value.to_string()), reason.to_string());
    }

    /// Seed an active constraint-violation message.
    pub fn add_problem(&mut self, message: &str) {
        self.model.problems.push(message.to_string());
    }

    /// Seed an initial property value.
    pub fn set_initial_property(&mut self, property_id: &str, value: &str) {
        self.model
            .property_values
            .insert(property_id.to_string(), value.to_string());
    }

    /// Queue a build output for one project; outputs are consumed in
    /// order, then the default output applies.
    pub fn queue_build_output(&mut self, project: &str, output: &str) {
        self.build_outputs
            .entry(project.to_string())
            .or_default()
            .push_back(output.to_string());
    }

    /// Replace the default build output used when nothing is queued.
    pub fn set_default_build_output(&mut self, output: &str) {
        self.default_build_output = output.to_string();
    }

    /// Recorded managed-build-settings edits for a project.
    pub fn project_settings(&self, project: &str) -> Option<&[String]> {
        self.projects.get(project).map(|p| p.settings.as_slice())
    }

    fn project_mut(&mut self, name: &str) -> Result<&mut SimProject, BridgeError> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| BridgeError::NoSuchProject(name.to_string()))
    }

    fn record_setting(
        &mut self,
        project: &str,
        action: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError> {
        debug!(target: "bridge", "{} {} {} [{}]", action, target, build_config, project);
        self.project_mut(project)?
            .settings
            .push(format!("{} {} {}", action, build_config, target));
        Ok(())
    }
}

impl ProjectBridge for SimBridge {
    type Config = SimConfig;

    fn sdk_versions(&mut self, _family: &str) -> Result<Vec<String>, BridgeError> {
        Ok(self.sdk_versions.clone())
    }

    fn toolchains(&mut self) -> Result<Vec<String>, BridgeError> {
        Ok(self.toolchains.iter().map(|(n, _)| n.clone()).collect())
    }

    fn toolchain_versions(&mut self, toolchain: &str) -> Result<Vec<String>, BridgeError> {
        Ok(self
            .toolchains
            .iter()
            .find(|(n, _)| n == toolchain)
            .map(|(_, v)| v.clone())
            .unwrap_or_default())
    }

    fn rtos_names(&mut self, _sdk_version: &str, _family: &str) -> Result<Vec<String>, BridgeError> {
        Ok(self.rtoses.clone())
    }

    fn generate_project(
        &mut self,
        request: &ProjectRequest,
    ) -> Result<GenerationStatus, BridgeError> {
        if self.projects.contains_key(&request.name) {
            return Ok(GenerationStatus::Error {
                message: format!("Project \"{}\" already exists", request.name),
            });
        }

        let location = self.workspace.join(&request.name);
        std::fs::create_dir_all(&location)?;
        debug!(target: "bridge", "generated project '{}' at {}", request.name, location.display());

        self.projects.insert(
            request.name.clone(),
            SimProject {
                location,
                settings: Vec::new(),
            },
        );
        Ok(GenerationStatus::Ok)
    }

    fn open_configuration(&mut self, project: &str) -> Result<SimConfig, BridgeError> {
        if !self.projects.contains_key(project) {
            return Err(BridgeError::NoSuchProject(project.to_string()));
        }
        Ok(SimConfig::new(project, self.model.clone()))
    }

    fn project_location(&mut self, project: &str) -> Result<PathBuf, BridgeError> {
        self.projects
            .get(project)
            .map(|p| p.location.clone())
            .ok_or_else(|| BridgeError::NoSuchProject(project.to_string()))
    }

    fn build_project(
        &mut self,
        project: &str,
        mode: BuildMode,
        log_path: &Path,
    ) -> Result<String, BridgeError> {
        if !self.projects.contains_key(project) {
            return Err(BridgeError::NoSuchProject(project.to_string()));
        }

        let output = self
            .build_outputs
            .get_mut(project)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| self.default_build_output.clone());

        debug!(target: "bridge", "{} build of '{}' -> {}", mode, project, log_path.display());
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(log_path, &output)?;
        Ok(output)
    }

    fn add_include_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError> {
        self.record_setting(project, "add-include-path", build_config, target)
    }

    fn remove_include_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError> {
        self.record_setting(project, "remove-include-path", build_config, target)
    }

    fn add_library_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError> {
        self.record_setting(project, "add-library-path", build_config, target)
    }

    fn remove_library_path(
        &mut self,
        project: &str,
        build_config: &str,
        target: &str,
    ) -> Result<(), BridgeError> {
        self.record_setting(project, "remove-library-path", build_config, target)
    }

    fn add_library_file(
        &mut self,
        project: &str,
        build_config: &str,
        lib: &str,
    ) -> Result<(), BridgeError> {
        self.record_setting(project, "add-library-file", build_config, lib)
    }

    fn remove_library_file(
        &mut self,
        project: &str,
        build_config: &str,
        lib: &str,
    ) -> Result<(), BridgeError> {
        self.record_setting(project, "remove-library-file", build_config, lib)
    }
}

#[derive(Debug, Clone)]
enum SimObject {
    Thread {
        hal: bool,
        stacks: Vec<Handle>,
    },
    Module {
        module_id: String,
        object_id: String,
        /// `<requires>` interface id -> currently attached module
        interfaces: BTreeMap<String, Option<Handle>>,
    },
    Property {
        id: String,
    },
    RtosObject {
        object_id: String,
    },
}

/// In-memory implementation of [`ConfigBridge`] for one project.
#[derive(Debug)]
pub struct SimConfig {
    project: String,
    model: Model,
    objects: HashMap<u64, SimObject>,
    next_handle: u64,
    next_instance: u64,
    hal: Handle,
    bsp: Option<Handle>,
    property_values: HashMap<String, String>,
    saves: usize,
}

impl SimConfig {
    fn new(project: &str, model: Model) -> Self {
        let property_values = model.property_values.clone();
        let mut cfg = Self {
            project: project.to_string(),
            model,
            objects: HashMap::new(),
            next_handle: 0,
            next_instance: 0,
            hal: Handle::new(0),
            bsp: None,
            property_values,
            saves: 0,
        };
        cfg.hal = cfg.insert(SimObject::Thread {
            hal: true,
            stacks: Vec::new(),
        });
        cfg
    }

    /// How many times the configuration has been saved.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn insert(&mut self, object: SimObject) -> Handle {
        self.next_handle += 1;
        let handle = Handle::new(self.next_handle);
        self.objects.insert(handle.raw(), object);
        handle
    }

    fn object(&self, handle: Handle) -> Result<&SimObject, BridgeError> {
        self.objects
            .get(&handle.raw())
            .ok_or(BridgeError::UnknownHandle(handle))
    }

    fn thread_stacks_mut(&mut self, handle: Handle) -> Result<&mut Vec<Handle>, BridgeError> {
        match self.objects.get_mut(&handle.raw()) {
            Some(SimObject::Thread { stacks, .. }) => Ok(stacks),
            Some(_) => Err(BridgeError::WrongHandleKind {
                handle,
                expected: "thread",
            }),
            None => Err(BridgeError::UnknownHandle(handle)),
        }
    }

    fn module_interfaces_mut(
        &mut self,
        handle: Handle,
    ) -> Result<(String, &mut BTreeMap<String, Option<Handle>>), BridgeError> {
        match self.objects.get_mut(&handle.raw()) {
            Some(SimObject::Module {
                module_id,
                interfaces,
                ..
            }) => Ok((module_id.clone(), interfaces)),
            Some(_) => Err(BridgeError::WrongHandleKind {
                handle,
                expected: "module",
            }),
            None => Err(BridgeError::UnknownHandle(handle)),
        }
    }

    fn new_module(&mut self, module_id: &str) -> Handle {
        self.next_instance += 1;
        let interfaces = self
            .model
            .module_interfaces
            .get(module_id)
            .map(|reqs| reqs.iter().map(|r| (r.clone(), None)).collect())
            .unwrap_or_default();
        self.insert(SimObject::Module {
            module_id: module_id.to_string(),
            object_id: format!("{}.{}", module_id, 1000000 + self.next_instance),
            interfaces,
        })
    }

    fn property_id(&self, handle: Handle) -> Result<String, BridgeError> {
        match self.object(handle)? {
            SimObject::Property { id } => Ok(id.clone()),
            _ => Err(BridgeError::WrongHandleKind {
                handle,
                expected: "property",
            }),
        }
    }
}

impl ConfigBridge for SimConfig {
    fn hal_thread(&mut self) -> Result<Option<Handle>, BridgeError> {
        Ok(Some(self.hal))
    }

    fn create_thread(&mut self) -> Result<Handle, BridgeError> {
        Ok(self.insert(SimObject::Thread {
            hal: false,
            stacks: Vec::new(),
        }))
    }

    fn create_object(&mut self, object_id: &str) -> Result<Handle, BridgeError> {
        debug!(target: "bridge", "[{}] createObject {}", self.project, object_id);
        Ok(self.insert(SimObject::RtosObject {
            object_id: object_id.to_string(),
        }))
    }

    fn object_id(&mut self, object: Handle) -> Result<String, BridgeError> {
        match self.object(object)? {
            SimObject::Thread { hal, .. } => Ok(if *hal {
                "thread.hal".to_string()
            } else {
                format!("thread.{}", object.raw())
            }),
            SimObject::Module { object_id, .. } => Ok(object_id.clone()),
            SimObject::Property { id } => Ok(id.clone()),
            SimObject::RtosObject { object_id } => Ok(object_id.clone()),
        }
    }

    fn create_stack(&mut self, thread: Handle, module_id: &str) -> Result<Handle, BridgeError> {
        self.thread_stacks_mut(thread)?;
        let stack = self.new_module(module_id);
        self.thread_stacks_mut(thread)?.push(stack);
        debug!(target: "bridge", "[{}] createStack {} on {}", self.project, module_id, thread);
        Ok(stack)
    }

    fn stacks(&mut self, thread: Handle) -> Result<Vec<Handle>, BridgeError> {
        Ok(self.thread_stacks_mut(thread)?.clone())
    }

    fn delete_stack(&mut self, thread: Handle, stack: Handle) -> Result<(), BridgeError> {
        let stacks = self.thread_stacks_mut(thread)?;
        let index = stacks.iter().position(|s| *s == stack).ok_or_else(|| {
            BridgeError::Script(format!("stack {} is not on thread {}", stack, thread))
        })?;
        stacks.remove(index);
        self.objects.remove(&stack.raw());
        Ok(())
    }

    fn creatable_module_ids(&mut self, thread: Handle) -> Result<Vec<String>, BridgeError> {
        self.thread_stacks_mut(thread)?;
        Ok(self.model.creatable.clone())
    }

    fn interface_ids(&mut self, module: Handle) -> Result<Vec<String>, BridgeError> {
        let (_, interfaces) = self.module_interfaces_mut(module)?;
        Ok(interfaces.keys().cloned().collect())
    }

    fn module_of(
        &mut self,
        module: Handle,
        requires_id: &str,
    ) -> Result<Option<Handle>, BridgeError> {
        let (module_id, interfaces) = self.module_interfaces_mut(module)?;
        match interfaces.get(requires_id) {
            Some(slot) => Ok(*slot),
            None => Err(BridgeError::NoSuchInterface {
                module_id,
                requires_id: requires_id.to_string(),
            }),
        }
    }

    fn create_module_in(
        &mut self,
        module: Handle,
        requires_id: &str,
        module_id: &str,
    ) -> Result<Handle, BridgeError> {
        self.module_interfaces_mut(module)?;
        let child = self.new_module(module_id);
        let (_, interfaces) = self.module_interfaces_mut(module)?;
        interfaces.insert(requires_id.to_string(), Some(child));
        Ok(child)
    }

    fn use_existing_module(
        &mut self,
        module: Handle,
        requires_id: &str,
        stack: Handle,
    ) -> Result<(), BridgeError> {
        self.object(stack)?;
        let (_, interfaces) = self.module_interfaces_mut(module)?;
        interfaces.insert(requires_id.to_string(), Some(stack));
        Ok(())
    }

    fn delete_module(&mut self, module: Handle, requires_id: &str) -> Result<(), BridgeError> {
        let (module_id, interfaces) = self.module_interfaces_mut(module)?;
        match interfaces.get_mut(requires_id) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            Some(None) => Err(BridgeError::EmptyInterface {
                module_id,
                requires_id: requires_id.to_string(),
            }),
            None => Err(BridgeError::NoSuchInterface {
                module_id,
                requires_id: requires_id.to_string(),
            }),
        }
    }

    fn bsp(&mut self) -> Result<Handle, BridgeError> {
        if let Some(bsp) = self.bsp {
            return Ok(bsp);
        }
        let bsp = self.new_module("bsp");
        self.bsp = Some(bsp);
        Ok(bsp)
    }

    fn property(&mut self, owner: Handle, id: &str) -> Result<Handle, BridgeError> {
        self.object(owner)?;
        Ok(self.insert(SimObject::Property { id: id.to_string() }))
    }

    fn common_property(&mut self, owner: Handle, id: &str) -> Result<Handle, BridgeError> {
        self.property(owner, id)
    }

    fn property_value(&mut self, property: Handle) -> Result<String, BridgeError> {
        let id = self.property_id(property)?;
        Ok(self.property_values.get(&id).cloned().unwrap_or_default())
    }

    fn set_property_value(
        &mut self,
        property: Handle,
        value: &str,
    ) -> Result<Attempt, BridgeError> {
        let id = self.property_id(property)?;
        if let Some(reason) = self
            .model
            .rejected_properties
            .get(&id)
            .and_then(|values| values.get(value))
        {
            debug!(target: "bridge", "[{}] set {} = {} rejected: {}", self.project, id, value, reason);
            return Ok(Attempt::rejected(reason.clone()));
        }
        self.property_values.insert(id, value.to_string());
        Ok(Attempt::Accepted)
    }

    fn exclude_option(&mut self, property: Handle, option: &str) -> Result<Attempt, BridgeError> {
        let id = self.property_id(property)?;
        if let Some(reason) = self
            .model
            .rejected_options
            .get(&id)
            .and_then(|options| options.get(option))
        {
            return Ok(Attempt::rejected(reason.clone()));
        }
        Ok(Attempt::Accepted)
    }

    fn set_pin_attr(
        &mut self,
        component_id: &str,
        attr: &str,
        value: &str,
    ) -> Result<Attempt, BridgeError> {
        let key = (
            component_id.to_string(),
            attr.to_string(),
            value.to_string(),
        );
        if let Some(reason) = self.model.rejected_pin_attrs.get(&key) {
            return Ok(Attempt::rejected(reason.clone()));
        }
        Ok(Attempt::Accepted)
    }

    fn set_clock_value(&mut self, node_id: &str, value: &str) -> Result<Attempt, BridgeError> {
        let key = (node_id.to_string(), value.to_string());
        if let Some(reason) = self.model.rejected_clocks.get(&key) {
            return Ok(Attempt::rejected(reason.clone()));
        }
        Ok(Attempt::Accepted)
    }

    fn problems(&mut self) -> Result<Vec<String>, BridgeError> {
        Ok(self.model.problems.clone())
    }

    fn save(&mut self) -> Result<(), BridgeError> {
        self.saves += 1;
        debug!(target: "bridge", "[{}] configuration saved", self.project);
        Ok(())
    }

    fn generate_content(&mut self) -> Result<(), BridgeError> {
        debug!(target: "bridge", "[{}] project content generated", self.project);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> (tempfile::TempDir, SimBridge) {
        let dir = tempfile::tempdir().unwrap();
        let bridge = SimBridge::new(dir.path());
        (dir, bridge)
    }

    fn request(name: &str) -> ProjectRequest {
        ProjectRequest {
            name: name.to_string(),
            sdk_version: "4.0.0".to_string(),
            board_or_device: "EK-RA6M3".to_string(),
            is_device: false,
            toolchain: "GNU ARM Embedded".to_string(),
            toolchain_version: "13.2.1.arm-13-7".to_string(),
            kind: crate::types::ProjectKind::Flat,
            secure_bundle: None,
            rtos: "No RTOS".to_string(),
            template: "Bare Metal - Minimal".to_string(),
        }
    }

    #[test]
    fn test_duplicate_generation_is_a_status_error() {
        let (_dir, mut bridge) = bridge();
        assert_eq!(
            bridge.generate_project(&request("p0")).unwrap(),
            GenerationStatus::Ok
        );
        match bridge.generate_project(&request("p0")).unwrap() {
            GenerationStatus::Error { message } => assert!(message.contains("already exists")),
            GenerationStatus::Ok => panic!("duplicate generation must fail"),
        }
    }

    #[test]
    fn test_stack_lifecycle() {
        let (_dir, mut bridge) = bridge();
        bridge.declare_module("module.driver.timer_on_gpt", &["module.driver.transfer"]);
        bridge.generate_project(&request("p0")).unwrap();
        let mut cfg = bridge.open_configuration("p0").unwrap();

        let thread = cfg.create_thread().unwrap();
        let stack = cfg.create_stack(thread, "module.driver.timer_on_gpt").unwrap();
        assert_eq!(cfg.stacks(thread).unwrap(), vec![stack]);
        assert!(cfg
            .object_id(stack)
            .unwrap()
            .starts_with("module.driver.timer_on_gpt."));

        // Declared interface exists but is unfilled.
        assert_eq!(cfg.module_of(stack, "module.driver.transfer").unwrap(), None);
        let dep = cfg
            .create_module_in(stack, "module.driver.transfer", "module.driver.transfer_on_dtc")
            .unwrap();
        assert_eq!(
            cfg.module_of(stack, "module.driver.transfer").unwrap(),
            Some(dep)
        );

        cfg.delete_stack(thread, stack).unwrap();
        assert!(cfg.stacks(thread).unwrap().is_empty());
        assert!(matches!(
            cfg.object_id(stack),
            Err(BridgeError::UnknownHandle(_))
        ));
    }

    #[test]
    fn test_property_rejection() {
        let (_dir, mut bridge) = bridge();
        bridge.reject_property_value("config.bsp.stack", "-1", "stack size must be positive");
        bridge.generate_project(&request("p0")).unwrap();
        let mut cfg = bridge.open_configuration("p0").unwrap();

        let bsp = cfg.bsp().unwrap();
        let prop = cfg.property(bsp, "config.bsp.stack").unwrap();
        assert!(cfg.set_property_value(prop, "0x1000").unwrap().accepted());
        assert_eq!(cfg.property_value(prop).unwrap(), "0x1000");
        assert!(!cfg.set_property_value(prop, "-1").unwrap().accepted());
        // Rejected values leave the property untouched.
        assert_eq!(cfg.property_value(prop).unwrap(), "0x1000");
    }

    #[test]
    fn test_queued_build_outputs_are_consumed_in_order() {
        let (_dir, mut bridge) = bridge();
        bridge.generate_project(&request("p0")).unwrap();
        bridge.queue_build_output("p0", "a.c:1: error\nBuild Failed. 1 errors, 0 warnings.");
        let log = bridge.project_location("p0").unwrap().join("Debug/build.log");

        let first = bridge
            .build_project("p0", BuildMode::Incremental, &log)
            .unwrap();
        assert!(first.contains("1 errors"));
        let second = bridge
            .build_project("p0", BuildMode::Incremental, &log)
            .unwrap();
        assert!(second.contains("0 errors"));
        assert_eq!(std::fs::read_to_string(&log).unwrap(), second);
    }
}
