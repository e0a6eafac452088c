//! The sequence interpreter
//!
//! Drives a batch of project specs against the project and configuration
//! bridges: generate each project, execute its sequence steps in declared
//! order against a fresh object registry, persist the configuration, and
//! record every expectation mismatch without halting the batch.
//!
//! Failure policy (in order of severity):
//!
//! - Expectation mismatches, registry/interface lookup failures, and file
//!   check failures are recorded in the [`BatchReport`] and execution
//!   continues with the next step.
//! - A malformed step (spec error) or a bridge-level failure aborts the
//!   remaining steps of that one project; the configuration is still
//!   saved on a best-effort basis and the batch proceeds to the next
//!   project.
//! - Nothing is retried, and the batch itself always runs to completion.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::batch::{Batch, GENERATED_MARKER, ProjectSpec};
use crate::bridge::{
    Attempt, BridgeError, ConfigBridge, GenerationStatus, Handle, ProjectBridge, ProjectRequest,
};
use crate::buildlog::{self, BuildLogError};
use crate::error::Error;
use crate::fileops;
use crate::progress::ProgressTicker;
use crate::registry::{LookupError, ObjectKind, ObjectRegistry};
use crate::report::BatchReport;
use crate::step::Step;
use crate::types::{BuildMode, Expect, ProjectKind, PropertyScope, ToolchainFamily, rtos_object_id};

/// Batch-wide runner settings.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// MCU family used for catalog queries.
    pub family: String,
    /// Cadence of "still working" progress messages.
    pub ticker_cadence: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            family: "ra".to_string(),
            ticker_cadence: Duration::from_secs(20),
        }
    }
}

/// Why a sequence was cut short. Everything else is recorded and skipped
/// past.
enum StepFailure {
    /// Malformed step data that validation could not rule out.
    Spec(String),
    /// The bridge itself failed.
    Bridge(BridgeError),
}

impl From<BridgeError> for StepFailure {
    fn from(e: BridgeError) -> Self {
        Self::Bridge(e)
    }
}

/// Lookup-shaped bridge failures are recorded like registry misses rather
/// than aborting the sequence.
fn is_lookup_failure(e: &BridgeError) -> bool {
    matches!(
        e,
        BridgeError::NoSuchInterface { .. }
            | BridgeError::EmptyInterface { .. }
            | BridgeError::NoSuchClockNode(_)
    )
}

/// Process every project of a batch in order and return the accumulated
/// report. The caller decides what the report means (exit code, error log
/// file).
pub fn run_batch<B: ProjectBridge>(
    bridge: &mut B,
    batch: &Batch,
    options: &RunOptions,
) -> BatchReport {
    let mut report = BatchReport::new();
    info!("Number of projects to be created: {}", batch.projects.len());

    for (index, spec) in batch.projects.iter().enumerate() {
        info!("Creating project {} - {}", index, spec.name);
        report.project_processed();
        run_project(bridge, spec, options, &mut report);
    }

    info!("{}", report.summary());
    report
}

fn run_project<B: ProjectBridge>(
    bridge: &mut B,
    spec: &ProjectSpec,
    options: &RunOptions,
    report: &mut BatchReport,
) {
    // Spec errors fail this project fast, before anything is generated.
    if let Err(e) = spec.validate() {
        report.record(Some(&spec.name), None, format!("Invalid project spec: {:#}", e));
        return;
    }

    let request = match prepare_request(bridge, spec, &options.family) {
        Ok(request) => request,
        Err(e) => {
            report.record(
                Some(&spec.name),
                None,
                format!("Unable to resolve project defaults: {}", e),
            );
            return;
        }
    };

    let ticker = ProgressTicker::pulse("... project creation in progress ...", options.ticker_cadence);
    let status = bridge.generate_project(&request);
    ticker.finish();

    match status {
        Ok(GenerationStatus::Ok) => {}
        Ok(GenerationStatus::Error { message }) => {
            report.record(
                Some(&spec.name),
                None,
                format!("Error in creating project. Error message: {}", message),
            );
            return;
        }
        Err(e) => {
            report.record(Some(&spec.name), None, format!("Project generation failed: {}", e));
            return;
        }
    }

    let project_root = match bridge.project_location(&spec.name) {
        Ok(path) => path,
        Err(e) => {
            report.record(
                Some(&spec.name),
                None,
                format!("Generated project has no location: {}", e),
            );
            return;
        }
    };

    if let Err(e) = spec.write_sidecar(&project_root) {
        report.record(Some(&spec.name), None, format!("Failed to write sidecar: {}", e));
    }

    if spec.sequence.is_empty() {
        debug!("Using blank template");
        return;
    }

    debug!("Opening project - {}", spec.name);
    let cfg = match bridge.open_configuration(&spec.name) {
        Ok(cfg) => cfg,
        Err(e) => {
            report.record(
                Some(&spec.name),
                None,
                format!("Failed to open project configuration: {}", e),
            );
            return;
        }
    };

    SequenceRunner {
        bridge,
        cfg,
        spec,
        project_root,
        registry: ObjectRegistry::new(),
        build_counter: 0,
        options,
    }
    .run(report);
}

/// Resolve the `"default"` placeholders of a spec against the bridge
/// catalogs and assemble the generation request.
fn prepare_request<B: ProjectBridge>(
    bridge: &mut B,
    spec: &ProjectSpec,
    family: &str,
) -> Result<ProjectRequest, Error> {
    let sdk_version = if spec.sdk_version == "default" {
        bridge
            .sdk_versions(family)?
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::Script("no SDK versions installed".to_string()))?
    } else {
        spec.sdk_version.clone()
    };
    debug!("  SDK version - {}", sdk_version);

    let (toolchain, toolchain_version) = resolve_toolchain(bridge, spec)?;
    debug!("  Toolchain - {}. Version - {}", toolchain, toolchain_version);

    let rtos = resolve_rtos(bridge, &sdk_version, family, &spec.rtos)?;
    debug!("  RTOS: {}", rtos);
    debug!("  Board or Device - {}", spec.board_or_device);

    let secure_bundle = if spec.kind == ProjectKind::Nonsecure {
        let secure = spec
            .secure_project
            .as_deref()
            .ok_or_else(|| Error::spec(format!("'{}' has no secure_project", spec.name)))?;
        Some(
            bridge
                .project_location(secure)?
                .join("Debug")
                .join(format!("{}.sbd", secure)),
        )
    } else {
        None
    };

    Ok(ProjectRequest {
        name: spec.name.clone(),
        sdk_version,
        board_or_device: spec.board_or_device.clone(),
        is_device: spec.is_device(),
        toolchain,
        toolchain_version,
        kind: spec.kind,
        secure_bundle,
        rtos,
        template: spec.template.clone(),
    })
}

fn resolve_toolchain<B: ProjectBridge>(
    bridge: &mut B,
    spec: &ProjectSpec,
) -> Result<(String, String), Error> {
    let family = ToolchainFamily::classify(&spec.toolchain);
    if family == ToolchainFamily::Other {
        return Ok((spec.toolchain.clone(), spec.toolchain_version.clone()));
    }

    let installed = bridge.toolchains()?;
    let pick = |needles: &[&str]| {
        installed
            .iter()
            .find(|tc| {
                let lower = tc.to_lowercase();
                needles.iter().any(|needle| lower.contains(needle))
            })
            .cloned()
    };

    let chosen = match family {
        ToolchainFamily::Gcc => pick(&["gnu", "gcc"]),
        ToolchainFamily::Iar => pick(&["iar"]),
        ToolchainFamily::Ac6 => pick(&["arm compiler", "ac6"]),
        ToolchainFamily::Other => unreachable!(),
    }
    .ok_or_else(|| {
        BridgeError::Script(format!("no installed toolchain matches '{}'", spec.toolchain))
    })?;

    let version = if spec.toolchain_version == "default" {
        // IAR and AC6 carry the version in the toolchain name; their
        // version list is empty and the empty string is correct.
        bridge
            .toolchain_versions(&chosen)?
            .into_iter()
            .next()
            .unwrap_or_default()
    } else {
        spec.toolchain_version.clone()
    };

    Ok((chosen, version))
}

fn resolve_rtos<B: ProjectBridge>(
    bridge: &mut B,
    sdk_version: &str,
    family: &str,
    requested: &str,
) -> Result<String, Error> {
    let available = bridge.rtos_names(sdk_version, family)?;
    Ok(available
        .into_iter()
        .find(|rtos| rtos.contains(requested))
        .unwrap_or_default())
}

/// Executes one project's sequence against its configuration handle.
struct SequenceRunner<'a, B: ProjectBridge> {
    bridge: &'a mut B,
    cfg: B::Config,
    spec: &'a ProjectSpec,
    project_root: PathBuf,
    registry: ObjectRegistry,
    build_counter: usize,
    options: &'a RunOptions,
}

/// Result of searching a stack tree for the module filling a
/// `<requires>` interface.
enum StackSearch {
    Found(Handle),
    /// The interface was found but nothing is attached to it.
    Unfilled,
    Missing,
}

impl<'a, B: ProjectBridge> SequenceRunner<'a, B> {
    fn run(mut self, report: &mut BatchReport) {
        let spec = self.spec;
        for step in &spec.sequence {
            debug!("Executing sequence - {}", step.op());
            match self.execute(step, report) {
                Ok(()) => {}
                Err(StepFailure::Spec(message)) => {
                    report.record(
                        Some(&self.spec.name),
                        Some(step.op()),
                        format!("Malformed step, aborting remaining steps: {}", message),
                    );
                    break;
                }
                Err(StepFailure::Bridge(e)) => {
                    report.record(
                        Some(&self.spec.name),
                        Some(step.op()),
                        format!("Bridge failure, aborting remaining steps: {}", e),
                    );
                    break;
                }
            }
        }

        if let Err(e) = self.cfg.save() {
            report.record(
                Some(&self.spec.name),
                None,
                format!("Failed to save project configuration: {}", e),
            );
        }
    }

    fn record(&self, report: &mut BatchReport, op: &str, message: impl Into<String>) {
        report.record(Some(&self.spec.name), Some(op), message);
    }

    /// Resolve a registry lookup, recording a miss and yielding `None`.
    fn lookup<T>(
        &self,
        report: &mut BatchReport,
        op: &str,
        result: Result<T, LookupError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                report.record(Some(&self.spec.name), Some(op), e.to_string());
                None
            }
        }
    }

    /// Pass through bridge results, downgrading lookup-shaped failures to
    /// recorded errors.
    fn try_bridge<T>(
        &self,
        report: &mut BatchReport,
        op: &str,
        result: Result<T, BridgeError>,
    ) -> Result<Option<T>, StepFailure> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if is_lookup_failure(&e) => {
                report.record(Some(&self.spec.name), Some(op), e.to_string());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Compare a declared expectation against an attempt outcome.
    fn check_expectation(
        &self,
        report: &mut BatchReport,
        op: &str,
        verb: &str,
        descriptor: &str,
        expected: Expect,
        attempt: &Attempt,
    ) {
        if expected.as_bool() != attempt.accepted() {
            self.record(
                report,
                op,
                format!(
                    "Result of {} {} did not match expectation. Expected - {}. Actual - {}",
                    verb,
                    descriptor,
                    expected,
                    attempt.accepted()
                ),
            );
        } else if let Attempt::Rejected { reason } = attempt {
            debug!("{} rejected as expected: {}", descriptor, reason);
        }
    }

    /// Resolve the owner object of a property-bearing step
    /// (`module_or_thread`, with `bsp` meaning the BSP pseudo-module).
    fn property_owner(
        &mut self,
        report: &mut BatchReport,
        op: &str,
        module_or_thread: &str,
    ) -> Result<Option<Handle>, StepFailure> {
        if module_or_thread == "bsp" {
            return Ok(Some(self.cfg.bsp()?));
        }
        Ok(self
            .lookup(report, op, self.registry.any(module_or_thread))
            .map(|object| object.handle))
    }

    /// Resolve the property handle for a scope/owner/id triple. The RTOS
    /// scope addresses properties relative to the owning object's id.
    fn resolve_property(
        &mut self,
        owner: Handle,
        scope: PropertyScope,
        id: &str,
    ) -> Result<Handle, BridgeError> {
        match scope {
            PropertyScope::Common => self.cfg.common_property(owner, id),
            PropertyScope::Instance => self.cfg.property(owner, id),
            PropertyScope::Rtos => {
                let object_id = self.cfg.object_id(owner)?;
                let mut segments: Vec<&str> = object_id.split('.').collect();
                segments.pop();
                segments.push(id);
                let property_id = segments.join(".");
                debug!("objId: [{}], resolved propId: [{}]", object_id, property_id);
                self.cfg.property(owner, &property_id)
            }
        }
    }

    fn find_module_in(
        &mut self,
        module: Handle,
        requires_id: &str,
    ) -> Result<StackSearch, BridgeError> {
        for interface in self.cfg.interface_ids(module)? {
            debug!("Checking interface: {}", interface);
            if interface == requires_id {
                return Ok(match self.cfg.module_of(module, requires_id)? {
                    Some(found) => StackSearch::Found(found),
                    None => StackSearch::Unfilled,
                });
            }
            if let Some(child) = self.cfg.module_of(module, &interface)? {
                match self.find_module_in(child, requires_id)? {
                    StackSearch::Missing => continue,
                    outcome => return Ok(outcome),
                }
            }
        }
        Ok(StackSearch::Missing)
    }

    fn execute(&mut self, step: &Step, report: &mut BatchReport) -> Result<(), StepFailure> {
        let op = step.op();
        match step {
            Step::GetHal { name } => {
                debug!("Finding HAL and registering to: {}", name);
                match self.cfg.hal_thread()? {
                    Some(hal) => self.registry.register(name, ObjectKind::Thread, hal),
                    None => self.record(report, op, "HAL thread not found"),
                }
            }

            Step::CreateThread { name } => {
                debug!("Creating thread: {}", name);
                let thread = self.cfg.create_thread()?;
                self.registry.register(name, ObjectKind::Thread, thread);
            }

            Step::CreateRtosObject { name, kind, os } => {
                debug!("Creating RTOS object: {}", name);
                let Some(fragment) = rtos_object_id(kind) else {
                    self.record(report, op, format!("unknown RTOS object type '{}'", kind));
                    return Ok(());
                };
                let object = self
                    .cfg
                    .create_object(&format!("rtos.{}.object.{}", os, fragment))?;
                self.registry.register(name, ObjectKind::RtosObject, object);
            }

            Step::Add { name, id, thread } => {
                debug!("Adding module instance. {}", id);
                let Some(owner) = self.lookup(report, op, self.registry.thread(thread)) else {
                    return Ok(());
                };
                let stack = self.cfg.create_stack(owner, id)?;
                self.registry.register(name, ObjectKind::Module, stack);
            }

            Step::FillRequires {
                name,
                module,
                requires_id,
                module_id,
                use_existing,
                dependant_instance_name,
            } => {
                let Some(parent) = self.lookup(report, op, self.registry.module(module)) else {
                    return Ok(());
                };
                if *use_existing {
                    let dependant = dependant_instance_name.as_deref().ok_or_else(|| {
                        StepFailure::Spec("use: true needs dependant_instance_name".to_string())
                    })?;
                    debug!(
                        "Filling requires using an existing stack. {}-{}-{}",
                        module, requires_id, dependant
                    );
                    let Some(stack) = self.lookup(report, op, self.registry.module(dependant))
                    else {
                        return Ok(());
                    };
                    let attached = self.cfg.use_existing_module(parent, requires_id, stack);
                    self.try_bridge(report, op, attached)?;
                } else {
                    let module_id = module_id.as_deref().ok_or_else(|| {
                        StepFailure::Spec("module_id is required unless use: true".to_string())
                    })?;
                    debug!("Filling requires. {}-{}-{}", module, requires_id, module_id);
                    let creation = self.cfg.create_module_in(parent, requires_id, module_id);
                    let created = self.try_bridge(report, op, creation)?;
                    if let (Some(created), Some(name)) = (created, name.as_deref()) {
                        self.registry.register(name, ObjectKind::Module, created);
                    }
                }
            }

            Step::GetDependency {
                name,
                module,
                requires_id,
            } => {
                debug!("Getting dependency. {}-{}-{}", module, requires_id, name);
                let Some(parent) = self.lookup(report, op, self.registry.module(module)) else {
                    return Ok(());
                };
                let dependency = self.cfg.module_of(parent, requires_id);
                match self.try_bridge(report, op, dependency)? {
                    Some(Some(dependency)) => {
                        self.registry.register(name, ObjectKind::Module, dependency)
                    }
                    Some(None) => self.record(
                        report,
                        op,
                        format!("dependency '{}' of '{}' is not filled in", requires_id, module),
                    ),
                    None => {}
                }
            }

            Step::ChangePin {
                id,
                attr,
                value,
                success,
            } => {
                let attempt = self.cfg.set_pin_attr(id, attr, value)?;
                self.check_expectation(report, op, "changing", id, *success, &attempt);
            }

            Step::ChangeConnectivity {
                id,
                pin,
                port,
                success,
            } => {
                let attempt = self
                    .cfg
                    .set_pin_attr(id, pin, &format!("{}.{}", pin, port))?;
                self.check_expectation(report, op, "connecting", id, *success, &attempt);
            }

            Step::ChangeProperty {
                scope,
                module_or_thread,
                id,
                value,
                success,
                name,
            } => {
                let Some(owner) = self.property_owner(report, op, module_or_thread)? else {
                    return Ok(());
                };
                // BSP properties are always instance-scoped.
                let scope = if module_or_thread == "bsp" {
                    PropertyScope::Instance
                } else {
                    *scope
                };
                let property = self.resolve_property(owner, scope, id)?;
                debug!(
                    "Changing property. {}-{}-{} - Expecting success: {}",
                    module_or_thread, id, value, success
                );
                let attempt = self.cfg.set_property_value(property, &value.to_string())?;
                if attempt.accepted() {
                    if let Some(name) = name.as_deref() {
                        self.registry.register(name, ObjectKind::Property, property);
                    }
                }
                let descriptor = name.as_deref().unwrap_or(id);
                self.check_expectation(
                    report,
                    op,
                    "changing property for",
                    descriptor,
                    *success,
                    &attempt,
                );
            }

            Step::DeselectOption {
                scope,
                module_or_thread,
                id,
                value,
                success,
                name,
            } => {
                debug!("Deselecting option. {}-{}-{}", module_or_thread, id, value);
                let Some(owner) = self.property_owner(report, op, module_or_thread)? else {
                    return Ok(());
                };
                let scope = if module_or_thread == "bsp" {
                    PropertyScope::Instance
                } else {
                    *scope
                };
                let property = self.resolve_property(owner, scope, id)?;
                let attempt = self.cfg.exclude_option(property, &value.to_string())?;
                if attempt.accepted() {
                    if let Some(name) = name.as_deref() {
                        self.registry.register(name, ObjectKind::Property, property);
                    }
                }
                let descriptor = name.as_deref().unwrap_or(id);
                self.check_expectation(
                    report,
                    op,
                    "deselecting option for",
                    descriptor,
                    *success,
                    &attempt,
                );
            }

            Step::CheckConstraintsMessage { search_text, found } => {
                debug!(
                    "Checking for constraint message: {}. Expectation to find is: {}",
                    search_text, found
                );
                let problems = self.cfg.problems()?;
                debug!("Number of problems: {}", problems.len());
                let actual = problems
                    .iter()
                    .any(|problem| problem.contains(search_text.trim()));
                if actual != found.as_bool() {
                    self.record(
                        report,
                        op,
                        format!(
                            "Constraint message expectation did not match finding: {}. Expected: {}. Actual: {}",
                            search_text,
                            found.as_bool(),
                            actual
                        ),
                    );
                }
            }

            Step::CheckConstraintsNumber { number } => {
                debug!("Checking for constraint number: {}", number);
                let actual = self.cfg.problems()?.len();
                if actual != *number {
                    self.record(
                        report,
                        op,
                        format!(
                            "Number of constraints did not match. Expected {}. Found: {}",
                            number, actual
                        ),
                    );
                }
            }

            Step::ReplaceInFile {
                src,
                needle,
                replace,
            } => {
                debug!("Modifying file: {}", src);
                self.file_op(
                    report,
                    op,
                    fileops::replace_in_file(&self.project_root, src, needle, replace),
                )?;
            }

            Step::InsertInFile { src, line, text } => {
                debug!("Inserting text into file: {}. Line: {:?}", src, line);
                self.file_op(
                    report,
                    op,
                    fileops::insert_in_file(&self.project_root, src, *line, text),
                )?;
            }

            Step::AddInclude { path, absolute } => {
                self.apply_build_setting(&[SettingEdit::IncludePath(Action::Add)], path, *absolute, &[])?;
            }

            Step::RemoveInclude { path, absolute } => {
                self.apply_build_setting(&[SettingEdit::IncludePath(Action::Remove)], path, *absolute, &[])?;
            }

            Step::AddLibrary {
                libs,
                path,
                absolute,
            } => {
                self.apply_build_setting(
                    &[SettingEdit::LibraryPath(Action::Add), SettingEdit::LibraryFiles(Action::Add)],
                    path,
                    *absolute,
                    libs,
                )?;
            }

            Step::RemoveLibrary {
                libs,
                path,
                absolute,
            } => {
                self.apply_build_setting(
                    &[SettingEdit::LibraryFiles(Action::Remove), SettingEdit::LibraryPath(Action::Remove)],
                    path,
                    *absolute,
                    libs,
                )?;
            }

            Step::AddFile { src, dst } | Step::AddFolder { src, dst } => {
                debug!("Copying From: {} To: {}", src, dst);
                self.file_op(
                    report,
                    op,
                    fileops::copy_into_project(Path::new(src), &self.project_root, dst),
                )?;
            }

            Step::Build {
                completed,
                warnings_allowed,
            } => {
                self.build(report, *completed, warnings_allowed.as_deref().unwrap_or(&[]))?;
            }

            Step::Generate => {
                debug!("Generating project content");
                self.cfg.save()?;
                let marker = self.project_root.join(GENERATED_MARKER);
                let ticker = ProgressTicker::watch(
                    marker.clone(),
                    "... content generation in progress ...",
                    self.options.ticker_cadence,
                );
                let generated = self.cfg.generate_content();
                ticker.finish();
                generated?;
                let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
                if let Err(e) = std::fs::write(&marker, stamp) {
                    self.record(report, op, format!("Failed to write generation marker: {}", e));
                }
            }

            Step::DeleteDependency {
                module,
                requires_id,
            } => {
                debug!("Deleting dependency: Parent: {}. Dependency: {}", module, requires_id);
                let Some(parent) = self.lookup(report, op, self.registry.module(module)) else {
                    return Ok(());
                };
                let deletion = self.cfg.delete_module(parent, requires_id);
                self.try_bridge(report, op, deletion)?;
            }

            Step::FindModule {
                name,
                module,
                requires_id,
            } => {
                debug!(
                    "Finding module: Start of search: {}. Requires ID: {}. Name to register: {}",
                    module, requires_id, name
                );
                let Some(start) = self.lookup(report, op, self.registry.module(module)) else {
                    return Ok(());
                };
                match self.find_module_in(start, requires_id)? {
                    StackSearch::Found(found) => {
                        self.registry.register(name, ObjectKind::Module, found)
                    }
                    StackSearch::Unfilled => self.record(
                        report,
                        op,
                        "the <requires> was found but no module was being used",
                    ),
                    StackSearch::Missing => self.record(report, op, "Module was not found."),
                }
            }

            Step::SearchFile { src, regex_matches } => {
                debug!("Checking for regex matches in file: {}", src);
                let unmatched = match fileops::unmatched_patterns(
                    &self.project_root,
                    src,
                    regex_matches,
                ) {
                    Ok(unmatched) => unmatched,
                    Err(Error::Spec(message)) => return Err(StepFailure::Spec(message)),
                    Err(e) => {
                        self.record(report, op, e.to_string());
                        return Ok(());
                    }
                };
                for pattern in unmatched {
                    self.record(
                        report,
                        op,
                        format!("Regex not matched. File: {}. Regex: {}", src, pattern),
                    );
                }
            }

            Step::GetStack {
                name,
                thread,
                id,
                property_id,
                property_value,
            } => {
                debug!("Finding top of stack: Thread {}. ID {}", thread, id);
                let Some(owner) = self.lookup(report, op, self.registry.thread(thread)) else {
                    return Ok(());
                };
                let mut found = None;
                for stack in self.cfg.stacks(owner)? {
                    let stack_id = self.cfg.object_id(stack)?;
                    debug!(" Checking stack: {}", stack_id);
                    if !stack_id.contains(id.as_str()) {
                        continue;
                    }
                    match property_id.as_deref() {
                        None => {
                            found = Some(stack);
                            break;
                        }
                        Some(property_id) => {
                            let expected = property_value.as_deref().ok_or_else(|| {
                                StepFailure::Spec(
                                    "property_id needs property_value".to_string(),
                                )
                            })?;
                            let property = self.cfg.property(stack, property_id)?;
                            if self.cfg.property_value(property)? == expected {
                                debug!(" Matching property found. Module registered");
                                found = Some(stack);
                                break;
                            }
                            debug!(" Property did not match, continue searching");
                        }
                    }
                }
                match found {
                    Some(stack) => self.registry.register(name, ObjectKind::Module, stack),
                    None => self.record(report, op, "Top of stack module was not found."),
                }
            }

            Step::ChangeClock { id, value } => {
                debug!("Changing clock. ID: {}. Value: {}", id, value);
                let setting = self.cfg.set_clock_value(id, &value.to_string());
                let attempt = self.try_bridge(report, op, setting)?;
                if let Some(Attempt::Rejected { reason }) = attempt {
                    self.record(
                        report,
                        op,
                        format!("Failed to set clock node '{}' to '{}': {}", id, value, reason),
                    );
                }
            }

            Step::CheckIfModuleCanBeAdded {
                thread,
                id,
                success,
            } => {
                debug!("Checking if module {} can be added to thread {}", id, thread);
                let Some(owner) = self.lookup(report, op, self.registry.thread(thread)) else {
                    return Ok(());
                };
                let available = self.cfg.creatable_module_ids(owner)?.contains(id);
                if available != success.as_bool() {
                    self.record(
                        report,
                        op,
                        format!(
                            "{} availability of {} did not match expectation of {}",
                            id, available, success
                        ),
                    );
                } else {
                    debug!("{} availability matched expectation of {}", id, available);
                }
            }

            Step::DeleteStack { name, thread } => {
                debug!("Deleting stack {} from thread {}", name, thread);
                let Some(owner) = self.lookup(report, op, self.registry.thread(thread)) else {
                    return Ok(());
                };
                let Some(stack) = self.lookup(report, op, self.registry.module(name)) else {
                    return Ok(());
                };
                self.cfg.delete_stack(owner, stack)?;
                self.registry.remove(name);
            }

            Step::Log { message, fail } => {
                if *fail {
                    self.record(report, op, message.clone());
                } else {
                    info!("{}", message);
                }
            }
        }
        Ok(())
    }

    /// Record recoverable file operation failures; escalate spec errors.
    fn file_op(
        &self,
        report: &mut BatchReport,
        op: &str,
        result: Result<(), Error>,
    ) -> Result<(), StepFailure> {
        match result {
            Ok(()) => Ok(()),
            Err(Error::Spec(message)) => Err(StepFailure::Spec(message)),
            Err(e) => {
                self.record(report, op, e.to_string());
                Ok(())
            }
        }
    }

    fn apply_build_setting(
        &mut self,
        edits: &[SettingEdit],
        path: &str,
        absolute: bool,
        libs: &[String],
    ) -> Result<(), StepFailure> {
        let target = if absolute {
            format!("\"{}\"", path)
        } else {
            format!("\"${{workspace_loc:/${{ProjName}}{}}}\"", path)
        };

        // Build configurations the generated projects carry.
        for build_config in ["Debug", "Release"] {
            for edit in edits {
                match edit {
                    SettingEdit::IncludePath(action) => {
                        info!("{} include {} to [{} - {}]", action, target, self.spec.name, build_config);
                        match action {
                            Action::Add => self.bridge.add_include_path(
                                &self.spec.name,
                                build_config,
                                &target,
                            )?,
                            Action::Remove => self.bridge.remove_include_path(
                                &self.spec.name,
                                build_config,
                                &target,
                            )?,
                        }
                    }
                    SettingEdit::LibraryPath(action) => {
                        info!("{} library path {} to [{} - {}]", action, target, self.spec.name, build_config);
                        match action {
                            Action::Add => self.bridge.add_library_path(
                                &self.spec.name,
                                build_config,
                                &target,
                            )?,
                            Action::Remove => self.bridge.remove_library_path(
                                &self.spec.name,
                                build_config,
                                &target,
                            )?,
                        }
                    }
                    SettingEdit::LibraryFiles(action) => {
                        for lib in libs {
                            info!("{} library {} to [{} - {}]", action, lib, self.spec.name, build_config);
                            match action {
                                Action::Add => self.bridge.add_library_file(
                                    &self.spec.name,
                                    build_config,
                                    lib,
                                )?,
                                Action::Remove => self.bridge.remove_library_file(
                                    &self.spec.name,
                                    build_config,
                                    lib,
                                )?,
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn build(
        &mut self,
        report: &mut BatchReport,
        expected_completed: u8,
        allowed_patterns: &[String],
    ) -> Result<(), StepFailure> {
        let expected = format!("completed-{}", expected_completed);
        debug!("Building project with expected: {}", expected);

        self.cfg.save()?;

        let build_id = self.build_counter.to_string();
        let build_dir = self.project_root.join("Debug");
        if let Err(e) = std::fs::create_dir_all(&build_dir) {
            self.record(report, "build", format!("Failed to create build dir: {}", e));
        }
        let log_path = build_dir.join(format!("{}.{}.build.stdout.log", self.spec.name, build_id));

        let ticker = ProgressTicker::watch(
            log_path.clone(),
            "... build in progress ...",
            self.options.ticker_cadence,
        );
        let output =
            self.bridge
                .build_project(&self.spec.name, BuildMode::Incremental, &log_path);
        ticker.finish();
        let output = output?;

        for line in output.lines().filter(|line| !line.is_empty()) {
            info!("{}", line);
        }
        debug!("Build finished - {}", build_id);
        info!("Logs available for later checking at: {}", log_path.display());

        match buildlog::evaluate(&output, &self.spec.warnings_path_marker, allowed_patterns) {
            Ok(evaluation) => {
                debug!("Errors: {}", evaluation.errors);
                for warning in &evaluation.allowed {
                    debug!(" Warning allowed: {}", warning);
                }
                for warning in &evaluation.disallowed {
                    self.record(report, "build", format!("Uncaught warning: {}", warning));
                }
                if evaluation.completed != expected_completed || !evaluation.disallowed.is_empty() {
                    let actual = format!(
                        "completed-{}. warnings-{}",
                        evaluation.completed,
                        evaluation.disallowed.len()
                    );
                    self.record(
                        report,
                        "build",
                        format!(
                            "Build results for {} did not match. Expected: {}. Actual: {}",
                            build_id, expected, actual
                        ),
                    );
                }
            }
            Err(e @ BuildLogError::MissingSummary) => {
                self.record(
                    report,
                    "build",
                    format!("Error in trying to parse build output. {}", e),
                );
            }
            Err(BuildLogError::BadPattern { pattern, source }) => {
                return Err(StepFailure::Spec(format!(
                    "bad warnings_allowed pattern '{}': {}",
                    pattern, source
                )));
            }
        }

        self.build_counter += 1;
        Ok(())
    }
}

/// Managed build setting edit kinds, in the order the step applies them.
#[derive(Debug, Clone, Copy)]
enum SettingEdit {
    IncludePath(Action),
    LibraryPath(Action),
    LibraryFiles(Action),
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Add,
    Remove,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Add => write!(f, "add"),
            Action::Remove => write!(f, "remove"),
        }
    }
}
