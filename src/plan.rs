//! Test plan expansion
//!
//! A plan file declares templates to exercise and the toolchain / RTOS /
//! board axes to permute them over. Expansion produces the runner's
//! native batch format directly: one project spec per permutation, each
//! with the default sequence (create a thread when an RTOS is involved,
//! then build expecting success).
//!
//! IAR does not support every MCU; rows for unsupported boards are
//! dropped when a scanned device-support list is available.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::batch::{Batch, ProjectSpec};
use crate::error::{Error, Result};
use crate::step::Step;
use crate::types::{safe_project_name, ProjectKind, ToolchainFamily};

/// Toolchains exercised when a template does not list its own.
const DEFAULT_TOOLCHAINS: &[&str] = &["gcc", "iar", "ac6"];

/// A declarative test plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default = "default_literal")]
    pub sdk_version: String,

    /// Boards used by templates that do not list their own.
    #[serde(default)]
    pub default_boards: Vec<String>,

    /// Boards only available internally; appended to the defaults unless
    /// the plan is expanded for a tagged release.
    #[serde(default)]
    pub internal_boards: Vec<String>,

    pub templates: Vec<PlanTemplate>,
}

fn default_literal() -> String {
    "default".to_string()
}

/// One template entry of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTemplate {
    #[serde(default)]
    pub toolchains: Vec<String>,

    pub rtoses: Vec<PlanRtos>,

    /// Boards to permute over; falls back to the plan's default boards.
    #[serde(default)]
    pub boards: Option<Vec<String>>,
}

/// An RTOS row: the RTOS short name and the project template that goes
/// with it (a FreeRTOS template cannot be used with "No RTOS" and vice
/// versa).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRtos {
    pub name: String,
    pub template: String,
}

impl Plan {
    /// Load a plan from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// MCUs supported by an installed IAR toolchain, derived from its device
/// support files.
#[derive(Debug, Clone, Default)]
pub struct IarSupport {
    mcus: Vec<String>,
}

impl IarSupport {
    /// Scan an IAR installation for Renesas device support files
    /// (`config/devices/Renesas/**/R7FA*`) and collect the MCU groups they
    /// cover (`R7FA6M3...` supports the RA6M3 group).
    pub fn scan(install_dir: &Path) -> Result<Self> {
        let root = install_dir.join("config/devices/Renesas");
        let mut mcus = Vec::new();
        collect_devices(&root, &mut mcus)?;
        mcus.sort();
        mcus.dedup();
        debug!("IAR device support: {:?}", mcus);
        Ok(Self { mcus })
    }

    /// Build a support list from explicit MCU group names (`RA6M3`, ...).
    pub fn from_mcus(mcus: &[&str]) -> Self {
        Self {
            mcus: mcus.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Whether a board name or device part number belongs to a supported
    /// MCU group. Board names embed the group (`EK-RA6M3`), part numbers
    /// embed its long form (`R7FA6M3AH3CFC`).
    pub fn supports(&self, board_or_device: &str) -> bool {
        let target = board_or_device.to_lowercase();
        self.mcus.iter().any(|mcu| {
            let group = mcu.to_lowercase();
            target.contains(&group) || target.contains(&group.replace("ra", "r7fa"))
        })
    }
}

fn collect_devices(dir: &Path, mcus: &mut Vec<String>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name.starts_with("R7FA") && file_name.len() >= 7 {
            // R7FA6M3... -> RA6M3
            mcus.push(format!("R{}", &file_name[3..7]));
        }
        if entry.file_type()?.is_dir() {
            collect_devices(&entry.path(), mcus)?;
        }
    }
    Ok(())
}

/// Expand a plan into a batch. `tagged` excludes internal boards;
/// `iar` filters IAR rows to supported MCUs (without it, IAR rows are
/// kept and a warning is logged).
pub fn expand(plan: &Plan, tagged: bool, iar: Option<&IarSupport>) -> Result<Batch> {
    let mut projects = Vec::new();
    let mut warned_about_iar = false;

    for (index, template) in plan.templates.iter().enumerate() {
        if template.rtoses.is_empty() {
            return Err(Error::plan(format!("template {} has no rtoses", index)));
        }

        let toolchains: Vec<String> = if template.toolchains.is_empty() {
            DEFAULT_TOOLCHAINS.iter().map(|tc| tc.to_string()).collect()
        } else {
            template.toolchains.clone()
        };

        let boards: Vec<String> = match &template.boards {
            Some(boards) => boards.clone(),
            None => {
                let mut boards = plan.default_boards.clone();
                if !tagged {
                    boards.extend(plan.internal_boards.iter().cloned());
                }
                if boards.is_empty() {
                    return Err(Error::plan(format!(
                        "template {} has no boards and the plan has no default_boards",
                        index
                    )));
                }
                boards
            }
        };

        for toolchain in &toolchains {
            let family = ToolchainFamily::classify(toolchain);
            for rtos in &template.rtoses {
                for board in &boards {
                    if family == ToolchainFamily::Iar {
                        match iar {
                            Some(support) if !support.supports(board) => continue,
                            Some(_) => {}
                            None => {
                                if !warned_about_iar {
                                    warn!(
                                        "no IAR device list provided; IAR rows are not filtered"
                                    );
                                    warned_about_iar = true;
                                }
                            }
                        }
                    }
                    projects.push(project_for(plan, toolchain, family, rtos, board));
                }
            }
        }
    }

    Ok(Batch { projects })
}

fn project_for(
    plan: &Plan,
    toolchain: &str,
    family: ToolchainFamily,
    rtos: &PlanRtos,
    board: &str,
) -> ProjectSpec {
    let short_tc = match family {
        ToolchainFamily::Gcc => "gcc",
        ToolchainFamily::Iar => "iar",
        ToolchainFamily::Ac6 => "ac6",
        ToolchainFamily::Other => toolchain,
    };
    let name = safe_project_name(&format!(
        "{}_{}_{}_{}_{}",
        plan.sdk_version, short_tc, rtos.name, rtos.template, board
    ));

    // A thread must exist for RTOS projects or content generation stays
    // incomplete; bare-metal templates build as generated.
    let mut sequence = Vec::new();
    if !rtos.name.to_lowercase().contains("no rtos") {
        sequence.push(Step::CreateThread {
            name: "t0".to_string(),
        });
    }
    sequence.push(Step::Build {
        completed: 1,
        warnings_allowed: None,
    });

    ProjectSpec {
        name,
        sdk_version: plan.sdk_version.clone(),
        board_or_device: board.to_string(),
        toolchain: toolchain.to_string(),
        toolchain_version: "default".to_string(),
        rtos: rtos.name.clone(),
        template: rtos.template.clone(),
        kind: ProjectKind::Flat,
        secure_project: None,
        warnings_path_marker: "/fsp/".to_string(),
        sequence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        Plan {
            sdk_version: "4.0.0".to_string(),
            default_boards: vec!["EK-RA6M3".to_string(), "EK-RA2E1".to_string()],
            internal_boards: vec!["EK-RA0X1".to_string()],
            templates: vec![PlanTemplate {
                toolchains: vec!["gcc".to_string(), "iar".to_string()],
                rtoses: vec![
                    PlanRtos {
                        name: "No RTOS".to_string(),
                        template: "Bare Metal - Minimal".to_string(),
                    },
                    PlanRtos {
                        name: "FreeRTOS".to_string(),
                        template: "FreeRTOS - Minimal - Static Allocation".to_string(),
                    },
                ],
                boards: None,
            }],
        }
    }

    #[test]
    fn test_expansion_covers_all_axes() {
        let iar = IarSupport::from_mcus(&["RA6M3", "RA2E1", "RA0X1"]);
        let batch = expand(&plan(), false, Some(&iar)).unwrap();
        // 2 toolchains x 2 rtoses x 3 boards (internal included)
        assert_eq!(batch.projects.len(), 12);
        batch.validate().unwrap();
    }

    #[test]
    fn test_tagged_excludes_internal_boards() {
        let iar = IarSupport::from_mcus(&["RA6M3", "RA2E1"]);
        let batch = expand(&plan(), true, Some(&iar)).unwrap();
        assert_eq!(batch.projects.len(), 8);
        assert!(batch
            .projects
            .iter()
            .all(|p| !p.board_or_device.contains("RA0X1")));
    }

    #[test]
    fn test_iar_rows_filtered_by_device_support() {
        let iar = IarSupport::from_mcus(&["RA6M3"]);
        let batch = expand(&plan(), true, Some(&iar)).unwrap();
        // gcc: 2 rtoses x 2 boards; iar: 2 rtoses x 1 supported board
        assert_eq!(batch.projects.len(), 6);
        for project in &batch.projects {
            if project.toolchain == "iar" {
                assert!(project.board_or_device.contains("RA6M3"));
            }
        }
    }

    #[test]
    fn test_iar_support_matches_part_numbers() {
        let iar = IarSupport::from_mcus(&["RA6M3"]);
        assert!(iar.supports("EK-RA6M3"));
        assert!(iar.supports("R7FA6M3AH3CFC"));
        assert!(!iar.supports("EK-RA4W1"));
    }

    #[test]
    fn test_default_sequences() {
        let batch = expand(&plan(), true, None).unwrap();
        for project in &batch.projects {
            let ops: Vec<&str> = project.sequence.iter().map(|s| s.op()).collect();
            if project.rtos == "No RTOS" {
                assert_eq!(ops, vec!["build"]);
            } else {
                assert_eq!(ops, vec!["create_thread", "build"]);
            }
        }
    }

    #[test]
    fn test_scan_collects_device_groups() {
        let dir = tempfile::tempdir().unwrap();
        let devices = dir.path().join("config/devices/Renesas/RA6");
        std::fs::create_dir_all(&devices).unwrap();
        std::fs::write(devices.join("R7FA6M3AH.i79"), "").unwrap();
        std::fs::write(devices.join("R7FA6M3AF.i79"), "").unwrap();
        std::fs::write(devices.join("NOTADEVICE"), "").unwrap();

        let iar = IarSupport::scan(dir.path()).unwrap();
        assert!(iar.supports("EK-RA6M3"));
        assert!(!iar.supports("EK-RA2L1"));
    }
}
