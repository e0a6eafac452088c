//! MCU availability fixture generation
//!
//! Cross-references the MDF module ids against generated per-MCU
//! capability data and emits, per MCU, a batch fixture checking that
//! every module backed by on-chip IP can be added and every other module
//! cannot. The fixtures are ordinary batch files; running them through
//! the interpreter performs the actual check against the configurator.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;

use crate::batch::{Batch, ProjectSpec};
use crate::mdf;
use crate::step::Step;
use crate::types::{Expect, ProjectKind};

/// IP missing from the generated capability data but present on every
/// MCU; seeds each MCU's available-module list.
const GEN_DATA_MISSING_IP: &[&str] = &["module.driver.lpm", "module.driver.lvd"];

/// Capability data sometimes names IP differently than the MDFs do.
/// Entries map the capability name to the MDF name.
const GEN_DATA_REPLACEMENTS: &[(&str, &str)] = &[
    ("ETHERC", "ETHER"),
    ("ETHERC_EDMAC", "EDMAC"),
    ("ETHERC_EPTPC", "PTP"),
    ("ETHERC_MII", "ETHER_PHY"),
    ("ETHERC_RMII", "ETHER_PHY"),
    ("SCE5", "SCE_RA4"),
    ("SCE7", "SCE_RA6"),
    ("SCE9", "SCE9_RA6"),
    ("GPT_POEG", "POEG"),
    ("AES", "SCE_RA2"),
    ("SSIE", "SSI"),
    ("PORT", "IOPORT"),
    ("ELC_B", "ELC"),
];

/// Module ids whose availability cannot be decided from capability data
/// (only a subset of MCUs with the IP support them).
const IGNORE_IDS: &[&str] = &[
    "module.driver.adc_on_adc_with_dmac",
    // RA4E1 and RA6E1 both carry SCE9 but support is not guaranteed.
    "module.driver.sce_protected",
];

/// MCUs where the part number decides peripheral availability and a
/// random pick from the part number list would be wrong.
const STATIC_PART_NUMBERS: &[(&str, &str)] = &[
    // The 'B' (R7FA6M5-B-H2CBG) marks parts with CANFD.
    ("RA6M5", "R7FA6M5BH2CBG"),
];

/// Generated per-MCU capability data.
#[derive(Debug, Deserialize)]
pub struct McuCapability {
    pub peripheral_channel_dict: BTreeMap<String, serde_yaml::Value>,
    pub part_numbers: Vec<PartNumber>,
}

#[derive(Debug, Deserialize)]
pub struct PartNumber {
    pub name: String,
}

/// What a generation run produced.
#[derive(Debug, Default)]
pub struct AvailabilitySummary {
    pub written: Vec<PathBuf>,
    /// Visible module ids no MCU's fixture exercises; only meaningful when
    /// all MCUs were generated.
    pub not_checked: Vec<String>,
}

fn replaced_ip_name(ip_name: &str) -> &str {
    GEN_DATA_REPLACEMENTS
        .iter()
        .find(|(from, _)| *from == ip_name)
        .map(|(_, to)| *to)
        .unwrap_or(ip_name)
}

fn load_capability(path: &Path) -> Result<McuCapability> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read capability file {:?}", path))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse capability file {:?}", path))
}

/// Module ids available on an MCU according to its capability data.
fn matched_ids(capability: &McuCapability, index: &mdf::MdfIndex) -> Vec<String> {
    let mut ids = Vec::new();
    for ip_name in capability.peripheral_channel_dict.keys() {
        let ip_name = replaced_ip_name(ip_name);
        if let Some(module_ids) = index.visible_by_ip.get(&ip_name.to_lowercase()) {
            ids.extend(module_ids.iter().cloned());
        }
    }
    ids
}

/// Generate availability fixtures. `mcu` limits generation to one MCU;
/// otherwise every capability file in `input_dir` is processed.
pub fn generate(
    input_dir: &Path,
    mdf_dir: &Path,
    mcu: Option<&str>,
    out_dir: &Path,
) -> Result<AvailabilitySummary> {
    let index = mdf::read_mdf_dir(mdf_dir, IGNORE_IDS)?;

    let capability_files: Vec<PathBuf> = match mcu {
        Some(mcu) => vec![input_dir.join(format!("{}.yml", mcu.to_uppercase()))],
        None => {
            let mut files: Vec<PathBuf> = fs::read_dir(input_dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml"))
                })
                .collect();
            files.sort();
            files
        }
    };

    // First pass: every module id backed by IP on at least one MCU, plus
    // the hidden ids. Anything else is never exercised.
    let mut all_used: BTreeSet<String> = GEN_DATA_MISSING_IP
        .iter()
        .map(|id| id.to_string())
        .collect();
    all_used.extend(index.hidden_ids.iter().cloned());
    for path in &capability_files {
        let capability = load_capability(path)?;
        all_used.extend(matched_ids(&capability, &index));
    }

    let mut summary = AvailabilitySummary::default();

    for path in &capability_files {
        let stem = path
            .file_stem()
            .with_context(|| format!("bad capability file name {:?}", path))?
            .to_string_lossy()
            .into_owned();
        let mcu_name = stem.to_lowercase();
        let capability = load_capability(path)?;

        let part_number = STATIC_PART_NUMBERS
            .iter()
            .find(|(name, _)| *name == stem.to_uppercase())
            .map(|(_, pn)| pn.to_string())
            .or_else(|| capability.part_numbers.first().map(|pn| pn.name.clone()))
            .with_context(|| format!("{} lists no part numbers", stem))?;

        let mut good: BTreeSet<String> = GEN_DATA_MISSING_IP
            .iter()
            .map(|id| id.to_string())
            .collect();
        good.extend(matched_ids(&capability, &index));

        let mut bad: BTreeSet<String> = all_used.difference(&good).cloned().collect();

        // CANFD (Lite) MCUs expose the lite module instead.
        if mdf::is_canfdlite_mcu(mdf_dir, &mcu_name)? {
            good = good
                .into_iter()
                .map(|id| id.replace("canfd_on_canfd", "canfd_on_canfdlite"))
                .collect();
            bad.insert("module.driver.canfd_on_canfd".to_string());
        }

        debug!(
            "{}: {} available, {} unavailable module ids",
            mcu_name,
            good.len(),
            bad.len()
        );

        let mcu_dir = out_dir.join(&mcu_name);
        fs::create_dir_all(&mcu_dir)?;

        let generated_path = mcu_dir.join("gen_ip_availability.json");
        fixture(&mcu_name, &part_number, &good, &bad).save_to_file(&generated_path)?;
        info!("Writing - {}", generated_path.display());
        summary.written.push(generated_path);

        // Manual checks are a template for humans; never overwrite one.
        let manual_path = mcu_dir.join("manual_ip_availability.json");
        if !manual_path.exists() {
            fixture(
                &format!("{}_manual", mcu_name),
                &part_number,
                &BTreeSet::new(),
                &BTreeSet::new(),
            )
            .save_to_file(&manual_path)?;
            info!("Writing - {}", manual_path.display());
            summary.written.push(manual_path);
        }
    }

    if mcu.is_none() {
        let all_visible: BTreeSet<String> = index.all_visible_ids().into_iter().collect();
        summary.not_checked = all_visible.difference(&all_used).cloned().collect();
    }

    Ok(summary)
}

/// Build the fixture batch for one MCU: get the HAL thread, then check
/// every available id as addable and every unavailable id as not.
fn fixture(
    mcu_name: &str,
    part_number: &str,
    good: &BTreeSet<String>,
    bad: &BTreeSet<String>,
) -> Batch {
    let mut sequence = vec![Step::GetHal {
        name: "hal".to_string(),
    }];
    for id in good {
        sequence.push(Step::CheckIfModuleCanBeAdded {
            thread: "hal".to_string(),
            id: id.clone(),
            success: Expect::Yes,
        });
    }
    for id in bad {
        sequence.push(Step::CheckIfModuleCanBeAdded {
            thread: "hal".to_string(),
            id: id.clone(),
            success: Expect::No,
        });
    }

    Batch {
        projects: vec![ProjectSpec {
            name: format!("{}_ip_availability", mcu_name),
            sdk_version: "default".to_string(),
            board_or_device: part_number.to_string(),
            toolchain: "gcc".to_string(),
            toolchain_version: "default".to_string(),
            rtos: "No RTOS".to_string(),
            template: "Bare Metal - Minimal".to_string(),
            kind: ProjectKind::Flat,
            secure_project: None,
            warnings_path_marker: "/fsp/".to_string(),
            sequence,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_mdf(dir: &Path, module: &str, ids: &[(&str, bool)]) {
        let body: String = ids
            .iter()
            .map(|(id, visible)| {
                if *visible {
                    format!("<module id=\"{}\"/>", id)
                } else {
                    format!("<module id=\"{}\" visible=\"false\"/>", id)
                }
            })
            .collect();
        fs::write(
            dir.join(format!("Renesas##HAL Drivers##all##{}####x.xx.xx.xml", module)),
            format!("<raModuleDescription>{}</raModuleDescription>", body),
        )
        .unwrap();
    }

    fn write_capability(dir: &Path, mcu: &str, ips: &[&str], part: &str) {
        let ip_entries: String = ips
            .iter()
            .map(|ip| format!("  {}: {{channels: 1}}\n", ip))
            .collect();
        fs::write(
            dir.join(format!("{}.yml", mcu)),
            format!(
                "peripheral_channel_dict:\n{}part_numbers:\n  - name: {}\n",
                ip_entries, part
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_generate_splits_good_and_bad_ids() {
        let mdf_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        write_mdf(mdf_dir.path(), "r_gpt", &[("module.driver.timer_on_gpt", true)]);
        write_mdf(mdf_dir.path(), "r_canfd", &[("module.driver.canfd_on_canfd", true)]);
        write_capability(data_dir.path(), "RA6M3", &["GPT", "CANFD"], "R7FA6M3AH3CFC");
        write_capability(data_dir.path(), "RA2L1", &["GPT"], "R7FA2L1AB2DFP");

        let summary =
            generate(data_dir.path(), mdf_dir.path(), None, out_dir.path()).unwrap();
        assert_eq!(summary.written.len(), 4); // gen + manual per MCU

        let fixture =
            Batch::load_from_file(out_dir.path().join("ra2l1/gen_ip_availability.json")).unwrap();
        let project = &fixture.projects[0];
        assert_eq!(project.board_or_device, "R7FA2L1AB2DFP");

        let mut expect_yes = Vec::new();
        let mut expect_no = Vec::new();
        for step in &project.sequence {
            if let Step::CheckIfModuleCanBeAdded { id, success, .. } = step {
                match success {
                    Expect::Yes => expect_yes.push(id.clone()),
                    Expect::No => expect_no.push(id.clone()),
                }
            }
        }
        // GPT plus the always-present IP are available; CANFD is not.
        assert!(expect_yes.contains(&"module.driver.timer_on_gpt".to_string()));
        assert!(expect_yes.contains(&"module.driver.lpm".to_string()));
        assert_eq!(expect_no, vec!["module.driver.canfd_on_canfd".to_string()]);
    }

    #[test]
    fn test_static_part_number_wins() {
        let mdf_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        write_mdf(mdf_dir.path(), "r_gpt", &[("module.driver.timer_on_gpt", true)]);
        write_capability(data_dir.path(), "RA6M5", &["GPT"], "R7FA6M5AH3CFC");

        generate(data_dir.path(), mdf_dir.path(), Some("ra6m5"), out_dir.path()).unwrap();
        let fixture =
            Batch::load_from_file(out_dir.path().join("ra6m5/gen_ip_availability.json")).unwrap();
        assert_eq!(fixture.projects[0].board_or_device, "R7FA6M5BH2CBG");
    }

    #[test]
    fn test_manual_fixture_is_not_overwritten() {
        let mdf_dir = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        write_mdf(mdf_dir.path(), "r_gpt", &[("module.driver.timer_on_gpt", true)]);
        write_capability(data_dir.path(), "RA6M3", &["GPT"], "R7FA6M3AH3CFC");

        let manual = out_dir.path().join("ra6m3/manual_ip_availability.json");
        fs::create_dir_all(manual.parent().unwrap()).unwrap();
        fs::write(&manual, "[]").unwrap();

        generate(data_dir.path(), mdf_dir.path(), Some("ra6m3"), out_dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&manual).unwrap(), "[]");
    }

    #[test]
    fn test_ip_name_replacement() {
        assert_eq!(replaced_ip_name("ETHERC"), "ETHER");
        assert_eq!(replaced_ip_name("GPT"), "GPT");
    }
}
