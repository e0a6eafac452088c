//! Module description file (MDF) parsing
//!
//! MDFs are the XML files describing a driver's configurable identity:
//! which `<module id="...">` entries it offers and whether they are
//! user-visible. File names encode the owning IP
//! (`Renesas##HAL Drivers##all##r_sci_uart####x.xx.xx.xml`); the IP name
//! is what capability data is matched against.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Suffixes stripped from MDF names to recover the bare IP name. Without
/// this, "sci" would false-positive against "sci_b_spi".
const STRINGS_TO_REMOVE: &[&str] = &[
    // eg: r_sci_uart, r_sci_b_uart
    "_spi",
    "_uart",
    "_i2c",
    // eg: r_iic_master, r_iic_b_master
    "_master",
    "_slave",
    // For SCE
    "_plaintext",
    "_protected",
];

/// Parsed module ids of one MDF directory.
#[derive(Debug, Default)]
pub struct MdfIndex {
    /// IP name -> user-visible module ids.
    pub visible_by_ip: HashMap<String, Vec<String>>,
    /// Module ids carrying `visible="false"`; they can never be added
    /// directly, whatever the MCU.
    pub hidden_ids: Vec<String>,
}

impl MdfIndex {
    /// Every user-visible module id across all IPs.
    pub fn all_visible_ids(&self) -> Vec<String> {
        self.visible_by_ip.values().flatten().cloned().collect()
    }
}

/// Recover the IP name from an MDF file name, or `None` when the file is
/// not a driver MDF.
pub fn ip_name_from_filename(filename: &str) -> Option<String> {
    if !filename.to_lowercase().starts_with("renesas") {
        return None;
    }
    let module_name = filename.split("##").nth(3)?;
    if !module_name.starts_with("r_") && !module_name.starts_with("rm_") {
        return None;
    }
    // Remove the r_/rm_ prefix, then the functionality suffixes.
    let mut ip_name = module_name.split_once('_')?.1.to_string();
    for suffix in STRINGS_TO_REMOVE {
        ip_name = ip_name.replace(suffix, "");
    }
    Some(ip_name)
}

/// Parse every driver MDF of a directory. `ignore_ids` lists module ids
/// whose availability cannot be decided from capability data alone.
pub fn read_mdf_dir(mdf_dir: &Path, ignore_ids: &[&str]) -> Result<MdfIndex> {
    let mut index = MdfIndex::default();

    for entry in fs::read_dir(mdf_dir)? {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(ip_name) = ip_name_from_filename(&filename) else {
            continue;
        };
        debug!("Reading MDF {} (IP: {})", filename, ip_name);

        let content = fs::read_to_string(entry.path())?;
        let document = roxmltree::Document::parse(&content)
            .map_err(|e| Error::mdf(format!("{}: {}", filename, e)))?;

        for module in document
            .root_element()
            .children()
            .filter(|node| node.has_tag_name("module"))
        {
            let Some(id) = module.attribute("id") else {
                continue;
            };
            if ignore_ids.contains(&id) {
                continue;
            }
            if module.attribute("visible") == Some("false") {
                index.hidden_ids.push(id.to_string());
                continue;
            }
            index
                .visible_by_ip
                .entry(ip_name.clone())
                .or_default()
                .push(id.to_string());
        }
    }

    Ok(index)
}

/// Whether an MCU uses the CANFD (Lite) variant: its BSP MDF advertises
/// `interface.mcu.canfdlite.driver`.
pub fn is_canfdlite_mcu(mdf_dir: &Path, mcu_name: &str) -> Result<bool> {
    let bsp_mdf = mdf_dir.join(format!("Renesas##BSP##{}##fsp####x.xx.xx.xml", mcu_name));
    if !bsp_mdf.exists() {
        return Ok(false);
    }
    Ok(fs::read_to_string(bsp_mdf)?.contains("interface.mcu.canfdlite.driver"))
}
