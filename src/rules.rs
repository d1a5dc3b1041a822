//! Rule repository: the read-only AS4-to-AS6 deprecation catalog.
//!
//! The catalog is injected into the engine as a `RuleSet` value rather than
//! reached through a global, so tests can run against synthetic rule sets.
//! Lookups are case-insensitive exact-name matches except the hardware
//! substring check. The rule set also owns the AS6 target-format reference
//! data and the full project-manifest rewrite.

use crate::models::{FunctionMapping, Replacement, Severity};
use regex::Regex;

pub const AS6_XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
pub const AS6_PROCESSING_INSTRUCTION: &str =
    r#"<?AutomationStudio Version="6.5.0.305" WorkingVersion="6.1"?>"#;
pub const AS6_PROJECT_NAMESPACE: &str = "http://br-automation.co.at/AS/Project";

pub const AS4_GCC_VERSION: &str = "4.1.2";
pub const AS6_GCC_VERSION: &str = "11.3.0";
pub const AS6_AR_VERSION: &str = "6.2.1";

/// Minimum Automation Runtime level for a reliable AS6 migration.
pub const AR_MINIMUM_NUMERIC: f64 = 4.25;
pub const AR_MINIMUM_DISPLAY: &str = "B4.25";

/// Textual sentinels marking deprecated values in motion configuration.
pub const DEPRECATED_MOTION_SENTINELS: [&str; 2] = ["ncOLD_", "ncDEPRECATED"];

/// A deprecated library rule.
#[derive(Debug, Clone)]
pub struct LibraryRule {
    pub id: &'static str,
    pub name: String,
    pub severity: Severity,
    pub category: &'static str,
    pub description: String,
    pub replacement: Option<Replacement>,
    pub notes: String,
    pub function_mappings: Option<Vec<FunctionMapping>>,
}

/// A deprecated function or function-block rule with its trigger pattern.
#[derive(Debug, Clone)]
pub struct FunctionRule {
    pub id: &'static str,
    pub name: String,
    pub severity: Severity,
    pub description: String,
    pub replacement: Option<Replacement>,
    pub notes: String,
    pub pattern: Regex,
}

/// A deprecated hardware-module rule with its end-of-life date.
#[derive(Debug, Clone)]
pub struct HardwareRule {
    pub id: &'static str,
    pub name: String,
    pub module_class: &'static str,
    pub severity: Severity,
    pub description: String,
    pub replacement: Option<Replacement>,
    pub notes: String,
    pub eol: Option<String>,
}

/// A technology-package rule keyed by package name.
#[derive(Debug, Clone)]
pub struct TechPackageRule {
    pub name: String,
    pub as4_version: Option<String>,
    pub as6_version: Option<String>,
    pub replaced_by: Option<String>,
    pub new_in_as6: bool,
    pub required: bool,
    /// Static sub-version attributes rendered on the package tag.
    pub sub_versions: Vec<(String, String)>,
}

/// Source-format version extracted from a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatVersion {
    pub major: u32,
    pub full: String,
}

/// Parsed Automation Runtime version (letter prefix plus 4.xx numbering).
#[derive(Debug, Clone, PartialEq)]
pub struct ArVersion {
    pub prefix: Option<char>,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub numeric: f64,
    pub full: String,
}

/// Result of checking an AR version against the AS6 migration minimum.
#[derive(Debug, Clone)]
pub struct ArValidation {
    pub valid: bool,
    pub message: String,
}

/// A technology package resolved to its AS6 target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub sub_versions: Vec<(String, String)>,
    pub note: String,
}

/// The injected, read-only deprecation catalog.
pub struct RuleSet {
    pub libraries: Vec<LibraryRule>,
    pub functions: Vec<FunctionRule>,
    pub hardware: Vec<HardwareRule>,
    pub tech_packages: Vec<TechPackageRule>,
    version_attr: Regex,
    edition_attr: Regex,
    pointers_elem: Regex,
    naming_elem: Regex,
    tech_section: Regex,
    package_tag: Regex,
    ar_version: Regex,
}

impl RuleSet {
    /// Empty rule set for synthetic test catalogs.
    pub fn empty() -> RuleSet {
        RuleSet {
            libraries: Vec::new(),
            functions: Vec::new(),
            hardware: Vec::new(),
            tech_packages: Vec::new(),
            version_attr: Regex::new(r#"Version="([^"]+)""#).unwrap(),
            edition_attr: Regex::new(r#"Edition="([^"]+)""#).unwrap(),
            pointers_elem: Regex::new(r"(?i)<Pointers>([^<]+)</Pointers>").unwrap(),
            naming_elem: Regex::new(r"(?i)<NamingConventions>([^<]+)</NamingConventions>")
                .unwrap(),
            tech_section: Regex::new(r"(?s)<TechnologyPackages>(.*?)</TechnologyPackages>")
                .unwrap(),
            package_tag: Regex::new(r#"<(\w+)\s+Version="([^"]+)"\s*/>"#).unwrap(),
            ar_version: Regex::new(r"^([A-Z])?(\d+)\.(\d+)(?:\.(\d+))?$").unwrap(),
        }
    }

    /// Builtin AS4-to-AS6 catalog.
    pub fn builtin() -> RuleSet {
        let mut rs = RuleSet::empty();
        rs.libraries = builtin_libraries();
        rs.functions = builtin_functions();
        rs.hardware = builtin_hardware();
        rs.tech_packages = builtin_tech_packages();
        rs
    }

    pub fn find_library(&self, name: &str) -> Option<&LibraryRule> {
        self.libraries
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionRule> {
        self.functions
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn find_hardware(&self, name: &str) -> Option<&HardwareRule> {
        self.hardware
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// Substring check against the hardware catalog, used for generic
    /// `Type="..."` attributes that may carry revision suffixes.
    pub fn is_deprecated_hardware(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        self.hardware
            .iter()
            .any(|h| lower.contains(&h.name.to_ascii_lowercase()))
    }

    pub fn resolve_tech_package(&self, name: &str) -> Option<&TechPackageRule> {
        self.tech_packages
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Extract the source format version from manifest text and classify
    /// its major component.
    pub fn detect_format_version(&self, manifest: &str) -> Option<FormatVersion> {
        let caps = self.version_attr.captures(manifest)?;
        let full = caps[1].to_string();
        let major = full
            .split('.')
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .unwrap_or(0);
        Some(FormatVersion { major, full })
    }

    /// Parse an AR version string such as `B4.83` or `4.83`.
    pub fn parse_ar_version(&self, version: &str) -> Option<ArVersion> {
        let caps = self.ar_version.captures(version.trim())?;
        let prefix = caps.get(1).and_then(|m| m.as_str().chars().next());
        let major: u32 = caps[2].parse().ok()?;
        let minor: u32 = caps[3].parse().ok()?;
        let patch: u32 = caps.get(4).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        Some(ArVersion {
            prefix,
            major,
            minor,
            patch,
            numeric: major as f64 + minor as f64 / 100.0,
            full: version.trim().to_string(),
        })
    }

    /// Check an AR version against the AS6 migration minimum.
    pub fn validate_ar_version(&self, version: &str) -> ArValidation {
        match self.parse_ar_version(version) {
            None => ArValidation {
                valid: false,
                message: format!("Unable to parse AR version: {version}"),
            },
            Some(parsed) if parsed.numeric >= AR_MINIMUM_NUMERIC => ArValidation {
                valid: true,
                message: format!(
                    "AR version {} meets minimum requirement ({})",
                    parsed.full, AR_MINIMUM_DISPLAY
                ),
            },
            Some(parsed) => ArValidation {
                valid: false,
                message: format!(
                    "AR version {} is below minimum {} required for AS6 migration. \
                     Upgrade to the latest AS4 AR version before migrating.",
                    parsed.full, AR_MINIMUM_DISPLAY
                ),
            },
        }
    }

    /// Extract `(name, version)` pairs from the manifest's
    /// `TechnologyPackages` block.
    pub fn extract_tech_packages(&self, manifest: &str) -> Vec<(String, String)> {
        let mut packages = Vec::new();
        if let Some(section) = self.tech_section.captures(manifest) {
            for caps in self.package_tag.captures_iter(&section[1]) {
                packages.push((caps[1].to_string(), caps[2].to_string()));
            }
        }
        packages
    }

    /// Resolve source packages to their AS6 targets. Replaced-by
    /// redirection takes precedence over a direct version upgrade; unknown
    /// packages are preserved verbatim with a manual-review note; packages
    /// new in AS6 and not already present are appended.
    pub fn resolve_packages(&self, source: &[(String, String)]) -> Vec<ResolvedPackage> {
        let mut resolved: Vec<ResolvedPackage> = Vec::new();
        for (name, version) in source {
            match self.resolve_tech_package(name) {
                Some(rule) => {
                    if let Some(target_name) = rule.replaced_by.as_deref() {
                        let target = self.resolve_tech_package(target_name);
                        resolved.push(ResolvedPackage {
                            name: target_name.to_string(),
                            version: target
                                .and_then(|t| t.as6_version.clone())
                                .unwrap_or_else(|| version.clone()),
                            sub_versions: target
                                .map(|t| t.sub_versions.clone())
                                .unwrap_or_default(),
                            note: format!("Replaced {name} with {target_name}"),
                        });
                    } else if let Some(as6) = rule.as6_version.as_deref() {
                        resolved.push(ResolvedPackage {
                            name: name.clone(),
                            version: as6.to_string(),
                            sub_versions: rule.sub_versions.clone(),
                            note: format!("Upgraded from {version} to {as6}"),
                        });
                    } else {
                        resolved.push(ResolvedPackage {
                            name: name.clone(),
                            version: version.clone(),
                            sub_versions: Vec::new(),
                            note: "No AS6 version known - manual review required".to_string(),
                        });
                    }
                }
                None => resolved.push(ResolvedPackage {
                    name: name.clone(),
                    version: version.clone(),
                    sub_versions: Vec::new(),
                    note: "Unknown package - manual review required".to_string(),
                }),
            }
        }
        for rule in &self.tech_packages {
            if rule.new_in_as6 && rule.required {
                let exists = resolved.iter().any(|p| p.name == rule.name);
                if !exists {
                    resolved.push(ResolvedPackage {
                        name: rule.name.clone(),
                        version: rule
                            .as6_version
                            .clone()
                            .unwrap_or_else(|| "unknown".to_string()),
                        sub_versions: rule.sub_versions.clone(),
                        note: "New AS6 package added".to_string(),
                    });
                }
            }
        }
        resolved
    }

    /// Rewrite an AS4 project manifest into the AS6 format: fixed header,
    /// required elements with IEC settings lifted from the nested AS4
    /// values, and the recomputed technology-package list.
    pub fn convert_manifest(&self, as4: &str) -> String {
        let edition = self
            .edition_attr
            .captures(as4)
            .map_or_else(|| "Standard".to_string(), |c| c[1].to_string());
        let pointers = self
            .pointers_elem
            .captures(as4)
            .map_or(true, |c| c[1].trim() == "true");
        let naming = self
            .naming_elem
            .captures(as4)
            .map_or(true, |c| c[1].trim() == "true");

        let packages = self.resolve_packages(&self.extract_tech_packages(as4));

        let mut out = String::new();
        out.push_str(AS6_XML_DECLARATION);
        out.push('\n');
        out.push_str(AS6_PROCESSING_INSTRUCTION);
        out.push('\n');
        out.push_str(&format!(
            "<Project Version=\"1.0.0\" Edition=\"{edition}\" EditionComment=\"{edition}\" \
             xmlns=\"{AS6_PROJECT_NAMESPACE}\">\n"
        ));
        out.push_str("  <Communication />\n");
        out.push_str("  <ANSIC DefaultIncludes=\"true\" />\n");
        out.push_str(&format!(
            "  <IEC ExtendedConstants=\"true\" IecExtendedComments=\"true\" \
             KeywordsAsStructureMembers=\"false\" NamingConventions=\"{naming}\" \
             Pointers=\"{pointers}\" Preprocessor=\"false\" />\n"
        ));
        out.push_str("  <Motion RestartAcoposParameter=\"true\" RestartInitParameter=\"true\" />\n");
        out.push_str("  <Project StoreRuntimeInProject=\"true\" />\n");
        out.push_str(
            "  <Variables DefaultInitValue=\"0\" DefaultRetain=\"false\" DefaultVolatile=\"true\" />\n",
        );
        out.push_str("  <TechnologyPackages>\n");
        for pkg in &packages {
            if pkg.sub_versions.is_empty() {
                out.push_str(&format!("    <{} Version=\"{}\" />\n", pkg.name, pkg.version));
            } else {
                let attrs = pkg
                    .sub_versions
                    .iter()
                    .map(|(k, v)| format!("{k}=\"{v}\""))
                    .collect::<Vec<_>>()
                    .join(" ");
                out.push_str(&format!(
                    "    <{} {} Version=\"{}\" />\n",
                    pkg.name, attrs, pkg.version
                ));
            }
        }
        out.push_str("  </TechnologyPackages>\n");
        out.push_str("</Project>");
        out
    }
}

fn lib(
    id: &'static str,
    name: &str,
    severity: Severity,
    category: &'static str,
    description: &str,
    replacement: Option<Replacement>,
    notes: &str,
) -> LibraryRule {
    LibraryRule {
        id,
        name: name.to_string(),
        severity,
        category,
        description: description.to_string(),
        replacement,
        notes: notes.to_string(),
        function_mappings: None,
    }
}

fn builtin_libraries() -> Vec<LibraryRule> {
    let mut libs = vec![
        lib(
            "lib_mpwebxs",
            "MpWebXs",
            Severity::Warning,
            "mapp",
            "MpWebXs technology package - not supported in AS6",
            None,
            "MpWebXs (Web Extensions) is discontinued in AS6. Remove the library and all \
             .mpwebxs configuration files from the project.",
        ),
        lib(
            "lib_asarcnet",
            "AsARCNET",
            Severity::Error,
            "networking",
            "ARCNET networking library - discontinued",
            None,
            "ARCNET technology is obsolete. Migrate to POWERLINK or Ethernet-based communication.",
        ),
        lib(
            "lib_assgcio",
            "AsSGCIO",
            Severity::Error,
            "io",
            "SGC I/O library - discontinued",
            None,
            "Hardware-specific library no longer supported.",
        ),
        lib(
            "lib_astpu",
            "AsTPU",
            Severity::Error,
            "system",
            "TPU library - discontinued",
            None,
            "TPU functionality integrated into runtime.",
        ),
        lib(
            "lib_c220man",
            "C220man",
            Severity::Error,
            "hardware",
            "C220 management library - discontinued",
            None,
            "C220 hardware family no longer supported.",
        ),
        lib(
            "lib_canio",
            "CANIO",
            Severity::Error,
            "fieldbus",
            "CAN I/O library - discontinued",
            Some(Replacement::new("ArCanOpen", "Modern CANopen library")),
            "Migrate to ArCanOpen for CAN-based communication.",
        ),
        lib(
            "lib_dm_lib",
            "DM_Lib",
            Severity::Error,
            "data",
            "Data management library - archived",
            None,
            "Use modern data handling approaches.",
        ),
        lib(
            "lib_fdd_lib",
            "FDD_lib",
            Severity::Error,
            "storage",
            "Floppy disk drive library - discontinued",
            Some(Replacement::new("FileIO", "Modern file I/O library")),
            "Floppy disk hardware obsolete. Use USB or network storage.",
        ),
        lib(
            "lib_if361",
            "IF361",
            Severity::Error,
            "communication",
            "IF361 interface library - discontinued",
            None,
            "Hardware interface no longer manufactured.",
        ),
        lib(
            "lib_ioconfig",
            "IOConfig",
            Severity::Warning,
            "io",
            "I/O configuration library",
            Some(Replacement::new("ArIoConfig", "Updated I/O configuration")),
            "API changes require code updates.",
        ),
    ];
    let mut io_lib = lib(
        "lib_io_lib",
        "IO_lib",
        Severity::Warning,
        "io",
        "Legacy I/O library",
        Some(Replacement::new("AsIO", "Modern I/O library with async support")),
        "IO_lib functions have direct equivalents in AsIO.",
    );
    io_lib.function_mappings = Some(vec![
        FunctionMapping {
            old: "IO_Read".to_string(),
            new: "AsIO_Read".to_string(),
        },
        FunctionMapping {
            old: "IO_Write".to_string(),
            new: "AsIO_Write".to_string(),
        },
    ]);
    libs.push(io_lib);
    libs
}

fn func(
    id: &'static str,
    name: &str,
    severity: Severity,
    description: &str,
    replacement: Option<Replacement>,
    notes: &str,
    pattern: &str,
) -> FunctionRule {
    FunctionRule {
        id,
        name: name.to_string(),
        severity,
        description: description.to_string(),
        replacement,
        notes: notes.to_string(),
        pattern: Regex::new(pattern).expect("builtin function pattern"),
    }
}

fn plcopen_fb(id: &'static str, old: &'static str, new: &'static str) -> FunctionRule {
    func(
        id,
        old,
        Severity::Warning,
        "B&R-specific motion FB replaced by PLCopen standard",
        Some(Replacement::new(new, "Standard PLCopen function block")),
        &format!("Use standard PLCopen {new}. Parameters are compatible."),
        &format!(r"\b{old}\b"),
    )
}

fn builtin_functions() -> Vec<FunctionRule> {
    vec![
        func(
            "func_memcpy",
            "memcpy",
            Severity::Warning,
            "Standard C memcpy - use brsmemcpy in AS6 Structured Text",
            Some(Replacement::new("brsmemcpy", "brsmemcpy from the AsBrStr library")),
            "Use brsmemcpy from AsBrStr library.",
            r"(?i)\bmemcpy\s*\(",
        ),
        func(
            "func_memset",
            "memset",
            Severity::Warning,
            "Standard C memset - use brsmemset in AS6 Structured Text",
            Some(Replacement::new("brsmemset", "brsmemset from the AsBrStr library")),
            "Use brsmemset from AsBrStr library.",
            r"(?i)\bmemset\s*\(",
        ),
        func(
            "func_memcmp",
            "memcmp",
            Severity::Warning,
            "Standard C memcmp - use brsmemcmp in AS6 Structured Text",
            Some(Replacement::new("brsmemcmp", "brsmemcmp from the AsBrStr library")),
            "Use brsmemcmp from AsBrStr library.",
            r"(?i)\bmemcmp\s*\(",
        ),
        func(
            "func_datobj",
            "DatObjCreate",
            Severity::Warning,
            "Data object creation - interface changed",
            Some(Replacement::new("DatObjCreate", "Parameter order changed in AS6")),
            "Parameter order changed in AS6.",
            r"(?i)DatObjCreate\s*\(",
        ),
        plcopen_fb("func_mc_br_moveabsolute", "MC_BR_MoveAbsolute", "MC_MoveAbsolute"),
        plcopen_fb("func_mc_br_moveadditive", "MC_BR_MoveAdditive", "MC_MoveAdditive"),
        plcopen_fb("func_mc_br_movevelocity", "MC_BR_MoveVelocity", "MC_MoveVelocity"),
        plcopen_fb("func_mc_br_jog", "MC_BR_Jog", "MC_Jog"),
        plcopen_fb("func_mc_br_halt", "MC_BR_Halt", "MC_Halt"),
        plcopen_fb("func_mc_br_stop", "MC_BR_Stop", "MC_Stop"),
        plcopen_fb("func_mc_br_home", "MC_BR_Home", "MC_Home"),
        plcopen_fb(
            "func_mc_br_readactualposition",
            "MC_BR_ReadActualPosition",
            "MC_ReadActualPosition",
        ),
        func(
            "func_mtbasicspid",
            "MTBasicsPID",
            Severity::Warning,
            "Legacy MTBasics PID controller replaced by mapp",
            None,
            "Consider migrating to MpTempController for advanced features.",
            r"\bMTBasicsPID\b",
        ),
    ]
}

fn hw(
    id: &'static str,
    name: &str,
    module_class: &'static str,
    severity: Severity,
    description: &str,
    replacement: Option<Replacement>,
    notes: &str,
    eol: Option<&str>,
) -> HardwareRule {
    HardwareRule {
        id,
        name: name.to_string(),
        module_class,
        severity,
        description: description.to_string(),
        replacement,
        notes: notes.to_string(),
        eol: eol.map(|e| e.to_string()),
    }
}

fn builtin_hardware() -> Vec<HardwareRule> {
    vec![
        hw(
            "hw_x20cp0201",
            "X20CP0201",
            "cpu",
            Severity::Error,
            "Compact CPU module - discontinued",
            Some(Replacement::new("X20CP1381", "Modern compact CPU with more memory")),
            "Hardware replacement required. Check I/O compatibility.",
            Some("2020-06-30"),
        ),
        hw(
            "hw_x20cp0291",
            "X20CP0291",
            "cpu",
            Severity::Error,
            "Compact CPU module - discontinued",
            Some(Replacement::new("X20CP1382", "Enhanced compact CPU")),
            "Direct replacement available.",
            Some("2020-06-30"),
        ),
        hw(
            "hw_x20cp1483",
            "X20CP1483",
            "cpu",
            Severity::Warning,
            "Performance CPU - limited support",
            Some(Replacement::new("X20CP1586", "Latest performance CPU")),
            "Support ends 2026. Plan migration.",
            Some("2026-12-31"),
        ),
        hw(
            "hw_x20cp1584",
            "X20CP1584",
            "cpu",
            Severity::Warning,
            "High-performance CPU - limited support",
            Some(Replacement::new("X20CP3586", "Next-gen high-performance CPU")),
            "Support ends 2026. Plan migration.",
            Some("2026-12-31"),
        ),
        hw(
            "hw_x20ai2632_1",
            "X20AI2632-1",
            "analog_input",
            Severity::Error,
            "Analog input module - discontinued",
            Some(Replacement::new("X20AI2636", "6-channel analog input")),
            "Check channel count and resolution compatibility.",
            Some("2021-12-31"),
        ),
        hw(
            "hw_x20ao2632_1",
            "X20AO2632-1",
            "analog_output",
            Severity::Error,
            "Analog output module - discontinued",
            Some(Replacement::new("X20AO2636", "6-channel analog output")),
            "Check channel count and resolution compatibility.",
            Some("2021-12-31"),
        ),
        hw(
            "hw_x20do2623",
            "X20DO2623",
            "digital_output",
            Severity::Error,
            "Digital output module - discontinued",
            Some(Replacement::new("X20DO2649", "Modern digital output")),
            "Direct replacement with improved specs.",
            Some("2020-12-31"),
        ),
        hw(
            "hw_x20dm9371",
            "X20DM9371",
            "digital_mixed",
            Severity::Warning,
            "Digital mixed module - limited support",
            Some(Replacement::new("X20DM9324", "Updated mixed I/O module")),
            "Support continues. Plan future migration.",
            Some("2027-12-31"),
        ),
        hw(
            "hw_x20if0022",
            "X20IF0022",
            "interface",
            Severity::Error,
            "Interface module - discontinued",
            None,
            "No direct replacement. Evaluate architecture.",
            Some("2019-12-31"),
        ),
        hw(
            "hw_x20if0024",
            "X20IF0024",
            "interface",
            Severity::Error,
            "Interface module - discontinued",
            Some(Replacement::new("X20IF10D1-1", "Modern interface module")),
            "Interface type may differ. Check compatibility.",
            Some("2020-12-31"),
        ),
        hw(
            "hw_x20ps2100",
            "X20PS2100",
            "power_supply",
            Severity::Warning,
            "Power supply - aging model",
            Some(Replacement::new("X20PS3300", "Modern power supply")),
            "Still supported. Upgrade recommended for new installations.",
            None,
        ),
        hw(
            "hw_x20bc0083",
            "X20BC0083",
            "bus_controller",
            Severity::Warning,
            "Bus controller - limited support",
            Some(Replacement::new("X20BC0087", "Modern bus controller")),
            "Support continues with limited updates.",
            Some("2027-12-31"),
        ),
    ]
}

fn tp(
    name: &str,
    as4_version: Option<&str>,
    as6_version: Option<&str>,
    replaced_by: Option<&str>,
    new_in_as6: bool,
) -> TechPackageRule {
    TechPackageRule {
        name: name.to_string(),
        as4_version: as4_version.map(|v| v.to_string()),
        as6_version: as6_version.map(|v| v.to_string()),
        replaced_by: replaced_by.map(|v| v.to_string()),
        new_in_as6,
        required: true,
        sub_versions: Vec::new(),
    }
}

fn builtin_tech_packages() -> Vec<TechPackageRule> {
    let mut packages = vec![
        tp("Acp10Arnc0", Some("5.24.1"), Some("6.2.0"), None, false),
        tp("mapp", Some("5.24.2"), None, Some("mappServices"), false),
        tp("mappServices", None, Some("6.2.0"), None, true),
        tp("mappMotion", Some("5.24.1"), Some("6.0.0"), None, false),
        tp("mappControl", Some("5.24.1"), Some("6.1.0"), None, false),
        tp("mappSafety", Some("5.24.1"), Some("6.2.0"), None, false),
        tp("mappView", Some("5.24.1"), Some("6.2.0"), None, false),
        tp("mappVision", Some("5.30.3307"), Some("6.0.0"), None, false),
        tp("mappCockpit", Some("5.24.2"), Some("6.2.1"), None, false),
        tp("OpcUaCs", None, Some("6.0.0"), None, true),
    ];
    let mut opcuafx = tp("OpcUaFx", None, Some("6.1.0"), None, true);
    opcuafx.sub_versions = vec![
        ("FxPtpB".to_string(), "6.1.0".to_string()),
        ("FxPubSubB".to_string(), "6.1.0".to_string()),
        ("PubSub".to_string(), "1.3.0".to_string()),
    ];
    packages.push(opcuafx);
    packages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_are_case_insensitive() {
        let rules = RuleSet::builtin();
        assert!(rules.find_library("asarcnet").is_some());
        assert!(rules.find_function("MEMCPY").is_some());
        assert!(rules.find_hardware("x20cp0201").is_some());
        assert!(rules.resolve_tech_package("MAPP").is_some());
        assert!(rules.find_library("NotALibrary").is_none());
    }

    #[test]
    fn test_hardware_substring_check() {
        let rules = RuleSet::builtin();
        assert!(rules.is_deprecated_hardware("X20CP0201"));
        assert!(rules.is_deprecated_hardware("X20CP0201 rev B"));
        assert!(!rules.is_deprecated_hardware("X20CP1586"));
    }

    #[test]
    fn test_detect_format_version() {
        let rules = RuleSet::builtin();
        let v4 = rules
            .detect_format_version(r#"<?AutomationStudio Version="4.9.3.20"?>"#)
            .unwrap();
        assert_eq!(v4.major, 4);
        assert_eq!(v4.full, "4.9.3.20");
        let v6 = rules
            .detect_format_version(r#"<?AutomationStudio Version="6.5.0.305"?>"#)
            .unwrap();
        assert_eq!(v6.major, 6);
        assert!(rules.detect_format_version("<Project />").is_none());
    }

    #[test]
    fn test_parse_ar_version_letter_prefix() {
        let rules = RuleSet::builtin();
        let v = rules.parse_ar_version("B4.83").unwrap();
        assert_eq!(v.prefix, Some('B'));
        assert_eq!(v.major, 4);
        assert_eq!(v.minor, 83);
        assert!((v.numeric - 4.83).abs() < 1e-9);
        assert!(rules.parse_ar_version("not-a-version").is_none());
    }

    #[test]
    fn test_validate_ar_version_gate() {
        let rules = RuleSet::builtin();
        assert!(rules.validate_ar_version("B4.83").valid);
        assert!(!rules.validate_ar_version("B4.10").valid);
        assert!(!rules.validate_ar_version("garbage").valid);
    }

    #[test]
    fn test_resolve_packages_replaced_by_precedence() {
        let rules = RuleSet::builtin();
        let resolved =
            rules.resolve_packages(&[("mapp".to_string(), "5.24.2".to_string())]);
        let mapp = &resolved[0];
        assert_eq!(mapp.name, "mappServices");
        assert_eq!(mapp.version, "6.2.0");
        // New AS6-only packages appended when absent; mappServices counts
        // as present through the redirection.
        assert!(resolved.iter().filter(|p| p.name == "mappServices").count() == 1);
        assert!(resolved.iter().any(|p| p.name == "OpcUaCs"));
        assert!(resolved.iter().any(|p| p.name == "OpcUaFx"));
    }

    #[test]
    fn test_resolve_packages_unknown_preserved_verbatim() {
        let rules = RuleSet::builtin();
        let resolved = rules.resolve_packages(&[("Foo".to_string(), "1.2.3".to_string())]);
        assert_eq!(resolved[0].name, "Foo");
        assert_eq!(resolved[0].version, "1.2.3");
        assert!(resolved[0].note.contains("manual review"));
    }

    #[test]
    fn test_convert_manifest_rewrites_packages() {
        let rules = RuleSet::builtin();
        let as4 = r#"<?xml version="1.0" encoding="utf-8"?>
<?AutomationStudio Version="4.9.3.20"?>
<Project Edition="Standard">
  <IECExtendedSettings>
    <Pointers>true</Pointers>
    <NamingConventions>false</NamingConventions>
  </IECExtendedSettings>
  <TechnologyPackages>
    <mapp Version="5.24.2" />
    <Acp10Arnc0 Version="5.24.1" />
  </TechnologyPackages>
</Project>"#;
        let as6 = rules.convert_manifest(as4);
        assert!(as6.starts_with(AS6_XML_DECLARATION));
        assert!(as6.contains(AS6_PROCESSING_INSTRUCTION));
        assert!(as6.contains(r#"xmlns="http://br-automation.co.at/AS/Project""#));
        assert!(as6.contains(r#"<mappServices Version="6.2.0" />"#));
        assert!(as6.contains(r#"<Acp10Arnc0 Version="6.2.0" />"#));
        assert!(as6.contains(r#"NamingConventions="false""#));
        assert!(as6.contains(r#"Pointers="true""#));
        assert!(!as6.contains("<mapp Version"));
    }

    #[test]
    fn test_convert_manifest_renders_sub_versions() {
        let rules = RuleSet::builtin();
        let as6 = rules.convert_manifest("<TechnologyPackages></TechnologyPackages>");
        assert!(as6.contains(
            r#"<OpcUaFx FxPtpB="6.1.0" FxPubSubB="6.1.0" PubSub="1.3.0" Version="6.1.0" />"#
        ));
    }
}
