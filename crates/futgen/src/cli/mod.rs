//! CLI subcommands: generation, baseline comparison, rule checks, config.

mod compare_cmd;
mod config_cmd;
mod generate;
mod validate;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use futgen_lib::assembler::{CONFIG_ERROR_KEY, ConfigAssembler, TestConfigs};
pub(super) use futgen_lib::capabilities::CapabilityStore;
pub(super) use futgen_lib::compare::{self, Comparison};
pub(super) use futgen_lib::config::Config;
pub(super) use futgen_lib::error::{FutgenError, Result};
pub(super) use futgen_lib::generator::{GenType, ParamSet};
pub(super) use futgen_lib::regulatory::RegulatoryValidator;
pub(super) use futgen_lib::template::TemplateSet;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Comma-joined list, or `none`.
pub(super) fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

// ── JSON helpers ──

pub(super) fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| FutgenError::Json(e.to_string()))
}

/// Write pretty JSON (sorted keys, trailing newline), creating parent directories.
pub(super) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, format!("{}\n", to_pretty(value)?))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

/// `<output_dir>/<prefix>_<suffix>.json`. Absolute prefixes ignore `output_dir`.
pub(super) fn artifact_path(output_dir: &str, prefix: &str, suffix: &str) -> PathBuf {
    Path::new(output_dir).join(format!("{prefix}_{suffix}.json"))
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct CaseSummaryJson {
    pub name: String,
    pub configurations: usize,
    pub skipped: bool,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub(super) struct GenerateOutput {
    pub dut: String,
    pub reference: String,
    pub gen_type: String,
    pub artifact: String,
    pub cases: Vec<CaseSummaryJson>,
}

#[derive(Serialize)]
pub(super) struct ArtifactsJson {
    pub generated: String,
    pub baseline: String,
}

#[derive(Serialize)]
pub(super) struct CompareOutput {
    pub generated_cases: usize,
    pub baseline_cases: usize,
    pub artifacts: Option<ArtifactsJson>,
    pub comparison: Comparison,
}

#[derive(Serialize)]
pub(super) struct ValidateOutput {
    pub band: String,
    pub channel: u32,
    pub ht_mode: String,
    pub domain: String,
    pub valid: bool,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub problems: Vec<String>,
}

/// Summarize one generated test case.
pub(super) fn summarize(name: &str, rows: &[ParamSet]) -> CaseSummaryJson {
    let marker = match rows {
        [only] => Some(only),
        _ => None,
    };
    let error = marker
        .and_then(|r| r.get(CONFIG_ERROR_KEY))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let skipped = error.is_none()
        && marker.is_some_and(|r| r.len() == 2 && r.get("skip") == Some(&serde_json::Value::Bool(true)));
    CaseSummaryJson {
        name: name.to_string(),
        configurations: if error.is_some() || skipped { 0 } else { rows.len() },
        skipped,
        error,
    }
}

// ── Loading ──

/// Devices and test selection shared by `generate` and `compare`.
#[derive(clap::Args, Debug, Clone)]
pub struct Target {
    /// Device-under-test model (capability document name)
    #[arg(long, value_name = "MODEL")]
    pub dut: String,

    /// Reference device model
    #[arg(long = "ref", value_name = "MODEL")]
    pub reference: String,

    /// Only load `<MODULE>_inputs.json` template files (e.g. NM WM)
    #[arg(long, num_args = 1.., value_name = "MODULE")]
    pub modules: Option<Vec<String>>,

    /// Only generate these test cases
    #[arg(long = "test", num_args = 1.., value_name = "NAME")]
    pub tests: Option<Vec<String>>,

    /// Override the configured gen_type (optimized, extended)
    #[arg(long)]
    pub gen_type: Option<String>,
}

impl Target {
    /// Default artifact prefix: `<DUT>_<REF>`, plus the module list when filtered.
    pub(super) fn default_prefix(&self) -> String {
        match &self.modules {
            Some(modules) if !modules.is_empty() => {
                format!("{}_{}_{}", self.dut, self.reference, modules.join("_"))
            }
            _ => format!("{}_{}", self.dut, self.reference),
        }
    }
}

/// Load config from a custom path or the platform default, logging problems.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(path) => Config::load_from(path),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    if let Err(errors) = config.validate() {
        for e in &errors {
            log::warn!("config: {e}");
        }
    }
    config
}

/// Everything one generation run reads, loaded from the configured paths.
pub(super) struct Session {
    pub dut: CapabilityStore,
    pub reference: CapabilityStore,
    pub gen_type: GenType,
    pub assembler: ConfigAssembler,
}

impl Session {
    pub(super) fn open(config: &Config, target: &Target) -> Result<Self> {
        let caps_dir = Path::new(&config.capabilities_dir);
        let dut = CapabilityStore::load(caps_dir, &target.dut)?;
        let reference = CapabilityStore::load(caps_dir, &target.reference)?;

        let gen_type = match &target.gen_type {
            Some(t) => GenType::parse(t).ok_or_else(|| {
                FutgenError::Config(format!(
                    "unknown gen type \"{t}\" (expected \"optimized\" or \"extended\")"
                ))
            })?,
            None => config.parse_gen_type(),
        };

        let templates = TemplateSet::load(
            Path::new(&config.template_dir),
            dut.wifi_vendor(),
            dut.model(),
            target.modules.as_deref(),
        )?;
        if templates.is_empty() {
            log::warn!("no test templates found under {}", config.template_dir);
        }
        let regulatory = RegulatoryValidator::from_path(Path::new(&config.regulatory_file))?;

        let mut assembler = ConfigAssembler::new(templates, regulatory).with_gen_type(gen_type);
        if let Some(tests) = &target.tests {
            assembler = assembler.with_tests(tests.clone());
        }
        Ok(Session {
            dut,
            reference,
            gen_type,
            assembler,
        })
    }

    pub(super) fn generate(&self) -> Result<TestConfigs> {
        self.assembler.get_test_configs(&self.dut, &self.reference)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate test configurations for a DUT and reference device
    Generate {
        #[command(flatten)]
        target: Target,
        /// Write `<PREFIX>_gen.json` under output_dir instead of printing
        #[arg(short, long, value_name = "PREFIX")]
        output: Option<String>,
    },

    /// Compare generated configurations against a recorded baseline
    Compare {
        #[command(flatten)]
        target: Target,
        /// Recorded configuration (test-case name to list of parameter sets)
        #[arg(long)]
        baseline: PathBuf,
        /// Also write `<PREFIX>_gen.json` and `<PREFIX>_def.json` under output_dir
        #[arg(short, long, value_name = "PREFIX")]
        output: Option<String>,
    },

    /// Check a channel against the regulatory rule table
    Validate {
        /// Radio band (24g, 5g, 5gl, 5gu, 6g)
        #[arg(long)]
        band: String,
        #[arg(long)]
        channel: u32,
        /// Channel bandwidth (HT20, HT40, HT80, HT160)
        #[arg(long)]
        ht_mode: String,
        /// Regulatory domain (default: the DUT's, else US)
        #[arg(long)]
        domain: Option<String>,
        /// Take the regulatory domain from this model's capabilities
        #[arg(long, value_name = "MODEL")]
        dut: Option<String>,
    },

    /// Show current configuration and file paths
    Config {
        /// Write a config file holding the defaults (refuses to overwrite)
        #[arg(long)]
        init: bool,
    },
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::Generate { target, output } => {
            let config = load_config(config_path);
            generate::cmd_generate(&config, &target, output.as_deref(), json)
        }
        Command::Compare {
            target,
            baseline,
            output,
        } => {
            let config = load_config(config_path);
            compare_cmd::cmd_compare(&config, &target, &baseline, output.as_deref(), json)
        }
        Command::Validate {
            band,
            channel,
            ht_mode,
            domain,
            dut,
        } => {
            let config = load_config(config_path);
            let query = validate::Query {
                band,
                channel,
                ht_mode,
                domain,
                dut,
            };
            validate::cmd_validate(&config, &query, json)
        }
        Command::Config { init: true } => config_cmd::cmd_config_init(config_path),
        Command::Config { init: false } => config_cmd::cmd_config(json, config_path),
    }
}


#[cfg(test)]
mod helper_tests {
    use serde_json::json;

    use super::*;

    fn rows(v: serde_json::Value) -> Vec<ParamSet> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn summarize_counts_plain_rows() {
        let s = summarize("a", &rows(json!([{"x": 1}, {"x": 2}])));
        assert_eq!(s.configurations, 2);
        assert!(!s.skipped);
        assert!(s.error.is_none());
    }

    #[test]
    fn summarize_detects_skip_marker() {
        let s = summarize("a", &rows(json!([{"skip": true, "skip_msg": "n/a"}])));
        assert!(s.skipped);
        assert_eq!(s.configurations, 0);
    }

    #[test]
    fn summarize_detects_error_marker() {
        let s = summarize(
            "a",
            &rows(json!([{"config_error": "bad row", "skip": true, "skip_msg": "bad row"}])),
        );
        assert_eq!(s.error.as_deref(), Some("bad row"));
        assert!(!s.skipped);
    }

    #[test]
    fn skip_flag_on_real_row_is_not_a_marker() {
        let s = summarize("a", &rows(json!([{"channel": 6, "skip": true, "skip_msg": "x"}])));
        assert!(!s.skipped);
        assert_eq!(s.configurations, 1);
    }

    #[test]
    fn artifact_path_joins_output_dir() {
        assert_eq!(
            artifact_path("out", "PP203X_PP603X", "gen"),
            Path::new("out").join("PP203X_PP603X_gen.json")
        );
    }

    #[test]
    fn default_prefix_includes_modules() {
        let mut t = Target {
            dut: "PP203X".into(),
            reference: "PP603X".into(),
            modules: None,
            tests: None,
            gen_type: None,
        };
        assert_eq!(t.default_prefix(), "PP203X_PP603X");
        t.modules = Some(vec!["NM".into(), "WM".into()]);
        assert_eq!(t.default_prefix(), "PP203X_PP603X_NM_WM");
    }

    #[test]
    fn write_json_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.json");
        write_json(&path, &json!({"z": 1, "a": 2})).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        assert!(contents.find("\"a\"") < contents.find("\"z\""));
    }

    #[test]
    fn config_output_missing_path_is_null() {
        let output = ConfigOutput {
            config_file: None,
            config_file_exists: false,
            settings: Config::default(),
            problems: vec![],
        };
        let parsed: serde_json::Value = serde_json::from_str(&to_pretty(&output).unwrap()).unwrap();
        assert!(parsed["config_file"].is_null());
        assert_eq!(parsed["settings"]["gen_type"], "optimized");
    }
}
