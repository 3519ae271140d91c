//! `config` subcommand: show current configuration and file paths.

use std::path::Path;

use super::{Config, ConfigOutput, FutgenError, Result, kv, kv_indent, kv_width, to_pretty};

fn path_status(path: &str) -> &'static str {
    if Path::new(path).exists() {
        "present"
    } else {
        "not found"
    }
}

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            problems,
        };
        println!("{}", to_pretty(&output)?);
        return Ok(());
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "gen_type:",
            "regulatory_file:",
            "capabilities_dir:",
            "template_dir:",
            "output_dir:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    let gen_type = config.parse_gen_type();
    if gen_type.as_str() == config.gen_type {
        kv_indent("gen_type:", &config.gen_type, w);
    } else {
        kv_indent(
            "gen_type:",
            format_args!("{} (invalid, using {})", config.gen_type, gen_type.as_str()),
            w,
        );
    }
    for (key, value) in [
        ("regulatory_file:", &config.regulatory_file),
        ("capabilities_dir:", &config.capabilities_dir),
        ("template_dir:", &config.template_dir),
        ("output_dir:", &config.output_dir),
    ] {
        kv_indent(key, format_args!("{value} ({})", path_status(value)), w);
    }

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}

/// Write the default settings to the config path.
pub(super) fn cmd_config_init(custom_path: Option<&Path>) -> Result<()> {
    let Some(path) = custom_path.map(Path::to_path_buf).or_else(Config::path) else {
        return Err(FutgenError::Config("no config directory".into()));
    };
    if path.exists() {
        return Err(FutgenError::Config(format!(
            "{} already exists",
            path.display()
        )));
    }
    Config::default().save_to(&path)?;
    log::info!("wrote default config to {}", path.display());
    println!("Wrote {}", path.display());
    Ok(())
}
