//! `generate` subcommand: run every generator and write or print the result.

use super::{
    Config, GenerateOutput, Result, Session, Target, TestConfigs, artifact_path, kv, kv_width,
    summarize, to_pretty, write_json,
};

pub(super) fn cmd_generate(config: &Config, target: &Target, output: Option<&str>, json: bool) -> Result<()> {
    let session = Session::open(config, target)?;
    let configs = session.generate()?;

    let Some(prefix) = output else {
        println!("{}", to_pretty(&configs)?);
        return Ok(());
    };
    let path = artifact_path(&config.output_dir, prefix, "gen");
    write_json(&path, &configs)?;

    if json {
        let out = GenerateOutput {
            dut: session.dut.model().to_string(),
            reference: session.reference.model().to_string(),
            gen_type: session.gen_type.as_str().to_string(),
            artifact: path.display().to_string(),
            cases: configs.iter().map(|(name, rows)| summarize(name, rows)).collect(),
        };
        println!("{}", to_pretty(&out)?);
        return Ok(());
    }

    print_summary(&configs);
    println!();
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_summary(configs: &TestConfigs) {
    let names: Vec<&str> = configs.keys().map(String::as_str).collect();
    let w = kv_width(&names, &[]);
    let mut total = 0;
    for (name, rows) in configs {
        let summary = summarize(name, rows);
        total += summary.configurations;
        match (&summary.error, summary.skipped) {
            (Some(e), _) => kv(name, format_args!("error: {e}"), w),
            (None, true) => kv(name, "skipped", w),
            (None, false) => kv(name, summary.configurations, w),
        }
    }
    println!();
    println!("{} test case(s), {total} configuration(s)", configs.len());
}
