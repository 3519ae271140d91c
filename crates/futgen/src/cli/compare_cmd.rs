//! `compare` subcommand: diff generated configurations against a baseline.

use std::path::Path;

use super::{
    ArtifactsJson, CompareOutput, Comparison, Config, Result, Session, Target, artifact_path,
    compare, kv, kv_indent, kv_width, list_or_none, to_pretty, write_json,
};

pub(super) fn cmd_compare(
    config: &Config,
    target: &Target,
    baseline_path: &Path,
    output: Option<&str>,
    json: bool,
) -> Result<()> {
    let session = Session::open(config, target)?;
    let generated = session.generate()?;
    let mut baseline = compare::load_baseline(baseline_path)?;
    if let Some(tests) = &target.tests {
        baseline.retain(|name, _| tests.contains(name));
    }

    let artifacts = match output {
        Some(prefix) => {
            let generated_path = artifact_path(&config.output_dir, prefix, "gen");
            let baseline_out = artifact_path(&config.output_dir, prefix, "def");
            write_json(&generated_path, &generated)?;
            write_json(&baseline_out, &baseline)?;
            Some(ArtifactsJson {
                generated: generated_path.display().to_string(),
                baseline: baseline_out.display().to_string(),
            })
        }
        None => None,
    };

    let comparison = compare::compare(&generated, &baseline);
    if comparison.is_clean() {
        log::info!("generated configuration matches {}", baseline_path.display());
    }

    let out = CompareOutput {
        generated_cases: generated.len(),
        baseline_cases: baseline.len(),
        artifacts,
        comparison,
    };
    if json {
        println!("{}", to_pretty(&out)?);
        return Ok(());
    }
    print_comparison(&out);
    Ok(())
}

fn print_comparison(out: &CompareOutput) {
    let w = kv_width(
        &["Generated:", "Baseline:", "Missing:", "Extra:", "Differing:"],
        &["Rows:", "Missing keys:", "Extra keys:", "Differing rows:"],
    );
    kv("Generated:", format_args!("{} test case(s)", out.generated_cases), w);
    kv("Baseline:", format_args!("{} test case(s)", out.baseline_cases), w);

    let Comparison {
        missing,
        extra,
        cases,
    } = &out.comparison;
    kv("Missing:", list_or_none(missing), w);
    kv("Extra:", list_or_none(extra), w);
    kv("Differing:", format_args!("{} test case(s)", cases.len()), w);

    for delta in cases {
        println!();
        println!("{}:", delta.name);
        kv_indent(
            "Rows:",
            format_args!("{} generated, {} baseline", delta.generated_rows, delta.baseline_rows),
            w,
        );
        kv_indent("Missing keys:", list_or_none(&delta.missing_keys), w);
        kv_indent("Extra keys:", list_or_none(&delta.extra_keys), w);
        let rows: Vec<String> = delta.differing_rows.iter().map(ToString::to_string).collect();
        kv_indent("Differing rows:", list_or_none(&rows), w);
    }

    if let Some(a) = &out.artifacts {
        println!();
        println!("Wrote {} and {}", a.generated, a.baseline);
    }
    if out.comparison.is_clean() {
        println!();
        println!("No differences.");
    }
}
