use anyhow::{Context as _, Result};
use colored::Colorize;
use podspec::patch_pod_spec;
use statetree::{AttrPath, PatchOperations, ResourceData, Tree};

use crate::Context;
use crate::cli::PlanArgs;
use crate::commands::{load_config, read_json};
use crate::ui;

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let prefix = args.prefix.as_deref().unwrap_or(&config.pod.prefix);
    let pointer = args.pointer.as_deref().unwrap_or(&config.pod.pointer);

    let prior: Tree = read_json(&args.prior)?;
    let desired: Tree = read_json(&args.desired)?;
    let ops = compile_plan(prior.clone(), desired.clone(), prefix, pointer)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ops)?);
        return Ok(());
    }

    ui::header("Plan");
    ui::kv("Prefix", prefix);
    ui::kv("Pointer", pointer);

    if ctx.verbose > 0 {
        ui::section("Attribute changes");
        ui::line_diff(
            &serde_json::to_string_pretty(&prior)?,
            &serde_json::to_string_pretty(&desired)?,
        );
    }

    ui::section("Patch");
    if ops.is_empty() {
        ui::success("No in-place changes");
        return Ok(());
    }
    for op in &ops {
        println!("  {} {}", "~".yellow(), op);
    }
    println!();
    println!("{} operation(s)", ops.len());
    Ok(())
}

/// Patch turning the pod spec at `prefix` in `prior` into the one in `desired`
pub fn compile_plan(
    prior: Tree,
    desired: Tree,
    prefix: &str,
    pointer: &str,
) -> Result<PatchOperations> {
    let prefix: AttrPath = prefix
        .parse()
        .with_context(|| format!("Invalid attribute prefix '{prefix}'"))?;
    let data = ResourceData::new("plan", prior, desired);
    patch_pod_spec(&data, &prefix, pointer).context("Failed to compile patch")
}
