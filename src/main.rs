use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use bundle_resolver::{
  BundleConfig, BundleSetBuilder, FsResourceReader, PrefixGeneratorRegistry, ResourceBundle,
  VariantContext,
};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Resolve bundle mappings against a resource directory and print the resulting lists.
#[derive(Debug, Parser)]
#[command(name = "bundle-resolve", version)]
struct Args {
  /// Directory resources are read from.
  #[arg(long, default_value = ".")]
  root: PathBuf,
  /// Bundle configuration file (JSON or YAML); discovered in the root when omitted.
  #[arg(long)]
  config: Option<PathBuf>,
  /// Print the debug-mode lists instead of the production ones.
  #[arg(long)]
  debug: bool,
  /// Requested variant as `axis=value`; repeatable.
  #[arg(long = "variant", value_parser = parse_pair)]
  variants: Vec<(String, String)>,
  /// Generator prefix and its variant axes as `prefix=axis,axis`; repeatable.
  #[arg(long = "generator", value_parser = parse_pair)]
  generators: Vec<(String, String)>,
  /// Only print the named bundle.
  #[arg(long)]
  bundle: Option<String>,
  /// Emit JSON instead of text.
  #[arg(long)]
  json: bool,
}

#[derive(Serialize)]
struct BundleReport {
  name: String,
  id: String,
  variant_key: Option<String>,
  paths: Vec<String>,
  licenses: Vec<String>,
}

fn parse_pair(value: &str) -> Result<(String, String), String> {
  value
    .split_once('=')
    .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
    .filter(|(key, _)| !key.is_empty())
    .ok_or_else(|| format!("expected key=value, got `{value}`"))
}

fn report(bundle: &ResourceBundle, context: &VariantContext, debug: bool) -> BundleReport {
  let paths = if debug {
    bundle.debug_paths_for(context)
  } else {
    bundle.production_paths_for(context)
  };
  BundleReport {
    name: bundle.name().to_string(),
    id: bundle.id().to_string(),
    variant_key: bundle.select_variant_key(context),
    paths: paths.iter().map(ToString::to_string).collect(),
    licenses: bundle.licenses().iter().cloned().collect(),
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let args = Args::parse();

  let config = match &args.config {
    Some(path) => BundleConfig::from_path(path)
      .with_context(|| format!("failed to load {}", path.display()))?,
    None => BundleConfig::discover(&args.root)
      .with_context(|| format!("failed to discover configuration in {}", args.root.display()))?,
  };
  if config.bundles.is_empty() {
    let searched: Vec<String> = BundleConfig::default_locations(&args.root)
      .iter()
      .map(|path| path.display().to_string())
      .collect();
    bail!("no bundles configured (searched {})", searched.join(", "));
  }

  let mut registry = PrefixGeneratorRegistry::new();
  for (prefix, axes) in &args.generators {
    let axes = axes.split(',').map(str::trim).filter(|axis| !axis.is_empty());
    registry = registry
      .register(prefix, axes)
      .ok_or_else(|| anyhow!("invalid generator prefix `{prefix}`"))?;
  }

  let set = BundleSetBuilder::new(Arc::new(FsResourceReader::new(&args.root)))
    .with_generators(Arc::new(registry))
    .build(config)
    .context("failed to resolve bundles")?;

  let context: VariantContext = args.variants.iter().cloned().collect();
  let reports: Vec<BundleReport> = match &args.bundle {
    Some(name) => {
      let bundle = set
        .get(name)
        .ok_or_else(|| anyhow!("unknown bundle `{name}`"))?;
      vec![report(bundle, &context, args.debug)]
    }
    None => set
      .iter()
      .map(|bundle| report(bundle, &context, args.debug))
      .collect(),
  };

  let mut out = String::new();
  if args.json {
    out.push_str(&serde_json::to_string_pretty(&reports)?);
    out.push('\n');
  } else {
    for entry in &reports {
      out.push_str(&format!("{} ({})\n", entry.name, entry.id));
      if let Some(key) = &entry.variant_key {
        out.push_str(&format!("  variant: {key}\n"));
      }
      for path in &entry.paths {
        out.push_str(&format!("  {path}\n"));
      }
      for license in &entry.licenses {
        out.push_str(&format!("  license: {license}\n"));
      }
    }
  }

  std::io::stdout()
    .write_all(out.as_bytes())
    .context("failed to write output")?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_key_value_pairs() {
    assert_eq!(parse_pair("locale = fr"), Ok(("locale".into(), "fr".into())));
    assert!(parse_pair("locale").is_err());
    assert!(parse_pair("=fr").is_err());
  }

  #[test]
  fn cli_arguments_are_well_formed() {
    use clap::CommandFactory;
    Args::command().debug_assert();
  }
}
