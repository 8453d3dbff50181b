//! `coco` command line converter.
//!
//! Usage:
//!   coco Austria "United Kingdom" --to ISO2
//!   coco 40 276 --to name_short --json
//!   coco "Wirtland" --additional-data my_countries.tsv --to ISO3

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use country_converter::{init_logging, CountryConverter, LoggingConfig, NotFound};

#[derive(Debug, Parser)]
#[command(name = "coco", version, about = "Convert country names and codes between classification schemes")]
struct Cli {
    /// Names or codes to convert
    #[arg(required_unless_present = "list_classes")]
    names: Vec<String>,

    /// Source scheme ("regex" for free text); detected per value if omitted
    #[arg(short, long)]
    src: Option<String>,

    /// Target scheme
    #[arg(short, long, env = "COCO_TO", default_value = "ISO3")]
    to: String,

    /// Placeholder for values that match nothing
    #[arg(long, env = "COCO_NOT_FOUND", default_value = "not found")]
    not_found: String,

    /// Tab-separated file with extra or overriding records (repeatable)
    #[arg(long = "additional-data", value_name = "FILE")]
    additional_data: Vec<PathBuf>,

    /// Restrict the table to UN member states
    #[arg(long)]
    un_only: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// List the available classification schemes and exit
    #[arg(long)]
    list_classes: bool,
}

fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env());
    let cli = Cli::parse();

    let mut builder = CountryConverter::builder().only_un_members(cli.un_only);
    for path in &cli.additional_data {
        builder = builder.additional_data_file(path);
    }
    let converter = builder.build().context("failed to build country converter")?;

    if cli.list_classes {
        println!("{}", converter.valid_classes().join(" "));
        return Ok(());
    }

    let mut request = converter
        .convert(cli.names.clone())
        .to(cli.to.as_str())
        .not_found(NotFound::Sentinel(cli.not_found.clone()));
    if let Some(src) = &cli.src {
        request = request.src(src.as_str());
    }
    let output = request.run().context("conversion failed")?;

    if cli.json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        let parts: Vec<String> = output.into_vec().iter().map(ToString::to_string).collect();
        println!("{}", parts.join(" "));
    }
    Ok(())
}
