//! Command-line entry point.
//!
//! ```text
//! wiretag-gen --type Message,User [--output path] [--no-header] [dir]
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "wiretag-gen",
    version,
    about = "Generate protobuf encoders/decoders for #[proto]-tagged structs"
)]
struct Cli {
    /// Comma-separated list of struct names to process.
    #[arg(long = "type", value_delimiter = ',', required = true, value_name = "NAME")]
    types: Vec<String>,

    /// Output file path; defaults to `<type>_proto.rs` in the source
    /// directory.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Skip the header section (marshaler pool and oneof definitions); use
    /// when appending to an existing generated file.
    #[arg(long)]
    no_header: bool,

    /// Source directory to scan.
    #[arg(default_value = ".")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = wiretag_gen::Config::new();
    for name in &cli.types {
        config.type_name(name.trim());
    }
    if let Some(output) = &cli.output {
        config.output(output);
    }
    config.skip_header(cli.no_header);

    let path = config
        .generate(&cli.dir)
        .with_context(|| format!("generating code for {}", cli.dir.display()))?;
    tracing::info!(path = %path.display(), "generated");
    Ok(())
}
