//! Init command - Write a starter config and its JSON schema

use clap::Args;
use std::fs;
use std::path::PathBuf;

use crate::config::{write_schema, CONFIG_FILE, STARTER_CONFIG};

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite an existing pentimento.config.json
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) {
    let config_path = args.dir.join(CONFIG_FILE);

    if config_path.exists() && !args.force {
        eprintln!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    } else if let Err(e) = fs::write(&config_path, STARTER_CONFIG) {
        eprintln!("Failed to write {}: {}", config_path.display(), e);
        std::process::exit(1);
    } else {
        eprintln!("Created {}", config_path.display());
    }

    match write_schema(&args.dir) {
        Ok(schema_path) => eprintln!("Wrote schema to {}", schema_path.display()),
        Err(e) => {
            eprintln!("\x1b[33mWarning:\x1b[0m Failed to write schema: {}", e);
        }
    }
}
