use std::{path::PathBuf, process::exit, str::FromStr};

use clap::{Parser, Subcommand};
use synmerge::cli::{run_merge, MergeArgs};
use synmerge::context::MergeContext;
use synmerge::settings::DisplaySettings;
use synmerge::strategy::Strategy;

/// Syntax-aware n-way merge engine.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct CliArgs {
    /// Verbosity
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Do a three-way merge
    Merge {
        /// Path to the file containing the base revision
        base: PathBuf,
        /// Path to the file containing the left revision
        left: PathBuf,
        /// Path to the file containing the right revision
        right: PathBuf,
        /// Which strategy to dispatch through: linebased, structured,
        /// combined or nway
        #[arg(short, long, default_value = "combined")]
        strategy: String,
        /// Length of conflict markers
        #[arg(short = 'l', long, default_value_t = 3)]
        conflict_marker_size: usize,
        /// Emit the base section of conflicts too (diff3-style)
        #[arg(long)]
        diff3: bool,
        /// Path to write the merge result to; defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Name to use for the base revision in conflict markers
        #[arg(short = 's', long)]
        base_name: Option<String>,
        /// Name to use for the left revision in conflict markers
        #[arg(short = 'x', long)]
        left_name: Option<String>,
        /// Name to use for the right revision in conflict markers
        #[arg(short = 'y', long)]
        right_name: Option<String>,
    },
}

fn main() {
    let args = CliArgs::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(if args.verbose { 3 } else { 2 })
        .init()
        .unwrap();

    match real_main(args) {
        Ok(exit_code) => exit(exit_code),
        Err(message) => {
            eprintln!("synmerge: {message}");
            exit(1)
        }
    }
}

fn real_main(args: CliArgs) -> Result<i32, String> {
    match args.command {
        CliCommand::Merge {
            base,
            left,
            right,
            strategy,
            conflict_marker_size,
            diff3,
            output,
            base_name,
            left_name,
            right_name,
        } => {
            let strategy = Strategy::from_str(&strategy).map_err(|e| e.to_string())?;
            let mut settings = DisplaySettings { diff3, conflict_marker_size, ..DisplaySettings::default() };
            if let Some(name) = base_name {
                settings.base_revision_name = name;
            }
            if let Some(name) = left_name {
                settings.left_revision_name = name;
            }
            if let Some(name) = right_name {
                settings.right_revision_name = name;
            }

            let merge_args = MergeArgs { base, left, right, strategy, settings };
            let ctx = MergeContext::default();
            let outcome = run_merge(&merge_args, &ctx).map_err(|e| e.to_string())?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &outcome.contents).map_err(|e| e.to_string())?;
                }
                None => print!("{}", outcome.contents),
            }

            Ok(if outcome.has_conflicts() { 1 } else { 0 })
        }
    }
}
