use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::matching::MatchMode;

#[derive(Parser, Debug)]
#[command(
    name = "matcher",
    version,
    about = "Resume to job-posting skill matching and scoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every resume in a directory against every job posting in another.
    Run(RunArgs),
    /// Serve the upload and lookup HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "data/resumes")]
    pub resume_dir: PathBuf,

    #[arg(long, default_value = "data/jobs")]
    pub job_dir: PathBuf,

    /// Overrides MATCH_MODE.
    #[arg(long, value_enum)]
    pub mode: Option<MatchMode>,

    /// Also write the whole batch report to this file.
    #[arg(long)]
    pub summary_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Overrides PORT.
    #[arg(long)]
    pub port: Option<u16>,

    /// Overrides MATCH_MODE.
    #[arg(long, value_enum)]
    pub mode: Option<MatchMode>,
}
