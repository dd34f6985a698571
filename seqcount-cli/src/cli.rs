use crate::utils::Result;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use seqcount_core::report::config::{
    DEFAULT_CONSENSUS_MIN_COVERAGE, DEFAULT_G2P_SEED, DEFAULT_OVERLAP_REGION, GAP_EXTEND_COORD,
    GAP_OPEN_COORD,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name = "seqcount",
          version,
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Count nucleotides and amino acids per coordinate position")]
    Aln2counts(Aln2countsArgs),
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct Aln2countsArgs {
    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "aligned")]
    #[clap(help = "CSV of aligned reads: refname,qcut,rank,count,offset,seq")]
    #[clap(value_name = "ALIGNED_CSV")]
    #[arg(value_parser = check_file_exists)]
    pub aligned_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "references")]
    #[clap(help = "FASTA with seed and coordinate reference sequences")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub references_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "coordinate-regions")]
    #[clap(help = "CSV assigning coordinate references to seeds: seed,coordinate_region")]
    #[clap(value_name = "REGIONS_CSV")]
    #[arg(value_parser = check_file_exists)]
    pub regions_path: PathBuf,

    #[clap(long = "g2p-aligned")]
    #[clap(help = "CSV of aligned G2P reads, processed after the main reads")]
    #[clap(value_name = "ALIGNED_CSV")]
    #[arg(value_parser = check_file_exists)]
    pub g2p_aligned_path: Option<PathBuf>,

    #[clap(long = "clipping")]
    #[clap(help = "CSV of soft-clip counts: refname,pos,count")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_file_exists)]
    pub clipping_path: Option<PathBuf>,

    #[clap(long = "conseq-ins")]
    #[clap(help = "CSV of insertions relative to the sample consensus: refname,qname,pos")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_file_exists)]
    pub conseq_ins_path: Option<PathBuf>,

    #[clap(long = "remap-conseq")]
    #[clap(help = "CSV of remap consensus sequences: region,sequence. Enables deletion realignment")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_file_exists)]
    pub remap_conseq_path: Option<PathBuf>,

    #[clap(help_heading("Outputs"))]
    #[clap(long = "nuc")]
    #[clap(help = "Nucleotide counts output")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub nuc_path: Option<PathBuf>,

    #[clap(help_heading("Outputs"))]
    #[clap(long = "amino")]
    #[clap(help = "Amino acid counts output")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub amino_path: Option<PathBuf>,

    #[clap(help_heading("Outputs"))]
    #[clap(long = "conseq")]
    #[clap(help = "Consensus sequences output")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub conseq_path: Option<PathBuf>,

    #[clap(help_heading("Outputs"))]
    #[clap(long = "insertions")]
    #[clap(help = "Insertions relative to coordinate references output")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub insertions_path: Option<PathBuf>,

    #[clap(help_heading("Outputs"))]
    #[clap(long = "failed-align")]
    #[clap(help = "Failed coordinate alignments output")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub failed_align_path: Option<PathBuf>,

    #[clap(help_heading("Outputs"))]
    #[clap(long = "coverage-summary")]
    #[clap(help = "Best covered region output")]
    #[clap(value_name = "CSV")]
    #[arg(value_parser = check_prefix_path)]
    pub coverage_summary_path: Option<PathBuf>,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "mixture-cutoffs")]
    #[clap(value_name = "CUTOFFS")]
    #[clap(help = "Comma-separated consensus mixture cutoffs, reported after MAX")]
    #[clap(default_value = "0.01,0.02,0.05,0.1,0.2,0.25")]
    #[arg(value_parser = cutoffs_from_string)]
    pub mixture_cutoffs: Cutoffs,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "consensus-min-coverage")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Minimum reads for a consensus position")]
    #[clap(default_value_t = DEFAULT_CONSENSUS_MIN_COVERAGE)]
    pub consensus_min_coverage: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "gap-open")]
    #[clap(value_name = "PENALTY")]
    #[clap(help = "Gap open penalty for coordinate alignment")]
    #[clap(default_value_t = GAP_OPEN_COORD)]
    #[arg(value_parser = non_negative_float)]
    pub gap_open: f32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "gap-extend")]
    #[clap(value_name = "PENALTY")]
    #[clap(help = "Gap extension penalty for coordinate alignment")]
    #[clap(default_value_t = GAP_EXTEND_COORD)]
    #[arg(value_parser = non_negative_float)]
    pub gap_extend: f32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "overlap-region")]
    #[clap(value_name = "REGION")]
    #[clap(help = "Region whose main-stream counts are carried into the G2P stream")]
    #[clap(default_value = DEFAULT_OVERLAP_REGION)]
    pub overlap_region: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "g2p-seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed name of the G2P reads")]
    #[clap(default_value = DEFAULT_G2P_SEED)]
    pub g2p_seed: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "progress-interval")]
    #[clap(value_name = "BYTES")]
    #[clap(help = "Bytes of aligned reads between progress messages [default: 1% of input]")]
    pub progress_interval: Option<u64>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "read-memory")]
    #[clap(value_name = "BYTES")]
    #[clap(help = "Spill retained reads to disk past this many bytes per group")]
    pub read_memory_limit: Option<usize>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "tmp-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help = "Directory for spilled reads [default: system temp]")]
    #[arg(value_parser = check_file_exists)]
    pub tmp_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cutoffs(pub Vec<f64>);

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(path.to_path_buf())
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn non_negative_float(s: &str) -> Result<f32> {
    let value = s
        .parse::<f32>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("The value must be non-negative, got: {}", value))
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn cutoffs_from_string(s: &str) -> Result<Cutoffs> {
    if s.trim().is_empty() {
        return Ok(Cutoffs(Vec::new()));
    }
    s.split(',')
        .map(|x| ensure_unit_float(x.trim()))
        .collect::<Result<Vec<f64>>>()
        .map(Cutoffs)
}
