use crate::cli::Aln2countsArgs;
use crate::utils::{create_output, open_input, Result};
use rayon::ThreadPoolBuilder;
use seqcount_core::insertions::DiskMultiset;
use seqcount_core::io::csv::{read_clipping, read_conseq_insertions, read_remap_conseqs};
use seqcount_core::io::AlignedReadGroups;
use seqcount_core::progress::LogProgress;
use seqcount_core::writers::CsvReportWriter;
use seqcount_core::{ProjectConfig, ReportConfig, SequenceReport};
use std::path::Path;

pub fn aln2counts(args: Aln2countsArgs) -> Result<()> {
    ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("seqcount-{}", i))
        .build_global()
        .map_err(|e| format!("Failed to start thread pool: {}", e))?;

    let projects = ProjectConfig::load(&args.references_path, &args.regions_path)
        .map_err(|e| e.to_string())?;

    let config = ReportConfig {
        mixture_cutoffs: args.mixture_cutoffs.0.clone(),
        consensus_min_coverage: args.consensus_min_coverage,
        gap_open: args.gap_open,
        gap_extend: args.gap_extend,
        overlap_region: args.overlap_region.clone(),
        g2p_seed: args.g2p_seed.clone(),
        progress_interval: args.progress_interval,
    };
    let mut report = SequenceReport::new(projects, config).map_err(|e| e.to_string())?;

    if let Some(path) = &args.clipping_path {
        let clipping = read_clipping(open_input(path)?, &source(path)).map_err(|e| e.to_string())?;
        report = report.with_clipping(clipping);
    }
    if let Some(path) = &args.conseq_ins_path {
        let counts =
            read_conseq_insertions(open_input(path)?, &source(path)).map_err(|e| e.to_string())?;
        report = report.with_conseq_insertions(counts);
    }
    if let Some(path) = &args.remap_conseq_path {
        let conseqs =
            read_remap_conseqs(open_input(path)?, &source(path)).map_err(|e| e.to_string())?;
        report = report.with_remap_conseqs(conseqs);
    }
    if let Some(limit) = args.read_memory_limit {
        let mut store = DiskMultiset::new(limit);
        if let Some(dir) = &args.tmp_dir {
            store = store.temp_dir(dir.clone());
        }
        report = report.with_read_store(Box::new(store));
    }

    let total_bytes = file_size(&args.aligned_path)?
        + match &args.g2p_aligned_path {
            Some(path) => file_size(path)?,
            None => 0,
        };
    report = report.with_progress(Box::new(LogProgress::new("Counted aligned reads")), total_bytes);

    let mut writer = open_writer(&args)?;
    let aligned = AlignedReadGroups::new(
        open_input(&args.aligned_path)?,
        &source(&args.aligned_path),
    )
    .map_err(|e| e.to_string())?;
    let g2p_aligned = match &args.g2p_aligned_path {
        Some(path) => Some(
            AlignedReadGroups::new(open_input(path)?, &source(path)).map_err(|e| e.to_string())?,
        ),
        None => None,
    };

    report
        .process_reads(aligned, g2p_aligned, &mut writer)
        .map_err(|e| e.to_string())?;
    Ok(())
}

fn open_writer(args: &Aln2countsArgs) -> Result<CsvReportWriter> {
    let mut writer = CsvReportWriter::new();
    if let Some(path) = &args.insertions_path {
        writer = writer.with_insertions(create_output(path)?).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.nuc_path {
        writer = writer.with_nucleotide(create_output(path)?).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.amino_path {
        writer = writer.with_amino(create_output(path)?).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.conseq_path {
        writer = writer.with_consensus(create_output(path)?).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.failed_align_path {
        writer = writer.with_failures(create_output(path)?).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.coverage_summary_path {
        writer = writer.with_coverage(create_output(path)?).map_err(|e| e.to_string())?;
    }
    Ok(writer)
}

fn source(path: &Path) -> String {
    path.display().to_string()
}

fn file_size(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}
