use clap::{Parser, ValueEnum};
use feature_tracking_benchmark::algorithms::{MatcherStrategy, SelectionPolicy};
use feature_tracking_benchmark::config::DistanceNormPolicy;
use feature_tracking_benchmark::data_loader::{FrameSource, GlobSequence};
use feature_tracking_benchmark::io::{
    object_from_json, object_to_json, render_skipped, write_json_report, write_report,
};
use feature_tracking_benchmark::metrics::SweepReport;
use feature_tracking_benchmark::{AlgorithmRegistry, Sweep, SweepConfig};
use std::time::Instant;

#[derive(Clone, Copy, ValueEnum)]
enum MatcherArg {
    /// exhaustive brute force
    Bf,
    /// LSH / kd-tree index
    Indexed,
}

#[derive(Clone, Copy, ValueEnum)]
enum NormArg {
    Auto,
    Hamming,
    L2,
}

#[derive(Clone, Copy, ValueEnum)]
enum SelectorArg {
    /// nearest neighbour
    Nn,
    /// 2-nn with distance ratio test
    Knn,
}

#[derive(Parser)]
#[command(version, about, author)]
struct FtbenchCli {
    /// base folder of the image sequence
    path: Option<String>,

    /// sweep config json, flags below override its fields
    #[arg(short, long)]
    config: Option<String>,

    /// file name prefix in front of the frame number
    #[arg(long)]
    prefix: Option<String>,

    /// file extension including the dot
    #[arg(long)]
    extension: Option<String>,

    #[arg(long)]
    start: Option<usize>,

    #[arg(long)]
    end: Option<usize>,

    /// digits of the zero padded frame number
    #[arg(long)]
    fill_width: Option<usize>,

    /// load every .png/.jpg matching this pattern instead of numbered files
    #[arg(long)]
    glob: Option<String>,

    /// comma separated detector ids, e.g. SHITOMASI,HARRIS,FAST
    #[arg(long, value_delimiter = ',')]
    detectors: Vec<String>,

    /// comma separated descriptor ids, e.g. BRIEF,HOG
    #[arg(long, value_delimiter = ',')]
    descriptors: Vec<String>,

    #[arg(long, value_enum)]
    matcher: Option<MatcherArg>,

    #[arg(long, value_enum)]
    norm: Option<NormArg>,

    #[arg(long, value_enum)]
    selector: Option<SelectorArg>,

    /// ratio test threshold for the knn selector
    #[arg(long)]
    ratio: Option<f32>,

    /// keep keypoints of the whole image
    #[arg(long)]
    no_roi: bool,

    #[arg(long)]
    max_keypoints: Option<usize>,

    /// frames held in memory
    #[arg(long)]
    buffer: Option<usize>,

    /// log match pairs to rerun
    #[arg(long)]
    visualize: bool,

    /// save the rerun recording to this file instead of spawning a viewer
    #[arg(long)]
    rrd: Option<String>,

    /// run combinations in parallel
    #[arg(long)]
    parallel: bool,

    /// write the full report as json
    #[arg(long)]
    json: Option<String>,

    /// write the text report to a file
    #[arg(long)]
    report: Option<String>,

    /// write the effective config as json
    #[arg(long)]
    dump_config: Option<String>,
}

fn build_config(cli: &FtbenchCli) -> Result<SweepConfig, Box<dyn std::error::Error>> {
    let mut config: SweepConfig = match &cli.config {
        Some(path) => object_from_json(path)?,
        None => SweepConfig::default(),
    };
    if let Some(path) = &cli.path {
        config.images.base_path = path.clone();
    }
    if let Some(prefix) = &cli.prefix {
        config.images.prefix = prefix.clone();
    }
    if let Some(extension) = &cli.extension {
        config.images.extension = extension.clone();
    }
    if let Some(start) = cli.start {
        config.images.start_index = start;
    }
    if let Some(end) = cli.end {
        config.images.end_index = end;
    }
    if let Some(fill_width) = cli.fill_width {
        config.images.fill_width = fill_width;
    }
    if !cli.detectors.is_empty() {
        config.detector_ids = cli.detectors.iter().map(|s| s.trim().to_uppercase()).collect();
    }
    if !cli.descriptors.is_empty() {
        config.descriptor_ids = cli.descriptors.iter().map(|s| s.trim().to_uppercase()).collect();
    }
    if let Some(matcher) = cli.matcher {
        config.matcher_strategy = match matcher {
            MatcherArg::Bf => MatcherStrategy::BruteForce,
            MatcherArg::Indexed => MatcherStrategy::Indexed,
        };
    }
    if let Some(norm) = cli.norm {
        config.distance_norm = match norm {
            NormArg::Auto => DistanceNormPolicy::Auto,
            NormArg::Hamming => DistanceNormPolicy::Hamming,
            NormArg::L2 => DistanceNormPolicy::L2,
        };
    }
    match (cli.selector, cli.ratio) {
        (Some(SelectorArg::Nn), _) => config.selection = SelectionPolicy::NearestNeighbor,
        (Some(SelectorArg::Knn), Some(threshold)) | (None, Some(threshold)) => {
            config.selection = SelectionPolicy::KnnRatio { threshold }
        }
        (Some(SelectorArg::Knn), None) => config.selection = SelectionPolicy::default(),
        (None, None) => {}
    }
    if cli.no_roi {
        config.region_of_interest = None;
    }
    if cli.max_keypoints.is_some() {
        config.max_keypoints = cli.max_keypoints;
    }
    if let Some(buffer) = cli.buffer {
        config.buffer_capacity = buffer;
    }
    config.visualize |= cli.visualize;
    config.parallel |= cli.parallel;
    Ok(config)
}

fn run_sweep<S: FrameSource + ?Sized>(
    config: &SweepConfig,
    registry: &AlgorithmRegistry,
    source: &S,
    recording: Option<&rerun::RecordingStream>,
) -> feature_tracking_benchmark::Result<SweepReport> {
    Sweep::new(config, registry, source)
        .with_recording(recording)
        .run_with(|result| print!("{}", result))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = FtbenchCli::parse();
    let config = build_config(&cli)?;
    if let Some(path) = &cli.dump_config {
        object_to_json(path, &config)?;
    }
    let registry = AlgorithmRegistry::with_defaults();

    let recording = if config.visualize {
        let builder = rerun::RecordingStreamBuilder::new("feature_tracking");
        Some(match &cli.rrd {
            Some(path) => builder.save(path)?,
            None => builder.spawn()?,
        })
    } else {
        None
    };

    let now = Instant::now();
    let report = match &cli.glob {
        Some(pattern) => {
            let source = GlobSequence::new(pattern, 0, 1)?;
            run_sweep(&config, &registry, &source, recording.as_ref())?
        }
        None => run_sweep(&config, &registry, &config.images, recording.as_ref())?,
    };
    let duration_sec = now.elapsed().as_secs_f64();
    print!("{}", render_skipped(&report));
    println!("--------------------");
    print!("{}", report.summary_table());
    println!("sweep took {:.6} sec", duration_sec);

    if let Some(path) = &cli.report {
        write_report(path, &report)?;
    }
    if let Some(path) = &cli.json {
        write_json_report(path, &report)?;
    }
    Ok(())
}
