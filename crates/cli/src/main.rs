use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use face_age_core::analysis::infrastructure::analyzer_loader::{
    preferred_targets, ReplayAnalyzerFactory,
};
use face_age_core::capture::domain::frame_source::FrameSource;
use face_age_core::capture::infrastructure::image_decoder::is_image;
use face_age_core::capture::infrastructure::image_file_source::ImageFileSource;
use face_age_core::capture::infrastructure::image_sequence_source::ImageSequenceSource;
use face_age_core::pipeline::frame_processor::AnnotatedFace;
use face_age_core::pipeline::session::Session;
use face_age_core::pipeline::session_observer::{LogSessionObserver, SessionObserver};
use face_age_core::shared::config::TrackerConfig;
use face_age_core::shared::constants::DEFAULT_FRAME_DELAY_MS;
use face_age_core::shared::frame::Frame;
use face_age_core::tracking::domain::age_recorder::AgeStatistics;

/// Stable per-person age and gender estimates over an image or frame sequence.
#[derive(Parser)]
#[command(name = "face-age")]
struct Cli {
    /// Input image file, or a directory of frames processed in name order.
    input: PathBuf,

    /// Per-frame face analysis results (JSON).
    #[arg(long)]
    detections: PathBuf,

    /// Tracker configuration (JSON). Missing keys use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write final statistics and the last annotated faces to this JSON file.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Pause between frames of a sequence, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_FRAME_DELAY_MS)]
    frame_delay_ms: u64,

    /// Skip the accelerated backend and load the analyzer on CPU.
    #[arg(long)]
    cpu_only: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    input: &'a Path,
    frames: usize,
    statistics: AgeStatistics,
    faces: &'a [AnnotatedFace],
}

/// Prints each face as it is annotated. Everything else goes to the log.
struct TerminalObserver {
    inner: LogSessionObserver,
}

impl SessionObserver for TerminalObserver {
    fn frame(&mut self, frame: &Frame, faces: &[AnnotatedFace]) {
        for face in faces {
            println!(
                "frame {:>5}  {:<9} age {:>3}  {:<6}  {}",
                frame.index(),
                face.identity_id.label(),
                face.age,
                face.gender,
                face.status_label()
            );
        }
        self.inner.frame(frame, faces);
    }

    fn statistics(&mut self, stats: &AgeStatistics) {
        self.inner.statistics(stats);
    }

    fn warning(&mut self, message: &str) {
        eprintln!("Warning: {message}");
        self.inner.warning(message);
    }

    fn summary(&self) {
        self.inner.summary();
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let single_image = cli.input.is_file();
    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if single_image {
        // One submission would otherwise never reach the analysis cadence.
        config.process_every_n_frames = 1;
    }

    let observer = TerminalObserver {
        inner: LogSessionObserver::new(),
    };
    let mut session = Session::new(config, Box::new(observer))?
        .with_frame_delay(Duration::from_millis(cli.frame_delay_ms));

    let factory = ReplayAnalyzerFactory::new(cli.detections.clone());
    session.load_model(&factory, &preferred_targets(cli.cpu_only))?;

    if single_image {
        run_image(&mut session, &cli.input)?;
    } else {
        run_sequence(&mut session, &cli.input)?;
    }

    let statistics = session.statistics();
    print_statistics(&statistics);
    session.observer().summary();

    if let Some(report_path) = &cli.report {
        write_report(report_path, &cli.input, &session, statistics)?;
        log::info!("Report written to {}", report_path.display());
    }

    Ok(())
}

fn run_image(session: &mut Session, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = ImageFileSource::new(input.to_path_buf());
    source.open()?;
    let frame = source
        .next_frame()?
        .ok_or_else(|| format!("No image data in {}", input.display()))?;
    source.close();

    let faces = session.submit_image(&frame);
    if faces.is_empty() {
        println!("No faces found in {}", input.display());
    }
    Ok(())
}

fn run_sequence(session: &mut Session, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = ImageSequenceSource::new(dir.to_path_buf());
    let summary = session.start_capture(&mut source)?;
    log::info!("Processed {} frames from {}", summary.frames, dir.display());
    Ok(())
}

fn print_statistics(stats: &AgeStatistics) {
    println!();
    println!("People detected: {}", stats.population);
    let (Some(mean), Some(min), Some(max)) = (stats.mean_age, stats.min_age, stats.max_age)
    else {
        println!("No ages recorded yet");
        return;
    };
    println!("Average age: {mean:.1} years (range {min}-{max})");
    for (age, count) in &stats.histogram {
        println!("  {age:>3}: {}", "#".repeat(*count));
    }
    for person in &stats.people {
        println!("  {}: {} years", person.label, person.age);
    }
}

fn write_report(
    path: &Path,
    input: &Path,
    session: &Session,
    statistics: AgeStatistics,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Report {
        input,
        frames: session.processor().frame_count(),
        statistics,
        faces: session.last_faces(),
    };
    fs::write(path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if cli.input.is_file() && !is_image(&cli.input) {
        return Err(format!("Unsupported image format: {}", cli.input.display()).into());
    }
    if !cli.detections.is_file() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if let Some(config) = &cli.config {
        if !config.is_file() {
            return Err(format!("Config file not found: {}", config.display()).into());
        }
    }
    Ok(())
}
