use std::{
    num::NonZeroU32,
    path::{Path, PathBuf},
    process::ExitCode,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{CommandFactory, Parser};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use arkangel_core::{
    ArkangelError, ErrorKind, FfmpegDecoder, FileSink, ModerationClient, NullSink, OutputSink,
    PlaybackExit, PlaybackSummary, ProviderConfig, VideoAnalysis, WindowSink,
    format_analysis_readable, format_timestamp, get_analysis_path, get_cache_dir, load_analysis,
    play, provider::DEFAULT_VIDEO_URL, save_analysis,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "arkangel")]
#[command(
    about = "Screen a video for porn, gore and drug content, then replay it with flagged seconds blurred"
)]
struct Cli {
    /// Video to be analyzed for impure content
    #[arg(short, long)]
    video: Option<PathBuf>,

    /// Frames per second of the video
    #[arg(short, long)]
    fps: Option<u32>,

    /// Write the censored video to this file instead of opening a window
    #[arg(short, long, conflicts_with = "headless")]
    output: Option<PathBuf>,

    /// Only log per-second decisions, without showing or writing frames
    #[arg(long)]
    headless: bool,

    /// Upload again even if verdicts for this video are cached
    #[arg(long)]
    force: bool,

    /// Moderation endpoint the video is posted to
    #[arg(long, default_value = DEFAULT_VIDEO_URL)]
    endpoint: String,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ArkangelError>().map(ArkangelError::kind) {
        Some(ErrorKind::Configuration) => ExitCode::from(2),
        Some(ErrorKind::Transport) => ExitCode::from(3),
        Some(ErrorKind::Decode) => ExitCode::from(4),
        _ => ExitCode::FAILURE,
    }
}

fn describe_exit(exit: &PlaybackExit) -> String {
    match exit {
        PlaybackExit::VerdictsExhausted { second } => format!(
            "no verdict for {}, stopped",
            format_timestamp(*second as f64)
        ),
        PlaybackExit::UserStopped => "stopped by viewer".to_string(),
        PlaybackExit::EndOfStream => "end of video".to_string(),
    }
}

fn print_summary(summary: &PlaybackSummary, elapsed: Duration) {
    println!(
        "{} Played {} frames, {} blurred, {} unreadable {}",
        style("✓").green().bold(),
        summary.frames_presented,
        style(summary.frames_blurred).yellow(),
        summary.glitches,
        style(format!("[{}]", format_duration(elapsed))).dim()
    );
    println!(
        "{} {}",
        style("Finished:").dim(),
        style(describe_exit(&summary.exit)).cyan()
    );
}

/// Reuse a cached analysis unless forced. An unreadable cache file is
/// skipped with a warning so the video is simply uploaded again.
async fn load_cached(path: &Path, force: bool) -> Option<VideoAnalysis> {
    if force || !path.exists() {
        return None;
    }
    match load_analysis(path).await {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            log::warn!("ignoring cached analysis: {e}");
            None
        }
    }
}

async fn run(cli: &Cli, video: PathBuf, fps: NonZeroU32) -> Result<()> {
    let config = ProviderConfig::default().with_video_url(cli.endpoint.as_str());

    // Validate API key early
    let api_key = config.validate_api_key()?;

    println!(
        "\n{}  {}\n",
        style("arkangel").cyan().bold(),
        style("Video Moderation").dim()
    );

    let total_start = Instant::now();

    // Step 1: Moderate (check cache)
    let step_start = Instant::now();
    let cache_dir = get_cache_dir(&video);
    let analysis_path = get_analysis_path(&cache_dir);

    let analysis = if let Some(analysis) = load_cached(&analysis_path, cli.force).await {
        println!(
            "{} Analyzed: {} seconds {}",
            style("✓").green().bold(),
            analysis.images_results.len(),
            style("(cached)").dim()
        );
        analysis
    } else {
        let spinner = create_spinner(&format!("Analyzing video with {}...", config.name()));
        let client = ModerationClient::new(config, api_key)?;
        let analysis = match client.moderate_video(&video).await {
            Ok(analysis) => analysis,
            Err(e) => {
                spinner.finish_and_clear();
                return Err(e.into());
            }
        };
        if let Err(e) = save_analysis(&analysis, &analysis_path).await {
            log::warn!("could not cache analysis: {e}");
        }
        spinner.finish_with_message(format!(
            "{} Analyzed: {} seconds {}",
            style("✓").green().bold(),
            analysis.images_results.len(),
            style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
        ));
        analysis
    };

    let verdicts = analysis.verdicts();
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}",
        format_analysis_readable(&verdicts, analysis.final_decision.as_deref())
    );
    println!("{}", style("─".repeat(60)).dim());

    // Step 2: Play back with flagged seconds blurred
    let step_start = Instant::now();
    let mut decoder = FfmpegDecoder::open(&video).await?;
    let info = decoder.info();

    let mut sink = if cli.headless {
        OutputSink::Null(NullSink)
    } else if let Some(output) = &cli.output {
        OutputSink::File(FileSink::spawn(info, fps, &video, output)?)
    } else {
        OutputSink::Window(WindowSink::spawn(info, fps)?)
    };

    let summary = play(&mut decoder, &mut sink, &verdicts, fps).await?;
    print_summary(&summary, step_start.elapsed());

    if let Some(output) = &cli.output {
        println!(
            "\n{} {}",
            style("Saved:").dim(),
            style(output.display()).cyan()
        );
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let (Some(video), Some(fps)) = (cli.video.clone(), cli.fps.and_then(NonZeroU32::new)) else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    };

    match run(&cli, video, fps).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            exit_code(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "arkangel",
            "--video",
            "clip.mp4",
            "--fps",
            "30",
            "--headless",
        ])
        .unwrap();
        assert_eq!(cli.video.as_deref(), Some(Path::new("clip.mp4")));
        assert_eq!(cli.fps, Some(30));
        assert!(cli.headless);
        assert_eq!(cli.endpoint, DEFAULT_VIDEO_URL);
    }

    #[test]
    fn missing_inputs_parse_without_error() {
        let cli = Cli::try_parse_from(["arkangel"]).unwrap();
        assert!(cli.video.is_none());
        assert!(cli.fps.is_none());
    }

    #[test]
    fn output_conflicts_with_headless() {
        let parsed = Cli::try_parse_from([
            "arkangel", "--video", "a.mp4", "--fps", "25", "--headless", "--output", "b.mp4",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let config = anyhow::Error::from(ArkangelError::MissingApiKey {
            env_var: "picpurify_key".into(),
        });
        assert_eq!(exit_code(&config), ExitCode::from(2));

        let transport = anyhow::Error::from(ArkangelError::UnexpectedStatus {
            status: 500,
            body: String::new(),
        });
        assert_eq!(exit_code(&transport), ExitCode::from(3));

        let decode = anyhow::Error::from(ArkangelError::VideoNotFound {
            path: PathBuf::from("x.mp4"),
        });
        assert_eq!(exit_code(&decode), ExitCode::from(4));

        assert_eq!(exit_code(&anyhow::anyhow!("other")), ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn corrupt_cache_falls_back_to_upload() {
        let dir = std::env::temp_dir().join(format!("arkangel-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = get_analysis_path(&dir);
        std::fs::write(&path, r#"{"images_results": [ {"porn_detection""#).unwrap();

        assert!(load_cached(&path, false).await.is_none());

        std::fs::write(&path, r#"{"final_decision": "OK", "images_results": []}"#).unwrap();
        assert!(load_cached(&path, false).await.is_some());
        assert!(load_cached(&path, true).await.is_none());

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
