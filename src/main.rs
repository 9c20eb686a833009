//! Hands-free cursor control driven by facial landmarks.

use anyhow::{Context, Result};
use clap::Parser;
use face_gesture_control::{
    app::{spawn_stdin_commands, GestureApp},
    config::{AppConfig, EXAMPLE_CONFIG},
};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Recorded landmark CSV to replay
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Log actions instead of moving the real pointer
    #[arg(long)]
    dry_run: bool,

    /// Screen size as WIDTHxHEIGHT, disables auto detection
    #[arg(long, value_parser = parse_screen)]
    screen: Option<(u32, u32)>,

    /// Threshold file to load and persist tuning to
    #[arg(short, long)]
    thresholds: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    example_config: bool,
}

fn parse_screen(value: &str) -> std::result::Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value}"))?;
    let width = width.trim().parse().map_err(|e| format!("bad width {width:?}: {e}"))?;
    let height = height.trim().parse().map_err(|e| format!("bad height {height:?}: {e}"))?;
    Ok((width, height))
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    info!("Face Gesture Control");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            AppConfig::from_file(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => AppConfig::default(),
    };

    // Command line overrides
    if let Some(landmarks) = args.landmarks {
        config.source.landmarks = Some(landmarks);
    }
    if args.dry_run {
        config.sink.dry_run = true;
    }
    if let Some((width, height)) = args.screen {
        config.screen.auto_detect = false;
        config.screen.width = width;
        config.screen.height = height;
    }
    if let Some(thresholds) = args.thresholds {
        config.thresholds.path = thresholds;
    }

    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;

    let app = GestureApp::new(config).context("Failed to initialize")?;
    let commands = spawn_stdin_commands()?;
    info!("Type <threshold>+ / <threshold>- to tune, reset, status, reset-gestures or quit");

    let report = app.run(commands)?;
    info!(
        "Processed {} of {} frames, {} actions ({} failed)",
        report.evaluated, report.acquired, report.actions, report.sink_errors
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_screen() {
        assert_eq!(parse_screen("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_screen("800X600"), Ok((800, 600)));
        assert!(parse_screen("1280").is_err());
        assert!(parse_screen("wide x tall").is_err());
    }
}
