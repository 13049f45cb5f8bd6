use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, crate_version};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use drumpad_core::config::KitConfig;
use drumpad_core::kit::{DrumMachine, Sound, Trigger};
use drumpad_core::playback::LivePlayer;
use drumpad_core::samples::{SampleCache, load_sample};

#[derive(Parser)]
#[clap(version = crate_version!(), about = "A drum pad of synthesized and sampled sounds.")]
struct Cli {
    /// JSON kit config; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists every playable sound.
    List {},
    /// Renders sounds one after another into a WAV file.
    Render {
        /// Output WAV path.
        #[arg(short, long)]
        output: PathBuf,
        /// Seconds between consecutive sounds.
        #[arg(short, long, default_value_t = 0.5, value_parser = parse_spacing)]
        spacing: f64,
        /// Sound ids, e.g. kick snare c-4.
        #[arg(required = true)]
        sounds: Vec<Sound>,
    },
    /// Plays sounds through the default output device.
    Play {
        /// Seconds between consecutive sounds.
        #[arg(short, long, default_value_t = 0.5, value_parser = parse_spacing)]
        spacing: f64,
        #[arg(required = true)]
        sounds: Vec<Sound>,
    },
    /// Reads sound ids from stdin, one per line, and plays each as it arrives.
    Pads {},
    /// Downloads the hi-hat sample into the local cache.
    Fetch {},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => KitConfig::from_path(path)?,
        None => KitConfig::default(),
    };

    match cli.command {
        Commands::List {} => {
            for sound in Sound::all() {
                match sound {
                    Sound::Note(note) => println!("{:<12} {:.3} Hz", sound.id(), note.frequency),
                    _ => println!("{:<12} {}", sound.id(), sound.label()),
                }
            }
        }
        Commands::Render {
            output,
            spacing,
            sounds,
        } => {
            let mut machine = DrumMachine::new(config)?;
            if sounds.iter().any(Sound::is_sampled) {
                load_hihat(&mut machine).await?;
            }
            let wav = machine.render_session_wav(&Trigger::sequence(&sounds, spacing))?;
            tokio::fs::write(&output, wav).await?;
            info!(path = %output.display(), sounds = sounds.len(), "wrote session");
        }
        Commands::Play { spacing, sounds } => {
            let player = LivePlayer::open(config.master_gain)?;
            let mut machine = DrumMachine::new(config.with_sample_rate(player.sample_rate()))?;
            if sounds.iter().any(Sound::is_sampled) {
                load_hihat(&mut machine).await?;
            }
            for (i, &sound) in sounds.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(Duration::from_secs_f64(spacing)).await;
                }
                player.play(&machine.trigger(sound)?)?;
            }
            wait_until_silent(&player).await;
        }
        Commands::Pads {} => {
            let player = LivePlayer::open(config.master_gain)?;
            let mut machine = DrumMachine::new(config.with_sample_rate(player.sample_rate()))?;
            if let Err(e) = load_hihat(&mut machine).await {
                warn!(error = %e, "hi-hat unavailable");
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let played = Sound::parse(line)
                    .and_then(|sound| machine.trigger(sound))
                    .map_err(Box::<dyn Error>::from)
                    .and_then(|samples| Ok(player.play(&samples)?));
                if let Err(e) = played {
                    warn!(pad = line, error = %e, "pad failed");
                }
            }
            wait_until_silent(&player).await;
        }
        Commands::Fetch {} => {
            let cache =
                SampleCache::default_location().ok_or("no cache directory on this platform")?;
            let client = reqwest::Client::new();
            cache.load_or_fetch(&client, &config.hihat.url).await?;
            println!("{}", cache.path_for(&config.hihat.url).display());
        }
    }

    Ok(())
}

/// Seconds between sounds: finite and not negative.
fn parse_spacing(s: &str) -> Result<f64, String> {
    let spacing: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if spacing.is_finite() && spacing >= 0.0 {
        Ok(spacing)
    } else {
        Err(format!("spacing must be a non-negative number of seconds, got {s}"))
    }
}

async fn load_hihat(machine: &mut DrumMachine) -> Result<(), Box<dyn Error>> {
    let url = machine.config().hihat.url.clone();
    let cache = SampleCache::default_location();
    if cache.is_none() {
        warn!("no cache directory, fetching hi-hat directly");
    }
    let client = reqwest::Client::new();
    let buffer = load_sample(&client, cache.as_ref(), &url).await?;
    machine.set_hihat_sample(buffer);
    Ok(())
}

async fn wait_until_silent(player: &LivePlayer) {
    while player.active_voices() > 0 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    // Let the device drain its last block.
    tokio::time::sleep(Duration::from_millis(100)).await;
}
