use jianpu::playback::build_schedule;
use jianpu::{PlayerConfig, Score};
use std::env;
use std::process;

const USAGE: &str = "Usage: jianpu [--tempo BPM] [--config FILE] [--dry-run] <shorthand>";

struct Args {
    tempo: Option<u16>,
    config_path: Option<String>,
    dry_run: bool,
    shorthand: String,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut tempo = None;
    let mut config_path = None;
    let mut dry_run = false;
    let mut shorthand = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tempo" => {
                let value = iter.next().ok_or("--tempo needs a value")?;
                let bpm = value
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid tempo '{}'", value))?;
                tempo = Some(bpm);
            }
            "--config" => {
                let value = iter.next().ok_or("--config needs a file")?;
                config_path = Some(value.clone());
            }
            "--dry-run" => dry_run = true,
            "--" => {
                shorthand.extend(iter.by_ref().cloned());
            }
            // "-6" is an octave-down six, not a flag
            flag if flag.starts_with("--") => return Err(format!("Unknown option '{}'", flag)),
            _ => shorthand.push(arg.clone()),
        }
    }

    if shorthand.is_empty() {
        return Err("Missing shorthand".to_string());
    }

    Ok(Args {
        tempo,
        config_path,
        dry_run,
        shorthand: shorthand.join(" "),
    })
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    // Load config
    let config = match &args.config_path {
        Some(path) => match PlayerConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => PlayerConfig::default(),
    };

    let base_octave = match config.base_octave() {
        Ok(octave) => octave,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    // Build the score
    let mut score = Score::new("Untitled");
    if let Err(e) = score.update_tempo(args.tempo.unwrap_or(config.default_tempo)) {
        eprintln!("{}", e);
        process::exit(1);
    }
    let ids = score.add_notes_from_numeric_at(&args.shorthand, base_octave);
    if ids.is_empty() {
        eprintln!("No notes in '{}'", args.shorthand);
        process::exit(1);
    }

    if args.dry_run || !cfg!(feature = "audio") {
        print_schedule(&score, &config);
    } else {
        play(&score, &config);
    }
}

fn print_schedule(score: &Score, config: &PlayerConfig) {
    let schedule = match build_schedule(score.all_notes(), score.tempo(), 0.0, &config.envelope) {
        Ok(schedule) => schedule,
        Err(e) => {
            eprintln!("Scheduling error: {}", e);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&schedule) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error writing schedule: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(feature = "audio")]
fn play(score: &Score, config: &PlayerConfig) {
    use jianpu::playback::{CpalBackend, Player};
    use std::thread;
    use std::time::Duration;

    let output = config.output;
    let mut player = Player::new(move || CpalBackend::open(&output)).with_envelope(config.envelope);

    let schedule = match player.start_playing(score.all_notes(), score.tempo()) {
        Ok(schedule) => schedule,
        Err(e) => {
            eprintln!("Playback error: {}", e);
            process::exit(1);
        }
    };
    eprintln!(
        "Playing {} notes at {} BPM ({:.1}s)",
        schedule.events.len(),
        schedule.tempo,
        schedule.total_duration()
    );

    while player.is_sounding() {
        thread::sleep(Duration::from_millis(20));
    }
    player.stop_playing();
}

#[cfg(not(feature = "audio"))]
fn play(score: &Score, config: &PlayerConfig) {
    print_schedule(score, config);
}
