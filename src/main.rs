// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::error::Error;
use std::path::PathBuf;

use chordtrainer::challenge::{init_chord_challenge, ChordChallenge};
use chordtrainer::config::Settings;
use chordtrainer::piano::{NoteName, PitchedNote};
use chordtrainer::samples::PlaybackEngine;
use chordtrainer::store::ChallengeStore;
use chordtrainer::{audio, voicing};
use clap::{crate_version, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "An ear-training chord generator."
)]
struct Cli {
    /// The path to the settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints a random chord.
    Chord {
        /// Use the chord's notes as-is without doubling voices.
        #[arg(short, long)]
        monophonic: bool,
        /// The number of voices to generate.
        #[arg(short, long)]
        size: Option<usize>,
        /// The random seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Manages the stored challenge.
    Challenge {
        #[clap(subcommand)]
        command: ChallengeCommands,
    },
    /// Plays the given notes (e.g. C4 E4 G4) through the audio device.
    Play {
        #[arg(required = true)]
        notes: Vec<PitchedNote>,
    },
    /// Lists the available audio output devices.
    Devices {},
}

#[derive(Subcommand)]
enum ChallengeCommands {
    /// Creates and stores a new challenge.
    New {
        /// The random seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Prints the stored challenge rows.
    Show {},
    /// Plays one of the challenge's chords.
    Listen {
        /// Which chord to play.
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        chord: u8,
    },
    /// Answers the rows from lowest to highest (e.g. C E G) and prints the result.
    Evaluate {
        answers: Vec<NoteName>,
    },
    /// Removes the stored challenge.
    Clear {},
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn stored_challenge(store: &ChallengeStore) -> Result<ChordChallenge, Box<dyn Error>> {
    store
        .get()?
        .ok_or_else(|| "no challenge stored, run `challenge new` first".into())
}

fn print_rows(challenge: &ChordChallenge) {
    for row in challenge.rows.iter() {
        let selected = row
            .selected_note
            .map_or_else(|| "-".to_string(), |note| note.to_string());
        println!("{}  {:<16} {}", row.id, row.title, selected);
    }
}

async fn play(engine: &PlaybackEngine, notes: &[PitchedNote]) -> Result<(), Box<dyn Error>> {
    let deadline = engine.play_chord(notes).await?;
    tokio::time::sleep(deadline).await;
    engine.stop_chord();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Chord {
            monophonic,
            size,
            seed,
        } => {
            let chord = voicing::generate_random_chord(&mut rng(seed), !monophonic, size)?;
            println!("{}", chord);
        }
        Commands::Challenge { command } => {
            let store = ChallengeStore::new(&settings.store_path());
            match command {
                ChallengeCommands::New { seed } => {
                    let challenge = init_chord_challenge(&mut rng(seed), settings.polyphonic())?;
                    store.save(&challenge)?;
                    println!("New challenge with {} rows.", challenge.rows.len());
                    print_rows(&challenge);
                }
                ChallengeCommands::Show {} => {
                    let challenge = stored_challenge(&store)?;
                    print_rows(&challenge);
                    if let Some(result) = challenge.result.as_ref() {
                        println!("Score: {}/{}", result.score, result.total);
                    }
                }
                ChallengeCommands::Listen { chord } => {
                    let challenge = stored_challenge(&store)?;
                    let chord = if chord == 1 {
                        &challenge.chord1
                    } else {
                        &challenge.chord2
                    };
                    play(&PlaybackEngine::new(&settings), &chord.pitched_notes).await?;
                }
                ChallengeCommands::Evaluate { answers } => {
                    let mut challenge = stored_challenge(&store)?;
                    if answers.len() > challenge.rows.len() {
                        return Err(format!(
                            "{} answers given, challenge only has {} rows",
                            answers.len(),
                            challenge.rows.len()
                        )
                        .into());
                    }

                    let ids: Vec<String> = challenge.rows.iter().map(|r| r.id.clone()).collect();
                    for (id, answer) in ids.iter().zip(answers) {
                        challenge.select_note(id, answer)?;
                    }
                    let result = challenge.evaluate_selected().clone();
                    store.save(&challenge)?;

                    for row in result.rows.iter() {
                        match row.correct_answer {
                            None => println!("{}  correct", row.id),
                            Some(expected) => println!("{}  wrong, expected {}", row.id, expected),
                        }
                    }
                    println!("Score: {}/{}", result.score, result.total);
                }
                ChallengeCommands::Clear {} => {
                    store.clear()?;
                    println!("Challenge cleared.");
                }
            }
        }
        Commands::Play { notes } => {
            play(&PlaybackEngine::new(&settings), &notes).await?;
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(())
}
