use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use stepgrid::{
    AudioOutput, Category, Config, EngineCommand, EngineUpdate, Grid, Instrument, Result,
    SilentSynth, Synth, spawn_engine,
};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  play                 start or pause
  stop                 stop and rewind
  tempo <bpm>          set tempo
  lever <0..1>         set tempo from the tempo range
  toggle <row> <col>   flip a cell
  add                  append columns
  reset                clear every cell
  select <instrument>  timbre for new cells
  save <name> <path>   write the pattern
  load <path>          read a pattern
  grid                 print the grid
  instruments          list timbres
  quit";

#[derive(Debug, PartialEq)]
enum Input {
    Command(EngineCommand),
    ShowGrid,
    ListInstruments,
    Help,
    Quit,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "stepgrid failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load(Path::new(&path))?,
        None => Config::default(),
    };

    let (output, synth) = open_synth();
    let engine = spawn_engine(&config, synth)?;

    let updates = engine.update_rx.clone();
    std::thread::Builder::new()
        .name("stepgrid-updates".into())
        .spawn(move || {
            for update in updates.iter() {
                report(&update);
            }
        })?;

    println!("{HELP}");
    for line in std::io::stdin().lock().lines() {
        match parse_line(&line?) {
            Ok(None) => {}
            Ok(Some(Input::Quit)) => break,
            Ok(Some(Input::ShowGrid)) => print!("{}", render_grid(&engine.grid())),
            Ok(Some(Input::ListInstruments)) => print!("{}", instrument_list()),
            Ok(Some(Input::Help)) => println!("{HELP}"),
            Ok(Some(Input::Command(command))) => {
                if !engine.send(command) {
                    break;
                }
            }
            Err(message) => eprintln!("{message}"),
        }
    }

    engine.shutdown();
    drop(output);
    Ok(())
}

/// The default output device, or a silent synth when there is none usable.
fn open_synth() -> (Option<AudioOutput>, Box<dyn Synth + Send>) {
    match AudioOutput::open_default() {
        Ok((output, synth)) => (Some(output), Box::new(synth)),
        Err(e) => {
            warn!(error = %e, "no audio output, running silent");
            (None, Box::new(SilentSynth::new()))
        }
    }
}

fn report(update: &EngineUpdate) {
    match update {
        EngineUpdate::ColumnPlayed { column } => debug!(column, "step"),
        EngineUpdate::PlaybackState(state) => println!(
            "{} at {} bpm, column {}",
            if state.is_playing { "playing" } else { "stopped" },
            state.bpm,
            state.current_column
        ),
        EngineUpdate::CellToggled { row, col, active } => {
            println!("cell {row},{col} {}", if *active { "on" } else { "off" })
        }
        EngineUpdate::ColumnsAdded { columns } => println!("{columns} columns"),
        EngineUpdate::GridCleared => println!("grid cleared"),
        EngineUpdate::InstrumentSelected(instrument) => println!("instrument {instrument}"),
        EngineUpdate::ProjectLoaded { name } => println!("loaded {name}"),
        EngineUpdate::ProjectSaved { path } => println!("saved {}", path.display()),
        EngineUpdate::Error { message } => eprintln!("error: {message}"),
    }
}

fn parse_line(line: &str) -> std::result::Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let input = match (verb, args.as_slice()) {
        ("play", []) => Input::Command(EngineCommand::Play),
        ("stop", []) => Input::Command(EngineCommand::Stop),
        ("tempo", [bpm]) => Input::Command(EngineCommand::SetTempo(number(bpm)?)),
        ("lever", [position]) => Input::Command(EngineCommand::SetTempoLever(number(position)?)),
        ("toggle", [row, col]) => Input::Command(EngineCommand::Toggle {
            row: index(row)?,
            col: index(col)?,
        }),
        ("add", []) => Input::Command(EngineCommand::AddColumns),
        ("reset", []) => Input::Command(EngineCommand::Reset),
        ("select", [name]) => {
            let instrument: Instrument = name.parse().map_err(|e| format!("{e}"))?;
            Input::Command(EngineCommand::SelectInstrument(instrument))
        }
        ("save", [name, path]) => Input::Command(EngineCommand::SaveProject {
            name: name.to_string(),
            path: PathBuf::from(path),
        }),
        ("load", [path]) => Input::Command(EngineCommand::LoadProject(PathBuf::from(path))),
        ("grid", []) => Input::ShowGrid,
        ("instruments", []) => Input::ListInstruments,
        ("help", []) => Input::Help,
        ("quit" | "exit", []) => Input::Quit,
        _ => return Err(format!("unrecognised command: {}", line.trim())),
    };
    Ok(Some(input))
}

fn number(word: &str) -> std::result::Result<f64, String> {
    word.parse().map_err(|_| format!("not a number: {word}"))
}

fn index(word: &str) -> std::result::Result<usize, String> {
    word.parse().map_err(|_| format!("not an index: {word}"))
}

/// Highest pitch on top, one character per cell.
fn render_grid(grid: &Grid) -> String {
    let mut out = String::new();
    for (row, cells) in grid.cells().iter().enumerate().rev() {
        out.push_str(&format!("{row:>3} "));
        out.extend(cells.iter().map(|c| if c.active { '#' } else { '.' }));
        out.push('\n');
    }
    out
}

fn instrument_list() -> String {
    Category::ALL
        .iter()
        .map(|category| {
            let ids: Vec<&str> = category.instruments().iter().map(|i| i.id()).collect();
            format!("{}: {}\n", category.name(), ids.join(", "))
        })
        .collect()
}
