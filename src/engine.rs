use crate::audio::{Instrument, Synth};
use crate::config::Config;
use crate::error::Result;
use crate::grid::Grid;
use crate::pitch::PitchTable;
use crate::project::Project;
use crate::timing::{PlaybackScheduler, PlaybackState, TempoRange};
use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Toggle { row: usize, col: usize },
    AddColumns,
    Reset,
    SelectInstrument(Instrument),
    /// Play/pause toggle.
    Play,
    Stop,
    SetTempo(f64),
    /// A tempo control position in `[0, 1]`, mapped through the tempo range.
    SetTempoLever(f64),
    LoadProject(PathBuf),
    SaveProject { name: String, path: PathBuf },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineUpdate {
    PlaybackState(PlaybackState),
    ColumnPlayed { column: usize },
    CellToggled { row: usize, col: usize, active: bool },
    ColumnsAdded { columns: usize },
    GridCleared,
    InstrumentSelected(Instrument),
    ProjectLoaded { name: String },
    ProjectSaved { path: PathBuf },
    Error { message: String },
}

pub struct EngineHandle {
    pub command_tx: Sender<EngineCommand>,
    pub update_rx: Receiver<EngineUpdate>,
    grid: Arc<ArcSwap<Grid>>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Returns false once the engine thread has exited.
    pub fn send(&self, command: EngineCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }

    /// The grid as of the last mutation.
    pub fn grid(&self) -> Arc<Grid> {
        self.grid.load_full()
    }

    pub fn shutdown(mut self) {
        let _ = self.command_tx.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Starts the engine on its own thread. Configuration errors, including a
/// pitch table that does not match the row count, fail here.
pub fn spawn_engine(config: &Config, synth: Box<dyn Synth + Send>) -> Result<EngineHandle> {
    let engine = Engine::new(config, synth)?;
    let grid = engine.published.clone();

    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();

    let thread = std::thread::Builder::new()
        .name("stepgrid-engine".into())
        .spawn(move || engine_thread(engine, command_rx, update_tx))?;

    info!(
        rows = config.rows,
        columns = config.columns,
        bpm = config.bpm,
        "engine spawned"
    );

    Ok(EngineHandle {
        command_tx,
        update_rx,
        grid,
        thread: Some(thread),
    })
}

/// Owns the grid, the scheduler and the synth. Commands and ticks run one at
/// a time on a single thread, so a tick never observes a half-applied edit.
pub struct Engine {
    grid: Grid,
    pitches: PitchTable,
    scheduler: PlaybackScheduler,
    synth: Box<dyn Synth + Send>,
    current_instrument: Instrument,
    column_increment: usize,
    tempo_range: TempoRange,
    published: Arc<ArcSwap<Grid>>,
}

impl Engine {
    pub fn new(config: &Config, synth: Box<dyn Synth + Send>) -> Result<Self> {
        config.validate()?;
        let pitches = config.pitch_table()?;
        let grid = Grid::new(config.rows, config.columns, config.default_instrument);
        let scheduler = PlaybackScheduler::new(config.bpm)?
            .with_policy(config.tempo_policy)
            .with_note_duration(config.note_duration);

        Ok(Self {
            published: Arc::new(ArcSwap::from_pointee(grid.clone())),
            grid,
            pitches,
            scheduler,
            synth,
            current_instrument: config.default_instrument,
            column_increment: config.column_increment,
            tempo_range: config.tempo_range,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn current_instrument(&self) -> Instrument {
        self.current_instrument
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    pub fn handle(&mut self, command: EngineCommand) -> Result<Vec<EngineUpdate>> {
        debug!(?command, "engine command");
        let updates = match command {
            EngineCommand::Toggle { row, col } => {
                let active = self.grid.toggle(row, col, self.current_instrument)?;
                if active {
                    self.audition(row);
                }
                self.publish();
                vec![EngineUpdate::CellToggled { row, col, active }]
            }
            EngineCommand::AddColumns => {
                self.grid
                    .add_columns(self.column_increment, self.current_instrument);
                self.publish();
                vec![EngineUpdate::ColumnsAdded {
                    columns: self.grid.columns(),
                }]
            }
            EngineCommand::Reset => {
                self.grid.reset();
                self.publish();
                vec![EngineUpdate::GridCleared]
            }
            EngineCommand::SelectInstrument(instrument) => {
                self.current_instrument = instrument;
                vec![EngineUpdate::InstrumentSelected(instrument)]
            }
            EngineCommand::Play => {
                self.scheduler.start();
                vec![self.playback_state()]
            }
            EngineCommand::Stop => {
                self.scheduler.stop();
                vec![self.playback_state()]
            }
            EngineCommand::SetTempo(bpm) => {
                self.scheduler.set_tempo(bpm)?;
                vec![self.playback_state()]
            }
            EngineCommand::SetTempoLever(position) => {
                self.scheduler.set_tempo(self.tempo_range.bpm_at(position))?;
                vec![self.playback_state()]
            }
            EngineCommand::LoadProject(path) => {
                let project = Project::load(&path)?;
                let name = project.name.clone();
                let grid = project.into_grid()?;
                self.pitches.ensure_rows(grid.rows())?;

                self.scheduler.stop();
                self.grid = grid;
                self.publish();
                info!(%name, path = %path.display(), "project loaded");
                vec![
                    EngineUpdate::ProjectLoaded { name },
                    self.playback_state(),
                ]
            }
            EngineCommand::SaveProject { name, path } => {
                Project::new(name, &self.grid).save(&path)?;
                info!(path = %path.display(), "project saved");
                vec![EngineUpdate::ProjectSaved { path }]
            }
            EngineCommand::Shutdown => Vec::new(),
        };
        Ok(updates)
    }

    /// Runs a tick if one is due.
    pub fn poll(&mut self, now: Instant) -> Option<EngineUpdate> {
        self.scheduler
            .poll(now, &self.grid, &self.pitches, self.synth.as_mut())
            .map(|column| EngineUpdate::ColumnPlayed { column })
    }

    fn audition(&mut self, row: usize) {
        if let Some(frequency) = self.pitches.frequency(row) {
            self.synth.play(
                frequency,
                self.current_instrument,
                Some(self.scheduler.note_duration()),
            );
        }
    }

    fn playback_state(&self) -> EngineUpdate {
        EngineUpdate::PlaybackState(self.scheduler.state())
    }

    fn publish(&self) {
        self.published.store(Arc::new(self.grid.clone()));
    }
}

fn engine_thread(
    mut engine: Engine,
    command_rx: Receiver<EngineCommand>,
    update_tx: Sender<EngineUpdate>,
) {
    loop {
        let received = match engine.deadline() {
            Some(deadline) => command_rx.recv_deadline(deadline),
            None => command_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(EngineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(command) => match engine.handle(command) {
                Ok(updates) => {
                    for update in updates {
                        let _ = update_tx.send(update);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "command rejected");
                    let _ = update_tx.send(EngineUpdate::Error {
                        message: e.to_string(),
                    });
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
        }

        if let Some(update) = engine.poll(Instant::now()) {
            let _ = update_tx.send(update);
        }
    }

    engine.scheduler.stop();
    info!("engine stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingSynth;
    use crate::error::Error;
    use std::time::Duration;

    fn small_config() -> Config {
        Config {
            rows: 2,
            columns: 4,
            base_frequency: 220.0,
            bpm: 120.0,
            ..Config::default()
        }
    }

    fn engine() -> (Engine, RecordingSynth) {
        let synth = RecordingSynth::new();
        let engine = Engine::new(&small_config(), Box::new(synth.clone())).unwrap();
        (engine, synth)
    }

    #[test]
    fn test_activating_a_cell_auditions_it() {
        let (mut engine, synth) = engine();
        engine
            .handle(EngineCommand::SelectInstrument(Instrument::Marimba))
            .unwrap();
        let updates = engine
            .handle(EngineCommand::Toggle { row: 1, col: 2 })
            .unwrap();
        assert_eq!(
            updates,
            vec![EngineUpdate::CellToggled {
                row: 1,
                col: 2,
                active: true
            }]
        );

        let triggers = synth.take();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].instrument, Instrument::Marimba);
        assert_eq!(triggers[0].frequency, engine.pitches.frequency(1).unwrap());

        engine
            .handle(EngineCommand::Toggle { row: 1, col: 2 })
            .unwrap();
        assert!(synth.triggers().is_empty());
    }

    #[test]
    fn test_out_of_range_toggle_is_rejected() {
        let (mut engine, synth) = engine();
        let err = engine
            .handle(EngineCommand::Toggle { row: 9, col: 0 })
            .unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { .. }));
        assert_eq!(engine.grid().active_count(), 0);
        assert!(synth.triggers().is_empty());
    }

    #[test]
    fn test_add_columns_uses_selected_instrument() {
        let (mut engine, _) = engine();
        engine
            .handle(EngineCommand::SelectInstrument(Instrument::Strings))
            .unwrap();
        let updates = engine.handle(EngineCommand::AddColumns).unwrap();
        assert_eq!(updates, vec![EngineUpdate::ColumnsAdded { columns: 12 }]);
        assert_eq!(
            engine.grid().get(0, 11).unwrap().instrument,
            Instrument::Strings
        );
        assert_eq!(engine.published.load().columns(), 12);
    }

    #[test]
    fn test_lever_sets_tempo_and_restarts() {
        let (mut engine, _) = engine();
        let updates = engine.handle(EngineCommand::SetTempoLever(0.0)).unwrap();
        assert_eq!(
            updates,
            vec![EngineUpdate::PlaybackState(PlaybackState {
                is_playing: true,
                current_column: 0,
                bpm: 60.0,
            })]
        );
    }

    #[test]
    fn test_extreme_tempo_is_reported_not_fatal() {
        let synth = RecordingSynth::new();
        let handle = spawn_engine(&small_config(), Box::new(synth)).unwrap();
        assert!(handle.send(EngineCommand::SetTempo(1e-300)));
        assert!(handle.send(EngineCommand::SetTempo(90.0)));

        let mut updates = handle.update_rx.iter();
        assert!(matches!(updates.next(), Some(EngineUpdate::Error { .. })));
        assert_eq!(
            updates.next(),
            Some(EngineUpdate::PlaybackState(PlaybackState {
                is_playing: true,
                current_column: 0,
                bpm: 90.0,
            }))
        );
        drop(updates);
        handle.shutdown();
    }

    #[test]
    fn test_play_toggles() {
        let (mut engine, _) = engine();
        engine.handle(EngineCommand::Play).unwrap();
        assert!(engine.scheduler().is_playing());
        assert!(engine.deadline().is_some());
        engine.handle(EngineCommand::Play).unwrap();
        assert!(!engine.scheduler().is_playing());
        assert!(engine.deadline().is_none());
    }

    #[test]
    fn test_poll_plays_due_column() {
        let (mut engine, synth) = engine();
        engine.handle(EngineCommand::Toggle { row: 0, col: 0 }).unwrap();
        synth.take();
        engine.handle(EngineCommand::Play).unwrap();

        let deadline = engine.deadline().unwrap();
        assert_eq!(engine.poll(deadline - Duration::from_millis(1)), None);
        assert_eq!(
            engine.poll(deadline),
            Some(EngineUpdate::ColumnPlayed { column: 0 })
        );
        assert_eq!(synth.triggers().len(), 1);
    }

    #[test]
    fn test_load_project_replaces_grid_and_stops() {
        let (mut engine, _) = engine();
        let mut saved = Grid::new(2, 6, Instrument::Sine);
        saved.toggle(1, 5, Instrument::Bell).unwrap();

        let dir = std::env::temp_dir().join(format!("stepgrid-engine-{}", std::process::id()));
        let path = dir.join("song.ron");
        Project::new("song", &saved).save(&path).unwrap();

        engine.handle(EngineCommand::Play).unwrap();
        let updates = engine
            .handle(EngineCommand::LoadProject(path.clone()))
            .unwrap();
        assert_eq!(
            updates[0],
            EngineUpdate::ProjectLoaded {
                name: "song".into()
            }
        );
        assert!(!engine.scheduler().is_playing());
        assert_eq!(engine.grid(), &saved);

        // A grid with a different row count cannot be mapped to the pitches.
        Project::new("tall", &Grid::new(5, 4, Instrument::Sine))
            .save(&path)
            .unwrap();
        let err = engine.handle(EngineCommand::LoadProject(path)).unwrap_err();
        assert!(matches!(err, Error::PitchTableMismatch { rows: 5, pitches: 2 }));
        assert_eq!(engine.grid(), &saved);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_spawned_engine_ticks() {
        let synth = RecordingSynth::new();
        let config = Config {
            bpm: 3000.0,
            ..small_config()
        };
        let handle = spawn_engine(&config, Box::new(synth.clone())).unwrap();
        assert!(handle.send(EngineCommand::Toggle { row: 0, col: 1 }));
        assert!(handle.send(EngineCommand::Play));

        let mut columns = Vec::new();
        while columns.len() < 5 {
            match handle.update_rx.recv_timeout(Duration::from_secs(2)) {
                Ok(EngineUpdate::ColumnPlayed { column }) => columns.push(column),
                Ok(_) => {}
                Err(e) => panic!("engine went quiet: {e}"),
            }
        }
        assert_eq!(columns, vec![0, 1, 2, 3, 0]);
        assert!(handle.grid().get(0, 1).unwrap().active);

        handle.shutdown();
        // The audition plus at least one scheduled hit on column 1.
        let triggers = synth.triggers();
        assert!(triggers.len() >= 2);
        assert!(triggers.iter().all(|t| t.frequency == 220.0));
    }
}
