use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use client_logging::{client_debug, client_info, client_warn};
use frame_search_core::{update, AppState, Msg, SearchOutcome, Selection, UploadStatus};

use super::effects::EffectRunner;
use super::ui::input::{parse_command, ShellCommand};
use super::ui::render::TerminalRenderer;

/// Upper bound on how long input waits while engine events are pending.
const TICK: Duration = Duration::from_millis(75);

/// Owns the session state and routes messages between input, the pure
/// update function, the engine and the terminal.
pub struct Coordinator<W: Write> {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer<W>,
}

impl<W: Write> Coordinator<W> {
    pub fn new(state: AppState, runner: EffectRunner, renderer: TerminalRenderer<W>) -> Self {
        Self {
            state,
            runner,
            renderer,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        let was_dirty = state.consume_dirty();
        self.state = state;
        if was_dirty {
            self.renderer.render(&self.state.view())?;
        }
        Ok(())
    }

    fn dispatch_all(&mut self, msgs: Vec<Msg>) -> io::Result<()> {
        for msg in msgs {
            self.dispatch(msg)?;
        }
        Ok(())
    }

    /// Applies at most one engine event, waiting up to `timeout` for it.
    fn pump(&mut self, timeout: Duration) -> anyhow::Result<()> {
        let polled = self
            .runner
            .poll(timeout)
            .context("engine stopped while work was outstanding")?;
        self.dispatch(polled.unwrap_or(Msg::Tick))?;
        Ok(())
    }

    /// Runs the engine until no probe, upload, search or download is outstanding.
    pub fn wait_idle(&mut self) -> anyhow::Result<()> {
        while self.state.is_busy() {
            self.pump(TICK)?;
        }
        Ok(())
    }

    /// Interactive loop over stdin. End of input waits for outstanding work.
    pub fn run_shell(&mut self) -> anyhow::Result<()> {
        self.renderer.present_full(&self.state.view())?;
        self.renderer.line("Type `help` for commands.")?;
        let lines = spawn_stdin_reader()?;

        loop {
            match lines.try_recv() {
                Ok(line) => match parse_command(&line) {
                    Ok(ShellCommand::Empty) => {}
                    Ok(ShellCommand::Help) => self.renderer.help()?,
                    Ok(ShellCommand::Status) => self.renderer.present_full(&self.state.view())?,
                    Ok(ShellCommand::Quit) => {
                        if self.state.is_busy() {
                            client_warn!("Quitting with work still outstanding");
                        }
                        break;
                    }
                    Ok(ShellCommand::Dispatch(msgs)) => self.dispatch_all(msgs)?,
                    Err(err) => self.renderer.line(&err.to_string())?,
                },
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    client_debug!("End of input");
                    if self.state.is_busy() {
                        self.renderer.line("Waiting for outstanding work...")?;
                        self.wait_idle()?;
                    }
                    break;
                }
            }
            self.pump(TICK)?;
        }
        Ok(())
    }

    /// Validates and uploads one video. True only when the service accepted it.
    pub fn upload_once(&mut self, video: PathBuf, title: String) -> anyhow::Result<bool> {
        self.dispatch(Msg::TitleChanged(title))?;
        self.dispatch(Msg::MediaPicked(video))?;
        self.wait_idle()?;
        if !matches!(self.state.selection(), Selection::Ready(_)) {
            return Ok(false);
        }

        self.dispatch(Msg::UploadClicked)?;
        self.wait_idle()?;
        let succeeded = matches!(
            self.state.upload_job().map(|job| &job.status),
            Some(UploadStatus::Succeeded { .. })
        );
        Ok(succeeded)
    }

    /// Runs one search, optionally saving the result images. False when the
    /// search did not produce results.
    pub fn search_once(
        &mut self,
        query: String,
        save_dir: Option<PathBuf>,
    ) -> anyhow::Result<bool> {
        self.dispatch(Msg::QueryChanged(query))?;
        self.dispatch(Msg::SearchClicked)?;
        self.wait_idle()?;

        let outcome = self.state.search_outcome().cloned();
        if let (Some(dir), Some(SearchOutcome::Results(frames))) = (save_dir, &outcome) {
            if !frames.is_empty() {
                self.dispatch(Msg::SaveFramesClicked { dir })?;
                self.wait_idle()?;
            }
        }
        Ok(matches!(outcome, Some(SearchOutcome::Results(_))))
    }
}

fn spawn_stdin_reader() -> anyhow::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        client_warn!("Reading stdin failed: {}", err);
                        break;
                    }
                }
            }
            client_info!("Input closed");
        })
        .context("spawning stdin reader")?;
    Ok(rx)
}
