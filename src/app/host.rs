use image::Rgba;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info};

use crate::{
    app::{
        events::RunObserver,
        options::CloudOptions,
        run::{Run, RunSummary},
        targets::{CloudError, TargetSet},
    },
    domain::word::WordItem,
    engine::{grid::OccupancyGrid, placement::PlacementEngine},
    render::{color::parse_css_color, font::TextBackend},
};

/// Point-in-time view of a cloud's surfaces and progress.
#[derive(Debug, Clone)]
pub struct CloudSnapshot {
    pub targets: TargetSet,
    pub grid: OccupancyGrid,
    /// Id and progress of the run still ticking, if any.
    pub active: Option<(u64, RunSummary)>,
    pub runs_started: u64,
}

enum Command {
    Start(Vec<WordItem>),
    Stop,
    Resize { width: u32, height: u32 },
    Snapshot(oneshot::Sender<CloudSnapshot>),
    Shutdown(oneshot::Sender<TargetSet>),
}

/// Handle to a word cloud driven by its own tokio task. All placement happens
/// on that task, one word per tick, so callers never block on a run.
#[derive(Debug)]
pub struct WordCloud {
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl WordCloud {
    /// Spawns the driver task. Must be called inside a tokio runtime.
    pub fn spawn(
        targets: TargetSet,
        options: CloudOptions,
        backend: Box<dyn TextBackend>,
        observer: Box<dyn RunObserver>,
    ) -> Result<Self, CloudError> {
        if targets.canvas.is_none() && targets.container.is_none() {
            return Err(CloudError::NoTarget);
        }
        let options = options.validated()?;
        let host = Host {
            engine: PlacementEngine::new(backend, options),
            targets,
            observer,
            active: None,
            last_words: Vec::new(),
            next_id: 0,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(host, rx));
        Ok(Self { tx, task })
    }

    /// Starts a run over `words`, silently cancelling any run in flight.
    pub fn start(&self, words: Vec<WordItem>) -> Result<(), CloudError> {
        self.send(Command::Start(words))
    }

    /// Cancels the pending tick; calling it again, or after completion, does nothing.
    pub fn stop(&self) -> Result<(), CloudError> {
        self.send(Command::Stop)
    }

    /// Stops the current run, resizes every surface, repaints the canvas and
    /// restarts with the last list.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), CloudError> {
        self.send(Command::Resize { width, height })
    }

    pub async fn snapshot(&self) -> Result<CloudSnapshot, CloudError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| CloudError::Closed)
    }

    /// Stops the driver and hands the surfaces back.
    pub async fn shutdown(self) -> Result<TargetSet, CloudError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown(reply))?;
        let targets = rx.await.map_err(|_| CloudError::Closed)?;
        let _ = self.task.await;
        Ok(targets)
    }

    fn send(&self, command: Command) -> Result<(), CloudError> {
        self.tx.send(command).map_err(|_| CloudError::Closed)
    }
}

struct ActiveRun {
    run: Run,
    /// `None` ticks at the next yield point.
    deadline: Option<Instant>,
}

struct Host {
    engine: PlacementEngine,
    targets: TargetSet,
    observer: Box<dyn RunObserver>,
    active: Option<ActiveRun>,
    last_words: Vec<WordItem>,
    next_id: u64,
}

impl Host {
    fn schedule(&self) -> Option<Instant> {
        let wait = self.engine.options().wait;
        (!wait.is_zero()).then(|| Instant::now() + wait)
    }

    fn start(&mut self, words: Vec<WordItem>) {
        if let Some(previous) = self.active.take() {
            debug!(run = previous.run.id(), "superseded by a new start");
        }
        self.next_id += 1;
        self.last_words.clone_from(&words);
        let run = Run::begin(
            self.next_id,
            words,
            &mut self.engine,
            &mut self.targets,
            self.observer.as_mut(),
        );
        let deadline = self.schedule();
        self.active = run.map(|run| ActiveRun { run, deadline });
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            info!(run = active.run.id(), index = active.run.index(), "run stopped");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.stop();
        self.targets.resize(width, height);
        if let Some(canvas) = self.targets.canvas.as_mut() {
            let options = self.engine.options();
            match &options.repaint {
                Some(repaint) => repaint(canvas),
                None => canvas.fill(
                    parse_css_color(&options.background_color).unwrap_or(Rgba([255; 4])),
                ),
            }
        }
        debug!(width, height, "targets resized");
        if !self.last_words.is_empty() {
            self.start(self.last_words.clone());
        }
    }

    fn tick(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let outcome = active
            .run
            .step(&mut self.engine, &mut self.targets, self.observer.as_mut());
        if outcome.is_terminal() {
            self.active = None;
        } else {
            let wait = self.engine.options().wait;
            active.deadline = (!wait.is_zero()).then(|| Instant::now() + wait);
        }
    }

    fn snapshot(&self) -> CloudSnapshot {
        CloudSnapshot {
            targets: self.targets.clone(),
            grid: self.engine.grid().clone(),
            active: self
                .active
                .as_ref()
                .map(|a| (a.run.id(), a.run.summary())),
            runs_started: self.next_id,
        }
    }
}

async fn drive(mut host: Host, mut rx: mpsc::UnboundedReceiver<Command>) {
    loop {
        let pending = host.active.as_ref().map(|a| a.deadline);
        tokio::select! {
            biased;
            command = rx.recv() => match command {
                Some(Command::Start(words)) => host.start(words),
                Some(Command::Stop) => host.stop(),
                Some(Command::Resize { width, height }) => host.resize(width, height),
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(host.snapshot());
                }
                Some(Command::Shutdown(reply)) => {
                    host.stop();
                    let _ = reply.send(std::mem::take(&mut host.targets));
                    break;
                }
                None => break,
            },
            () = next_tick(pending.flatten()), if pending.is_some() => host.tick(),
        }
    }
    debug!("word cloud driver exited");
}

async fn next_tick(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => tokio::task::yield_now().await,
    }
}
