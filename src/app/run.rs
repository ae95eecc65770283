use tracing::{debug, info, warn};

use crate::{
    app::{
        events::{RunEvent, RunObserver},
        targets::TargetSet,
    },
    domain::word::WordItem,
    engine::{budget::TimeBudget, placement::PlacementEngine},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A word was handled and more may follow.
    Processed { index: usize, drawn: bool },
    /// The list is exhausted; `Stopped` was emitted.
    Completed,
    /// The run halted early; `Aborted` and `Stopped` were emitted.
    Aborted { budget_exceeded: bool },
    /// Nothing left to do; no events.
    Finished,
}

impl StepOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processed { .. })
    }
}

/// Counters a run accumulates for its caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub drawn: usize,
}

/// One pass over a word list. Each [`step`](Self::step) handles exactly one
/// entry so the driver can yield between words.
#[derive(Debug)]
pub struct Run {
    id: u64,
    words: Vec<WordItem>,
    index: usize,
    budget: TimeBudget,
    finished: bool,
    summary: RunSummary,
}

impl Run {
    /// Emits `Started`, then sizes and seeds the grid. Returns `None` when the
    /// backend cannot render or the observer cancels the start; targets are
    /// left untouched in both cases.
    pub fn begin(
        id: u64,
        words: Vec<WordItem>,
        engine: &mut PlacementEngine,
        targets: &mut TargetSet,
        observer: &mut dyn RunObserver,
    ) -> Option<Self> {
        if !engine.is_supported() {
            debug!(run = id, "text backend unsupported, run ignored");
            return None;
        }
        if observer.on_event(&RunEvent::Started).is_cancel() {
            debug!(run = id, "start cancelled by observer");
            return None;
        }
        engine.prepare(targets);
        let budget = TimeBudget::new(engine.options().abort_threshold);
        info!(run = id, words = words.len(), "run started");
        Some(Self {
            id,
            words,
            index: 0,
            budget,
            finished: false,
            summary: RunSummary::default(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &[WordItem] {
        &self.words
    }

    pub fn into_words(self) -> Vec<WordItem> {
        self.words
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn step(
        &mut self,
        engine: &mut PlacementEngine,
        targets: &mut TargetSet,
        observer: &mut dyn RunObserver,
    ) -> StepOutcome {
        if self.finished {
            return StepOutcome::Finished;
        }
        let Some(item) = self.words.get_mut(self.index) else {
            self.finished = true;
            observer.on_event(&RunEvent::Stopped);
            info!(
                run = self.id,
                processed = self.summary.processed,
                drawn = self.summary.drawn,
                "run completed"
            );
            return StepOutcome::Completed;
        };

        self.budget.restart();
        let drawn = engine.put_word(item, targets, &self.budget).is_some();
        self.summary.processed += 1;
        if drawn {
            self.summary.drawn += 1;
        }
        let cancelled = observer
            .on_event(&RunEvent::WordProcessed { item, drawn })
            .is_cancel();

        let budget_exceeded = self.budget.exceeded();
        if budget_exceeded || cancelled {
            self.finished = true;
            if budget_exceeded {
                warn!(
                    run = self.id,
                    index = self.index,
                    elapsed_ms = self.budget.elapsed().as_millis(),
                    "word exceeded the time budget, aborting run"
                );
                if let Some(abort) = &engine.options().abort {
                    abort();
                }
            } else {
                info!(run = self.id, index = self.index, "run cancelled by observer");
            }
            observer.on_event(&RunEvent::Aborted);
            observer.on_event(&RunEvent::Stopped);
            return StepOutcome::Aborted { budget_exceeded };
        }

        let index = self.index;
        self.index += 1;
        StepOutcome::Processed { index, drawn }
    }

    /// Steps until a terminal outcome.
    pub fn run_to_end(
        &mut self,
        engine: &mut PlacementEngine,
        targets: &mut TargetSet,
        observer: &mut dyn RunObserver,
    ) -> StepOutcome {
        loop {
            let outcome = self.step(engine, targets, observer);
            if outcome.is_terminal() {
                return outcome;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        app::{
            events::{EventResponse, NoopObserver},
            options::CloudOptions,
            targets::Target,
        },
        render::{
            canvas::{AlphaBuffer, Canvas},
            color::WordColor,
            font::{BitmapFont, FontSpec, TextBackend},
        },
    };

    struct Unsupported;

    impl TextBackend for Unsupported {
        fn is_supported(&self) -> bool {
            false
        }

        fn measure_width(&self, _text: &str, _font: &FontSpec<'_>) -> f32 {
            0.0
        }

        fn fill_text(&self, _: &mut AlphaBuffer, _: &str, _: f32, _: f32, _: &FontSpec<'_>) {}
    }

    fn setup(options: CloudOptions) -> (PlacementEngine, TargetSet) {
        let engine = PlacementEngine::new(Box::new(BitmapFont), options);
        let targets = TargetSet::new([Target::Canvas(Canvas::new(100, 100))]).expect("targets");
        (engine, targets)
    }

    fn words() -> Vec<WordItem> {
        vec![WordItem::new("alpha", 12.0), WordItem::new("beta", 10.0)]
    }

    fn fixed() -> CloudOptions {
        CloudOptions {
            color: WordColor::Fixed("#333".to_string()),
            ..CloudOptions::default()
        }
    }

    #[test]
    fn steps_one_word_at_a_time_then_completes() {
        let (mut engine, mut targets) = setup(fixed());
        let mut observer = NoopObserver;
        let mut run = Run::begin(1, words(), &mut engine, &mut targets, &mut observer).expect("run");
        assert_eq!(
            run.step(&mut engine, &mut targets, &mut observer),
            StepOutcome::Processed {
                index: 0,
                drawn: true
            }
        );
        assert_eq!(
            run.step(&mut engine, &mut targets, &mut observer),
            StepOutcome::Processed {
                index: 1,
                drawn: true
            }
        );
        assert_eq!(
            run.step(&mut engine, &mut targets, &mut observer),
            StepOutcome::Completed
        );
        assert_eq!(
            run.step(&mut engine, &mut targets, &mut observer),
            StepOutcome::Finished
        );
        assert_eq!(run.summary(), RunSummary { processed: 2, drawn: 2 });
    }

    #[test]
    fn cancelled_start_leaves_targets_alone() {
        let (mut engine, mut targets) = setup(fixed());
        let before = targets.clone();
        let mut observer = |_: &RunEvent<'_>| EventResponse::Cancel;
        assert!(Run::begin(1, words(), &mut engine, &mut targets, &mut observer).is_none());
        assert_eq!(targets, before);
    }

    #[test]
    fn unsupported_backend_is_inert() {
        let mut engine = PlacementEngine::new(Box::new(Unsupported), fixed());
        let mut targets = TargetSet::new([Target::Canvas(Canvas::new(10, 10))]).expect("targets");
        let mut events = 0;
        let mut observer = |_: &RunEvent<'_>| {
            events += 1;
            EventResponse::Continue
        };
        assert!(Run::begin(1, words(), &mut engine, &mut targets, &mut observer).is_none());
        assert_eq!(events, 0);
    }

    #[test]
    fn observer_cancel_halts_without_abort_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (mut engine, mut targets) = setup(CloudOptions {
            abort: Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            ..fixed()
        });
        let mut log = Vec::new();
        let mut observer = |event: &RunEvent<'_>| {
            log.push(format!("{event:?}").split([' ', '{']).next().unwrap_or_default().to_string());
            if matches!(event, RunEvent::WordProcessed { .. }) {
                EventResponse::Cancel
            } else {
                EventResponse::Continue
            }
        };
        let mut run = Run::begin(1, words(), &mut engine, &mut targets, &mut observer).expect("run");
        let outcome = run.run_to_end(&mut engine, &mut targets, &mut observer);
        assert_eq!(outcome, StepOutcome::Aborted { budget_exceeded: false });
        assert_eq!(run.index(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(observer);
        assert_eq!(log, ["Started", "WordProcessed", "Aborted", "Stopped"]);
    }

    #[test]
    fn exceeded_budget_aborts_with_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let slow = Arc::new(|_: f32| {
            std::thread::sleep(std::time::Duration::from_millis(30));
            20.0
        });
        let (mut engine, mut targets) = setup(CloudOptions {
            weight_scale: crate::app::options::WeightScale::Custom(slow),
            abort_threshold: Some(std::time::Duration::from_millis(5)),
            abort: Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
            ..fixed()
        });
        let mut observer = NoopObserver;
        let mut run = Run::begin(1, words(), &mut engine, &mut targets, &mut observer).expect("run");
        let outcome = run.step(&mut engine, &mut targets, &mut observer);
        assert_eq!(outcome, StepOutcome::Aborted { budget_exceeded: true });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            run.step(&mut engine, &mut targets, &mut observer),
            StepOutcome::Finished
        );
    }
}
