pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod mask;
pub mod render;

use std::{fs, io, sync::Arc};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use app::{
    events::{ChannelObserver, RunNotice},
    host::WordCloud,
    options::{CanvasPainter, CloudOptions, load_options_file},
    targets::{Target, TargetSet},
};
use cli::{Cli, OutputArg};
use domain::word::load_word_list;
use mask::{
    apply::apply_mask,
    text_mask::{TextMaskOptions, create_text_mask},
};
use render::{canvas::Canvas, color::parse_css_color, elements::ElementContainer, font::BitmapFont};

const MASK_LINE_HEIGHT: f32 = 1.2;

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose);
    cli.validate()?;

    let words = load_word_list(&cli.words)?;
    let options = resolve_options(&cli)?;
    let targets = build_targets(&cli, &options)?;
    info!(
        words = words.len(),
        width = cli.width,
        height = cli.height,
        grid_size = options.grid_size,
        "rendering word cloud"
    );

    let (observer, mut notices) = ChannelObserver::new();
    let cloud = WordCloud::spawn(targets, options, Box::new(BitmapFont), Box::new(observer))?;
    cloud.start(words)?;
    let tally = wait_for_stop(&cloud, &mut notices, tokio::signal::ctrl_c).await?;
    let targets = cloud.shutdown().await?;

    write_outputs(&cli, targets)?;
    info!(
        processed = tally.processed,
        drawn = tally.drawn,
        aborted = tally.aborted,
        "word cloud finished"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Defaults, then the options file, then CLI flags.
pub fn resolve_options(cli: &Cli) -> Result<CloudOptions> {
    let mut options = CloudOptions::default();
    if let Some(path) = &cli.config {
        let file = load_options_file(path)?;
        options = options
            .merge_file(file)
            .with_context(|| format!("invalid options in {}", path.display()))?;
    }
    let mut options = options.apply_cli(cli)?;
    options.repaint = text_mask_painter(cli, &options)?;
    Ok(options)
}

/// Paints the `--mask-text` silhouette at whatever size the canvas has.
fn text_mask_painter(cli: &Cli, options: &CloudOptions) -> Result<Option<CanvasPainter>> {
    let Some(text) = cli.mask_text.clone() else {
        return Ok(None);
    };
    let background = parse_css_color(&options.background_color)?;
    let template = TextMaskOptions {
        font_weight: options.font_weight.resolve(&text, 0.0, cli.mask_font_size),
        font_size: cli.mask_font_size,
        font_family: options.font_family.clone(),
        width: cli.width,
        height: cli.height,
        line_height: cli.mask_font_size * MASK_LINE_HEIGHT,
    };
    let painter: CanvasPainter = Arc::new(move |canvas: &mut Canvas| {
        let mask_options = TextMaskOptions {
            width: canvas.width(),
            height: canvas.height(),
            ..template.clone()
        };
        let mask = create_text_mask(&text, &mask_options, &BitmapFont);
        apply_mask(canvas, &mask, background);
        debug!(text = %text, width = mask_options.width, height = mask_options.height, "applied text mask");
    });
    Ok(Some(painter))
}

pub fn build_targets(cli: &Cli, options: &CloudOptions) -> Result<TargetSet> {
    let mut targets = Vec::new();
    if cli.output != OutputArg::Elements {
        let mut canvas = Canvas::new(cli.width, cli.height);
        if let Some(repaint) = &options.repaint {
            repaint(&mut canvas);
        }
        targets.push(Target::Canvas(canvas));
    }
    if cli.output != OutputArg::Canvas {
        targets.push(Target::Container(ElementContainer::new(cli.width, cli.height)));
    }
    Ok(TargetSet::new(targets)?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub processed: usize,
    pub drawn: usize,
    pub aborted: bool,
}

/// Collects notices until the run stops, or stops it when `interrupt` fires.
async fn wait_for_stop<S, F>(
    cloud: &WordCloud,
    notices: &mut mpsc::UnboundedReceiver<RunNotice>,
    mut interrupt: S,
) -> Result<Tally>
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
{
    let mut tally = Tally::default();
    let mut interruptible = true;
    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(RunNotice::Started) => debug!("run started"),
                Some(RunNotice::WordProcessed { item, drawn }) => {
                    tally.processed += 1;
                    if drawn {
                        tally.drawn += 1;
                    } else {
                        debug!(word = %item.text, weight = item.weight, "word not drawn");
                    }
                }
                Some(RunNotice::Aborted) => tally.aborted = true,
                Some(RunNotice::Stopped) | None => break,
            },
            signal = interrupt(), if interruptible => match signal {
                Ok(()) => {
                    warn!("interrupted, keeping the words placed so far");
                    cloud.stop()?;
                    break;
                }
                Err(err) => {
                    warn!(%err, "no interrupt handler, running to completion");
                    interruptible = false;
                }
            },
        }
    }
    Ok(tally)
}

fn write_outputs(cli: &Cli, targets: TargetSet) -> Result<()> {
    if let Some(canvas) = &targets.canvas {
        canvas.save_png(&cli.out)?;
        info!(path = %cli.out.display(), "wrote canvas");
    }
    if let (Some(container), Some(path)) = (&targets.container, &cli.elements) {
        let json = container.to_json().context("serializing elements failed")?;
        fs::write(path, json)
            .with_context(|| format!("writing elements to {} failed", path.display()))?;
        info!(path = %path.display(), elements = container.elements.len(), "wrote elements");
    }
    Ok(())
}
