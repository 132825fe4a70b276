use anyhow::{ensure, Context, Result};
use log::info;

use grabcut_rs::{Annotator, Config, GrabCut, MinifbFrontend};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::new();
    config.validate()?;
    ensure!(
        config.folder.is_dir(),
        "Input folder does not exist: {}",
        config.folder.display()
    );

    let segmenter = GrabCut::new(config.iterations);
    info!(
        "annotating {} ({} segmentation iteration(s) per 'n')",
        config.folder.display(),
        segmenter.iterations()
    );

    let mut frontend = MinifbFrontend::new();
    let mut annotator = Annotator::new(segmenter, config);
    let summary = annotator
        .process_directory(&mut frontend)
        .context("Annotation run failed")?;

    info!(
        "saved {}, skipped {}, left unsaved {}",
        summary.saved, summary.skipped, summary.abandoned
    );
    Ok(())
}
