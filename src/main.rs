mod app;
use flashcard_study::config::Config;
use flashcard_study::logging::init_tracing;
use flashcard_study::*;

use anyhow::Context;
use app::StudyApp;

fn main() -> anyhow::Result<()> {
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(&config.logging.level);
    match load_error {
        Some(e) => tracing::warn!(error = ?e, "using default config"),
        None => write_default_config(&config),
    }

    let db_path = config.db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let mut store = Store::open(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    if store.list_sets()?.is_empty() {
        let mut sample = SetDraft::new("Polish Vocabulary", "language");
        sample.add_card("cześć", "hello", "Cześć, jak się masz?");
        sample.add_card("dziękuję", "thank you", "");
        sample.add_card("proszę", "please", "");
        store.create_set(&sample)?;
        tracing::info!("sample data created");
    }

    let sets = store.list_sets()?;
    tracing::info!(count = sets.len(), "loaded sets from database");
    for set in &sets {
        tracing::debug!(set = %set.name, cards = set.total_cards, "set available");
    }

    let engine = StudyEngine::new(store, config.study.deck_policy);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([600.0, 700.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flashcards",
        options,
        Box::new(|_cc| Ok(Box::new(StudyApp::new(engine)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the UI: {e}"))
}

/// Leaves a config file to edit on first run.
fn write_default_config(config: &Config) {
    let Some(path) = Config::config_path() else {
        return;
    };
    if path.exists() {
        return;
    }
    match config.save() {
        Ok(()) => tracing::info!(path = %path.display(), "wrote default config"),
        Err(e) => tracing::warn!(error = ?e, "could not write default config"),
    }
}
