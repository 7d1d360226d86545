//! Main application UI.
//! Renders the set library, the set editor and study sessions. Every study
//! action is forwarded to the engine through a session handle.

use eframe::egui;
use flashcard_study::database::LibraryStats;
use flashcard_study::export::json::{export_set_to_path, import_set_from_path};
use flashcard_study::models::{Flashcard, FlashcardSet, SetDraft, StudySessionRecord};
use flashcard_study::{SessionHandle, SessionState, Store, StudyEngine, Summary};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Study,
    Results,
}

/// Main application state
pub struct StudyApp {
    engine: StudyEngine<Store>,
    show_confirmation_dialog: bool,
    allowed_to_close: bool,

    sets: Vec<FlashcardSet>,
    selected_set_index: Option<usize>,
    selected_cards: Vec<Flashcard>,
    history: Vec<StudySessionRecord>,
    library_stats: LibraryStats,

    new_set_name: String,
    new_set_tags: String,
    draft: Option<SetDraft>,
    current_word: String,
    current_definition: String,
    current_example: String,

    current_screen: AppScreen,
    session: Option<SessionHandle>,
    show_quit_session_dialog: bool,
    session_warnings: Vec<String>,
    summary: Option<Summary>,

    show_export_dialog: bool,
    show_message_dialog: bool,
    message: String,
}

impl eframe::App for StudyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Study => self.render_study_screen(ctx),
            AppScreen::Results => self.render_results_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) {
            if !self.allowed_to_close {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                self.show_confirmation_dialog = true;
            }
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            // An unfinished session is still recorded with what was judged.
                            self.end_session_early();
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            self.render_export_dialog(ctx);
        }

        if self.show_message_dialog {
            egui::Window::new("Flashcards")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_message_dialog = false;
                    }
                });
        }
    }
}

impl StudyApp {
    pub fn new(engine: StudyEngine<Store>) -> Self {
        let mut app = Self {
            engine,
            show_confirmation_dialog: false,
            allowed_to_close: false,
            sets: Vec::new(),
            selected_set_index: None,
            selected_cards: Vec::new(),
            history: Vec::new(),
            library_stats: LibraryStats::default(),
            new_set_name: String::new(),
            new_set_tags: String::new(),
            draft: None,
            current_word: String::new(),
            current_definition: String::new(),
            current_example: String::new(),
            current_screen: AppScreen::Main,
            session: None,
            show_quit_session_dialog: false,
            session_warnings: Vec::new(),
            summary: None,
            show_export_dialog: false,
            show_message_dialog: false,
            message: String::new(),
        };
        app.refresh_library();
        if !app.sets.is_empty() {
            app.select_set(0);
        }
        app
    }

    fn show_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.show_message_dialog = true;
    }

    /// Reloads sets and totals from the store
    fn refresh_library(&mut self) {
        let store = self.engine.store();
        match store.list_sets().and_then(|sets| Ok((sets, store.library_stats()?))) {
            Ok((sets, stats)) => {
                self.sets = sets;
                self.library_stats = stats;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load sets");
                self.show_message(format!("Failed to load sets: {}", e));
            }
        }
        match self.selected_set_index {
            Some(i) if i < self.sets.len() => self.select_set(i),
            _ => {
                self.selected_set_index = None;
                self.selected_cards.clear();
                self.history.clear();
            }
        }
    }

    /// Loads the cards and recent sessions shown for the selected set
    fn select_set(&mut self, index: usize) {
        self.selected_set_index = Some(index);
        let Some(name) = self.sets.get(index).map(|set| set.name.clone()) else {
            return;
        };
        let store = self.engine.store();
        match store
            .cards_in_set(&name)
            .and_then(|cards| Ok((cards, store.session_history(&name)?)))
        {
            Ok((cards, history)) => {
                self.selected_cards = cards;
                self.history = history;
            }
            Err(e) => {
                tracing::error!(set = %name, error = %e, "failed to load set details");
                self.selected_cards.clear();
                self.history.clear();
                self.show_message(format!("Failed to load set '{}': {}", name, e));
            }
        }
    }

    /// Renders the library screen: statistics, sets, set editor and import/export
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Total Sets: {}", self.library_stats.total_sets));
                ui.separator();
                ui.label(format!("Total Cards: {}", self.library_stats.total_cards));
                if ui.button("Refresh Statistics").clicked() {
                    self.refresh_library();
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Set").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Set").clicked() {
                    self.handle_import();
                }
            });

            ui.separator();

            self.render_set_editor(ui);

            ui.separator();

            ui.heading(format!("Sets ({})", self.sets.len()));

            // We store actions to execute after UI rendering to avoid borrowing conflicts
            let mut action_select: Option<usize> = None;
            let mut action_study: Option<usize> = None;

            egui::ScrollArea::vertical()
                .id_source("sets_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, set) in self.sets.iter().enumerate() {
                        let is_selected = self.selected_set_index == Some(i);

                        ui.horizontal(|ui| {
                            let label = format!(
                                "{} ({} cards) {} · {}",
                                set.name,
                                set.total_cards,
                                set.created_at.format("%Y-%m-%d"),
                                set.tags.as_deref().unwrap_or("No Tags")
                            );
                            if ui.selectable_label(is_selected, label).clicked() {
                                action_select = Some(i);
                            }

                            if ui.button("Study").clicked() {
                                action_study = Some(i);
                            }
                        });
                    }
                });

            if let Some(i) = action_select {
                self.select_set(i);
            }
            if let Some(i) = action_study {
                self.start_study_session(i);
            }

            ui.separator();

            self.render_selected_set(ui);
        });
    }

    /// Two-step set creation: name the set, add cards, then finalize
    fn render_set_editor(&mut self, ui: &mut egui::Ui) {
        ui.heading("Create New Flashcard Set");

        let mut action_finalize = false;
        let mut action_discard = false;

        if self.draft.is_none() {
            ui.horizontal(|ui| {
                ui.label("Set Name:");
                ui.text_edit_singleline(&mut self.new_set_name);
                ui.label("Tags:");
                ui.text_edit_singleline(&mut self.new_set_tags);
            });
            if ui.button("Create Set").clicked() {
                let draft = SetDraft::new(&self.new_set_name, &self.new_set_tags);
                if draft.name.is_empty() {
                    self.message = "Set name is required!".to_string();
                    self.show_message_dialog = true;
                } else if self.sets.iter().any(|s| s.name == draft.name) {
                    self.message = format!("A set named \"{}\" already exists!", draft.name);
                    self.show_message_dialog = true;
                } else {
                    self.draft = Some(draft);
                }
            }
        } else if let Some(draft) = &mut self.draft {
            ui.label(format!("Adding cards to \"{}\"", draft.name));
            ui.horizontal(|ui| {
                ui.label("Word/Term:");
                ui.text_edit_singleline(&mut self.current_word);
            });
            ui.horizontal(|ui| {
                ui.label("Definition:");
                ui.text_edit_singleline(&mut self.current_definition);
            });
            ui.horizontal(|ui| {
                ui.label("Example (Optional):");
                ui.text_edit_singleline(&mut self.current_example);
            });

            ui.horizontal(|ui| {
                if ui.button("Add Card").clicked() {
                    if draft.add_card(
                        &self.current_word,
                        &self.current_definition,
                        &self.current_example,
                    ) {
                        self.current_word.clear();
                        self.current_definition.clear();
                        self.current_example.clear();
                    } else {
                        self.message = "Word and Definition are required!".to_string();
                        self.show_message_dialog = true;
                    }
                }
                if ui.button("Finalize Set").clicked() {
                    action_finalize = true;
                }
                if ui.button("Discard").clicked() {
                    action_discard = true;
                }
            });

            egui::ScrollArea::vertical()
                .id_source("draft_cards")
                .max_height(100.0)
                .show(ui, |ui| {
                    for card in &draft.cards {
                        match &card.example {
                            Some(example) => ui.label(format!(
                                "Word: {} | Definition: {} | Example: {}",
                                card.word, card.definition, example
                            )),
                            None => ui.label(format!(
                                "Word: {} | Definition: {}",
                                card.word, card.definition
                            )),
                        };
                    }
                });
        }

        if action_finalize {
            self.finalize_set();
        }
        if action_discard {
            self.draft = None;
        }
    }

    fn finalize_set(&mut self) {
        let Some(draft) = self.draft.take() else {
            return;
        };
        match self.engine.store_mut().create_set(&draft) {
            Ok(set) => {
                self.new_set_name.clear();
                self.new_set_tags.clear();
                self.show_message(format!(
                    "Set \"{}\" created with {} cards!",
                    set.name, set.total_cards
                ));
                self.refresh_library();
            }
            Err(e) => {
                self.show_message(format!("Failed to save set: {}", e));
                // Keep the cards so the user can fix the problem
                self.draft = Some(draft);
            }
        }
    }

    /// Cards of the selected set with their mastery, plus past sessions
    fn render_selected_set(&mut self, ui: &mut egui::Ui) {
        let Some(set) = self.selected_set_index.and_then(|i| self.sets.get(i)) else {
            ui.label("Select a set to see its cards");
            return;
        };

        ui.heading(format!("Selected Set: {}", set.name));

        egui::ScrollArea::vertical()
            .id_source("cards_list")
            .max_height(200.0)
            .show(ui, |ui| {
                for (i, card) in self.selected_cards.iter().enumerate() {
                    ui.group(|ui| {
                        ui.label(format!("{}. {}: {}", i + 1, card.word, card.definition));
                        ui.label(format!(
                            "   Mastery: {:.0}% ({} of {} reviews correct)",
                            card.stats.mastery_score * 100.0,
                            card.stats.correct_count,
                            card.stats.review_count
                        ));
                    });
                }
            });

        if !self.history.is_empty() {
            ui.label("Recent sessions:");
            for record in self.history.iter().take(5) {
                ui.label(format!(
                    "{}: {} studied, {} known, {} to practice",
                    record.study_date.format("%Y-%m-%d %H:%M"),
                    record.total_cards,
                    record.known_cards,
                    record.practice_cards
                ));
            }
        }
    }

    /// Renders the study screen for the running session
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        let Some(handle) = self.session else {
            self.current_screen = AppScreen::Main;
            return;
        };
        let view = match self.engine.current_view(handle) {
            Ok(view) => view,
            Err(e) => {
                tracing::error!(error = %e, "lost track of the study session");
                self.session = None;
                self.current_screen = AppScreen::Main;
                return;
            }
        };

        let mut action_flip = false;
        let mut action_judge: Option<bool> = None;
        let mut action_quit = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(format!(
                "{} cards left · {} known · {} to practice",
                view.remaining, view.known, view.practice
            ));

            ui.add_space(20.0);

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    let size = if view.state == SessionState::Front { 20.0 } else { 16.0 };
                    ui.label(egui::RichText::new(&view.display_text).size(size));
                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            let on_front = view.state == SessionState::Front;
            let on_back = view.state == SessionState::Back;
            ui.horizontal(|ui| {
                if ui.add_enabled(on_front, egui::Button::new("Flip Card")).clicked() {
                    action_flip = true;
                }
                if ui.add_enabled(on_back, egui::Button::new("Know It")).clicked() {
                    action_judge = Some(true);
                }
                if ui.add_enabled(on_back, egui::Button::new("Need Practice")).clicked() {
                    action_judge = Some(false);
                }
            });

            for warning in &self.session_warnings {
                ui.colored_label(egui::Color32::YELLOW, warning);
            }

            ui.add_space(20.0);

            if ui.button("End Session").clicked() {
                action_quit = true;
            }
        });

        if action_quit {
            self.show_quit_session_dialog = true;
        }

        if self.show_quit_session_dialog {
            egui::Window::new("Quit Study")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Are you sure you want to end the study session?");
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_quit_session_dialog = false;
                        }
                        if ui.button("Yes").clicked() {
                            self.show_quit_session_dialog = false;
                            self.end_session_early();
                        }
                    });
                });
        }

        // Execute deferred actions
        if action_flip {
            if let Err(e) = self.engine.flip(handle) {
                tracing::warn!(error = %e, "flip rejected");
            }
        }
        if let Some(known) = action_judge {
            self.judge_current_card(handle, known);
        }
    }

    fn judge_current_card(&mut self, handle: SessionHandle, known: bool) {
        match self.engine.judge(handle, known) {
            Ok(judged) => {
                if let Some(warning) = judged.warning {
                    self.session_warnings.push(format!("Statistics not saved: {}", warning));
                }
                if let Some(end) = judged.end {
                    if let Some(warning) = end.warning {
                        self.session_warnings.push(format!("Session not saved: {}", warning));
                    }
                    self.engine.close(handle);
                    self.show_results(end.summary);
                }
            }
            Err(e) => tracing::warn!(error = %e, "judgment rejected"),
        }
    }

    fn end_session_early(&mut self) {
        let Some(handle) = self.session else {
            return;
        };
        match self.engine.quit(handle) {
            Ok(end) => {
                if let Some(warning) = end.warning {
                    self.session_warnings.push(format!("Session not saved: {}", warning));
                }
                self.show_results(end.summary);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not end session");
                self.engine.close(handle);
                self.session = None;
                self.current_screen = AppScreen::Main;
            }
        }
    }

    fn show_results(&mut self, summary: Summary) {
        self.session = None;
        self.summary = Some(summary);
        self.current_screen = AppScreen::Results;
        self.refresh_library();
    }

    /// Renders the results of the last session
    fn render_results_screen(&mut self, ctx: &egui::Context) {
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(summary) = &self.summary else {
                action_back = true;
                return;
            };

            ui.heading(format!("Study Session Summary for Set: {}", summary.set_name));
            if summary.ended_early {
                ui.label("Session ended early.");
            }
            ui.add_space(10.0);

            for line in summary_lines(summary) {
                ui.label(line);
            }

            for warning in &self.session_warnings {
                ui.colored_label(egui::Color32::YELLOW, warning);
            }

            ui.separator();
            ui.label("Known Cards:");
            egui::ScrollArea::vertical()
                .id_source("known_cards")
                .max_height(150.0)
                .show(ui, |ui| {
                    for card in &summary.known {
                        ui.label(format!("Word: {} | Definition: {}", card.word, card.definition));
                    }
                });

            ui.separator();
            ui.label("Cards Needing Practice:");
            egui::ScrollArea::vertical()
                .id_source("practice_cards")
                .max_height(150.0)
                .show(ui, |ui| {
                    for card in &summary.practice {
                        ui.label(format!("Word: {} | Definition: {}", card.word, card.definition));
                    }
                });

            ui.add_space(20.0);
            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }
        });

        if action_back {
            self.summary = None;
            self.session_warnings.clear();
            self.current_screen = AppScreen::Main;
        }
    }

    /// Starts a study session over every card of the set
    fn start_study_session(&mut self, set_index: usize) {
        let Some(set) = self.sets.get(set_index) else {
            return;
        };
        let set_name = set.name.clone();
        match self.engine.start_session(&set_name) {
            Ok(handle) => {
                self.session = Some(handle);
                self.session_warnings.clear();
                self.current_screen = AppScreen::Study;
            }
            Err(e) => {
                tracing::warn!(set = %set_name, error = %e, "could not start study session");
                self.show_message(format!("Cannot study \"{}\": {}", set_name, e));
            }
        }
    }

    fn render_export_dialog(&mut self, ctx: &egui::Context) {
        let mut export_set_index: Option<usize> = None;
        let mut should_cancel = false;

        egui::Window::new("Export Set")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Select a set to export:");
                ui.separator();

                for (i, set) in self.sets.iter().enumerate() {
                    if ui
                        .button(format!("{} ({} cards)", set.name, set.total_cards))
                        .clicked()
                    {
                        export_set_index = Some(i);
                    }
                }

                ui.separator();

                if ui.button("Cancel").clicked() {
                    should_cancel = true;
                }
            });

        if let Some(i) = export_set_index {
            self.handle_export(i);
        }
        if should_cancel {
            self.show_export_dialog = false;
        }
    }

    /// Handles set export to JSON file
    fn handle_export(&mut self, set_index: usize) {
        self.show_export_dialog = false;
        let Some(set_name) = self.sets.get(set_index).map(|s| s.name.clone()) else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", set_name))
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            match export_set_to_path(self.engine.store(), &set_name, &path) {
                Ok(()) => self.show_message(format!("Set '{}' exported successfully!", set_name)),
                Err(e) => self.show_message(format!("Export failed: {}", e)),
            }
        }
    }

    /// Handles set import from JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let draft = match import_set_from_path(&path) {
            Ok(draft) => draft,
            Err(e) => {
                self.show_message(format!(
                    "Import failed: {}\n\nPlease check if the file has correct structure:\n\
                     {{\n  \"name\": \"Set Name\",\n  \"cards\": [...]\n}}",
                    e
                ));
                return;
            }
        };

        match self.engine.store_mut().create_set(&draft) {
            Ok(set) => {
                self.show_message(format!(
                    "Set '{}' imported successfully with {} cards!",
                    set.name, set.total_cards
                ));
                self.refresh_library();
            }
            Err(e) => self.show_message(format!("Failed to import set: {}", e)),
        }
    }
}

/// Qualitative label for the share of cards known
fn performance_level(known_ratio: f64) -> &'static str {
    if known_ratio < 0.5 {
        "Needs significant improvement"
    } else if known_ratio < 0.7 {
        "Moderate understanding"
    } else if known_ratio < 0.9 {
        "Strong grasp"
    } else {
        "Mastery level"
    }
}

/// Summary text shown on the results screen
fn summary_lines(summary: &Summary) -> Vec<String> {
    let total = summary.total_cards();
    let percent = |count: usize| {
        if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        }
    };
    let known_percent = percent(summary.known_count());
    let practice_percent = percent(summary.practice_count());

    let mut lines = vec![
        format!("Total Cards Studied: {}", total),
        format!("Known Cards: {} ({:.2}%)", summary.known_count(), known_percent),
        format!(
            "Cards Needing Practice: {} ({:.2}%)",
            summary.practice_count(),
            practice_percent
        ),
    ];

    if total > 0 {
        lines.push(format!("Performance Level: {}", performance_level(known_percent / 100.0)));
    }
    if practice_percent > 50.0 {
        lines.push("Tip: focus on reviewing cards in the practice list".to_string());
    }
    if summary.practice_count() > 0 {
        lines.push("Tip: create additional study sessions for challenging cards".to_string());
    }
    lines
}
