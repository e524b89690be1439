// gui/src/main.rs
use anyhow::Context as _;
use clipring::{ClipboardManager, Config};
use clipring_gui::daemon;
use clipring_gui::shortcuts::{Shortcuts, WindowToggle};
use clipring_gui::{update, ClipRow, Effect, Event, Key, Model};
use eframe::egui;
use global_hotkey::GlobalHotKeyManager;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shows and hides the native window from any thread.
struct ViewportHandle {
    ctx: egui::Context,
    visible: Arc<AtomicBool>,
}

impl ViewportHandle {
    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        self.ctx
            .send_viewport_cmd(egui::ViewportCommand::Visible(visible));
        if visible {
            self.ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }
        self.ctx.request_repaint();
    }
}

impl WindowToggle for ViewportHandle {
    fn toggle_visibility(&self) {
        let visible = !self.visible.load(Ordering::SeqCst);
        self.set_visible(visible);
    }
}

struct ClipringGui {
    model: Model,
    manager: Arc<ClipboardManager>,
    viewport: Arc<ViewportHandle>,
    dirty: Arc<AtomicBool>,
    quitting: bool,
    _hotkeys: Option<GlobalHotKeyManager>,
}

impl ClipringGui {
    fn new(cc: &eframe::CreationContext<'_>, manager: Arc<ClipboardManager>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let viewport = Arc::new(ViewportHandle {
            ctx: cc.egui_ctx.clone(),
            visible: Arc::new(AtomicBool::new(true)),
        });

        let dirty = Arc::new(AtomicBool::new(true));
        {
            let dirty = dirty.clone();
            let ctx = cc.egui_ctx.clone();
            manager.register_callback(move || {
                dirty.store(true, Ordering::SeqCst);
                ctx.request_repaint();
            });
        }

        let toggle: Arc<dyn WindowToggle> = viewport.clone();
        let hotkeys = match Shortcuts::new(manager.clone(), toggle).register() {
            Ok(hotkeys) => Some(hotkeys),
            Err(e) => {
                warn!("continuing without global shortcuts: {:#}", e);
                None
            }
        };

        let model = Model::new(manager.config().quick_access_count);

        Self {
            model,
            manager,
            viewport,
            dirty,
            quitting: false,
            _hotkeys: hotkeys,
        }
    }

    fn reload(&mut self) {
        let preview_len = self.manager.config().preview_len;
        let clips: Vec<ClipRow> = self
            .manager
            .get_entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| ClipRow::from_entry(index, entry, preview_len))
            .collect();
        self.send(Event::ClipsLoaded(clips));
    }

    fn send(&mut self, event: Event) {
        let effect = update(&mut self.model, event);
        self.run(effect);
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Copy(index) => match self.manager.copy_to_clipboard(index) {
                Ok(()) => self.send(Event::Copied),
                Err(clipring::ClipError::IndexOutOfRange { index, len }) => {
                    debug!("ignoring copy of entry {} (history has {})", index, len);
                }
                Err(e) => {
                    warn!("copy failed: {}", e);
                    self.send(Event::CopyFailed(format!("Could not copy: {}", e)));
                }
            },
            Effect::Remove(index) => {
                self.manager.remove_entry(index);
            }
            Effect::Clear => self.manager.clear_entries(),
            Effect::Hide => self.viewport.set_visible(false),
            Effect::Quit => {
                info!("quit requested");
                self.quitting = true;
                self.viewport
                    .ctx
                    .send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("Clipboard", |ui| {
                if ui.button("Clear All").clicked() {
                    ui.close_menu();
                    self.send(Event::RequestClear);
                }
                if ui.button("Quit").clicked() {
                    ui.close_menu();
                    self.send(Event::Quit);
                }
            });
        });
    }

    fn quick_access_bar(&mut self, ui: &mut egui::Ui) {
        let slots = self.model.quick_access_count;
        let labels: Vec<String> = self
            .model
            .quick_access()
            .iter()
            .map(|clip| clip.quick_label.clone())
            .collect();

        ui.horizontal(|ui| {
            for slot in 0..slots {
                match labels.get(slot) {
                    Some(label) => {
                        if ui.button(label).clicked() {
                            self.send(Event::CopyQuick(slot));
                        }
                    }
                    None => {
                        ui.add_enabled(false, egui::Button::new("--"));
                    }
                }
            }
        });
    }

    fn search_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Search:");
            let mut query = self.model.search_query.clone();
            if ui.text_edit_singleline(&mut query).changed() {
                self.send(Event::UpdateSearch(query));
            }

            ui.label(format!(
                "{}/{}",
                self.model.filtered().len(),
                self.model.clips.len()
            ));

            if ui.button("Clear All").clicked() {
                self.send(Event::RequestClear);
            }
        });
    }

    fn clip_list(&mut self, ui: &mut egui::Ui) {
        let rows: Vec<(String, String, Option<String>)> = self
            .model
            .filtered()
            .iter()
            .map(|clip| (clip.time.clone(), clip.preview.clone(), clip.size_str.clone()))
            .collect();

        let mut clicked = None;
        let mut deleted = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (position, (time, preview, size)) in rows.iter().enumerate() {
                let selected = position == self.model.selected_index;
                ui.horizontal(|ui| {
                    let text = match size {
                        Some(size) => format!("{}  {}  [{}]", time, preview, size),
                        None => format!("{}  {}", time, preview),
                    };
                    let response = ui.selectable_label(selected, text);
                    if selected {
                        response.scroll_to_me(None);
                    }
                    if response.clicked() {
                        clicked = Some(position);
                    }
                    if ui.small_button("Delete").clicked() {
                        deleted = Some(position);
                    }
                });
            }
        });

        if let Some(position) = clicked {
            self.send(Event::SelectIndex(position));
            self.send(Event::CopyClip(position));
        }
        if let Some(position) = deleted {
            self.send(Event::DeleteClip(position));
        }
    }

    fn status_line(&mut self, ui: &mut egui::Ui) {
        let Some(status) = self.model.status.clone() else {
            return;
        };
        ui.separator();
        ui.horizontal(|ui| {
            ui.colored_label(ui.visuals().warn_fg_color, status);
            if ui.small_button("x").clicked() {
                self.send(Event::DismissStatus);
            }
        });
    }

    fn confirm_clear(&mut self, ctx: &egui::Context) {
        if !self.model.confirm_clear {
            return;
        }

        let mut answer = None;
        egui::Window::new("Clear History")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Clear all clipboard entries?");
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        answer = Some(Event::CancelClear);
                    }
                    if ui.button("Clear").clicked() {
                        answer = Some(Event::ConfirmClear);
                    }
                });
            });

        if let Some(event) = answer {
            self.send(event);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let pressed = ctx.input(|i| {
            [
                (egui::Key::ArrowUp, Key::Up),
                (egui::Key::ArrowDown, Key::Down),
                (egui::Key::Enter, Key::Enter),
                (egui::Key::Escape, Key::Escape),
            ]
            .into_iter()
            .filter(|(key, _)| i.key_pressed(*key))
            .map(|(_, key)| key)
            .collect::<Vec<_>>()
        });

        for key in pressed {
            self.send(Event::KeyPress(key));
        }
    }
}

impl eframe::App for ClipringGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.dirty.swap(false, Ordering::SeqCst) {
            self.reload();
        }

        // the close button hides the window; only Quit ends the session
        if ctx.input(|i| i.viewport().close_requested()) && !self.quitting {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.send(Event::CloseRequested);
        }

        self.handle_keys(ctx);

        egui::TopBottomPanel::top("menu").show(ctx, |ui| self.menu_bar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.quick_access_bar(ui);
            ui.separator();
            self.search_bar(ui);
            ui.separator();
            self.clip_list(ui);
            self.status_line(ui);
        });

        self.confirm_clear(ctx);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();
    let manager = Arc::new(
        ClipboardManager::new(config).context("failed to open the system clipboard")?,
    );
    let daemon = daemon::start(manager.clone())?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Clipboard History")
            .with_inner_size([420.0, 560.0])
            .with_always_on_top(),
        ..Default::default()
    };

    let app_manager = manager.clone();
    let result = eframe::run_native(
        "Clipboard History",
        options,
        Box::new(move |cc| Ok(Box::new(ClipringGui::new(cc, app_manager)))),
    );

    daemon::stop(&manager, daemon);

    result.map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}
