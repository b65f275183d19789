use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use crate::overlay::gate::MediaSlot;
use crate::search::model::QueryFile;
use crate::view::{ViewController, ViewStateKind};

const PENDING_REPAINT: Duration = Duration::from_millis(50);

#[derive(Default)]
struct SlotTextures {
    media_key: Option<usize>,
    media: Option<egui::TextureHandle>,
    overlay_revision: Option<u64>,
    overlay: Option<egui::TextureHandle>,
}

fn slot_index(slot: MediaSlot) -> usize {
    match slot {
        MediaSlot::QueryImage => 0,
        MediaSlot::ResultVideo => 1,
    }
}

fn slot_label(slot: MediaSlot) -> &'static str {
    match slot {
        MediaSlot::QueryImage => "Query image",
        MediaSlot::ResultVideo => "Matched frame",
    }
}

pub struct SceneSearchApp {
    controller: ViewController,
    file_path: String,
    /// Prompt shown for input problems; these never reach the view state.
    notice: Option<String>,
    status: String,
    status_rx: Option<Receiver<String>>,
    textures: [SlotTextures; 2],
}

impl SceneSearchApp {
    pub fn new(controller: ViewController, status_rx: Option<Receiver<String>>) -> Self {
        Self {
            controller,
            file_path: String::new(),
            notice: None,
            status: "Checking backend...".into(),
            status_rx,
            textures: Default::default(),
        }
    }

    fn poll_status(&mut self) {
        if let Some(rx) = &self.status_rx {
            if let Ok(status) = rx.try_recv() {
                self.status = status;
                self.status_rx = None;
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            self.file_path = path.display().to_string();
            self.notice = None;
        }
    }

    fn start_search(&mut self) {
        let path = self.file_path.trim();
        let file = if path.is_empty() {
            None
        } else {
            match QueryFile::from_path(path) {
                Ok(file) => Some(file),
                Err(err) => {
                    self.notice = Some(err.to_string());
                    return;
                }
            }
        };
        match self.controller.trigger_search(file) {
            Ok(_) => self.notice = None,
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn search_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Image:");
            ui.add(
                egui::TextEdit::singleline(&mut self.file_path)
                    .hint_text("Path to an image (or drop a file here)")
                    .desired_width(360.0),
            );
            let loading = self.controller.is_loading();
            if ui
                .add_enabled(!loading, egui::Button::new("Search"))
                .clicked()
            {
                self.start_search();
            }
            if loading {
                ui.add(egui::Spinner::new());
            }
        });
        if let Some(notice) = &self.notice {
            ui.colored_label(egui::Color32::YELLOW, notice);
        }
    }

    fn result_area(&mut self, ui: &mut egui::Ui) {
        match self.controller.state().kind() {
            ViewStateKind::Idle => {
                ui.label("Choose an image and press Search to find the matching scene.");
            }
            ViewStateKind::Loading => {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label("Searching...");
                });
            }
            ViewStateKind::Empty => {
                ui.label("No similar scenes were found.");
            }
            ViewStateKind::Error => {
                let message = self
                    .controller
                    .state()
                    .error_message()
                    .unwrap_or_default()
                    .to_string();
                egui::Frame::group(ui.style())
                    .fill(egui::Color32::from_rgb(70, 20, 20))
                    .show(ui, |ui| {
                        ui.colored_label(egui::Color32::LIGHT_RED, format!("Error: {message}"));
                    });
            }
            ViewStateKind::Success => {
                self.primary_view(ui);
                self.results_list(ui);
            }
        }
    }

    fn primary_view(&mut self, ui: &mut egui::Ui) {
        if let Some(title) = self.controller.primary_title() {
            ui.heading(format!("Matched scene ({title})"));
        }
        if let Some(info) = self.controller.info_text() {
            ui.label(info);
        }
        if let Some(err) = self.controller.media_error() {
            ui.colored_label(egui::Color32::YELLOW, format!("Preview unavailable: {err}"));
        }
        let pane_width = ((ui.available_width() - 24.0) / 2.0).max(64.0);
        ui.columns(2, |cols| {
            self.media_pane(&mut cols[0], MediaSlot::QueryImage, pane_width);
            self.media_pane(&mut cols[1], MediaSlot::ResultVideo, pane_width);
        });
    }

    fn media_pane(&mut self, ui: &mut egui::Ui, slot: MediaSlot, width: f32) {
        ui.label(slot_label(slot));
        let Some(native) = self.controller.media(slot).native() else {
            if self.controller.media_error().is_none() {
                ui.add(egui::Spinner::new());
            }
            return;
        };
        let display = native.fit_width(width as f64);
        self.controller.resize(slot, display);
        self.refresh_textures(ui.ctx(), slot);

        let size = egui::vec2(display.width as f32, display.height as f32);
        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        let textures = &self.textures[slot_index(slot)];
        match &textures.media {
            Some(tex) => {
                ui.painter().image(tex.id(), rect, uv, egui::Color32::WHITE);
            }
            None => {
                ui.painter().rect_filled(rect, 0.0, egui::Color32::DARK_GRAY);
            }
        }
        if self.controller.is_overlay_visible(slot) {
            if let Some(tex) = &textures.overlay {
                ui.painter().image(tex.id(), rect, uv, egui::Color32::WHITE);
            }
        }

        if slot == MediaSlot::ResultVideo {
            self.video_controls(ui);
        }
    }

    fn video_controls(&mut self, ui: &mut egui::Ui) {
        let url = self.controller.selected_video_url();
        ui.horizontal(|ui| {
            if self.controller.is_overlay_visible(MediaSlot::ResultVideo) {
                if ui.button("Play").clicked() {
                    self.controller.on_video_play();
                    if let Some(url) = &url {
                        if let Err(err) = open::that(url.as_str()) {
                            tracing::warn!(%url, "failed to open video: {err}");
                        }
                    }
                }
            } else if ui.button("Pause").clicked() {
                self.controller.on_video_pause();
            }
            if let Some(url) = &url {
                ui.hyperlink_to("Open video", url.as_str());
            }
        });
    }

    fn refresh_textures(&mut self, ctx: &egui::Context, slot: MediaSlot) {
        let textures = &mut self.textures[slot_index(slot)];
        let media = self.controller.media(slot);
        match media.frame() {
            Some(frame) => {
                let key = Arc::as_ptr(frame) as usize;
                if textures.media_key != Some(key) {
                    let size = [frame.width() as usize, frame.height() as usize];
                    textures.media = Some(ctx.load_texture(
                        format!("{slot:?}-media"),
                        egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw()),
                        egui::TextureOptions::LINEAR,
                    ));
                    textures.media_key = Some(key);
                }
            }
            None => {
                textures.media = None;
                textures.media_key = None;
            }
        }

        let revision = self.controller.overlay_revision();
        if textures.overlay_revision != Some(revision) {
            let surface = self.controller.overlay(slot);
            let (w, h) = surface.size();
            textures.overlay = (w > 0 && h > 0).then(|| {
                ctx.load_texture(
                    format!("{slot:?}-overlay"),
                    egui::ColorImage::from_rgba_unmultiplied(
                        [w as usize, h as usize],
                        surface.rgba_pixels(),
                    ),
                    egui::TextureOptions::NEAREST,
                )
            });
            textures.overlay_revision = Some(revision);
        }
    }

    fn results_list(&mut self, ui: &mut egui::Ui) {
        let Some(selection) = self.controller.selection() else {
            return;
        };
        let selected = selection.selected_index();
        let rows: Vec<String> = selection
            .results()
            .iter()
            .enumerate()
            .map(|(i, r)| format!("#{} {}", i + 1, r.info_line()))
            .collect();

        ui.separator();
        ui.heading("All results");
        let mut clicked = None;
        egui::ScrollArea::vertical()
            .max_height(220.0)
            .show(ui, |ui| {
                for (i, row) in rows.iter().enumerate() {
                    if ui.selectable_label(i == selected, row.as_str()).clicked() {
                        clicked = Some(i);
                    }
                }
            });
        if let Some(index) = clicked {
            if let Err(err) = self.controller.select(index) {
                tracing::warn!("could not select result {index}: {err}");
            }
        }
    }
}

impl eframe::App for SceneSearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.pump();
        self.poll_status();
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::top("search_bar").show(ctx, |ui| self.search_bar(ui));
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| ui.label(&self.status));
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.result_area(ui));
        });

        if self.controller.has_pending_work() || self.status_rx.is_some() {
            ctx.request_repaint_after(PENDING_REPAINT);
        }
    }
}
