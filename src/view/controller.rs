use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::{InputError, SearchError, SelectionError};
use crate::overlay::gate::{GateSignal, MediaSlot, ReadinessGate};
use crate::overlay::model::{Dimensions, MarkerStyle};
use crate::overlay::render::{render_overlay, OverlaySurface, OverlayTarget};
use crate::search::client::SearchBackend;
use crate::search::model::{QueryFile, ResultSet, SearchResult};
use crate::view::media::{LoadedMedia, MediaElement, MediaLoader, MediaRequest};
use crate::view::messages::ViewEvent;
use crate::view::selection::{ResultSelection, SelectionChange};
use crate::view::state::{can_transition, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTrigger {
    Started { seq: u64 },
    /// A search is already in flight; the trigger was dropped.
    Ignored,
}

/// Owns everything the result view shows and is the only place it changes.
///
/// Work that has to wait (the search request, media decoding) runs elsewhere
/// and comes back as a [`ViewEvent`] through [`ViewController::pump`]. Each
/// search carries a sequence number and each render cycle a gate cycle id, so
/// late answers for something no longer on screen are dropped.
pub struct ViewController {
    state: ViewState,
    backend: Arc<dyn SearchBackend>,
    loader: Box<dyn MediaLoader>,
    events_tx: Sender<ViewEvent>,
    events_rx: Receiver<ViewEvent>,
    search_seq: u64,
    query: Option<QueryFile>,
    gate: ReadinessGate,
    query_media: MediaElement,
    result_media: MediaElement,
    query_overlay: OverlaySurface,
    result_overlay: OverlaySurface,
    result_overlay_visible: bool,
    style: MarkerStyle,
    render_count: u64,
    overlay_revision: u64,
    media_error: Option<String>,
}

impl ViewController {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        loader: Box<dyn MediaLoader>,
        style: MarkerStyle,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            state: ViewState::Idle,
            backend,
            loader,
            events_tx,
            events_rx,
            search_seq: 0,
            query: None,
            gate: ReadinessGate::new(),
            query_media: MediaElement::default(),
            result_media: MediaElement::default(),
            query_overlay: OverlaySurface::new(),
            result_overlay: OverlaySurface::new(),
            result_overlay_visible: true,
            style,
            render_count: 0,
            overlay_revision: 0,
            media_error: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn selection(&self) -> Option<&ResultSelection> {
        self.state.selection()
    }

    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.selection().map(ResultSelection::selected)
    }

    /// Heading of the primary result view, e.g. `Top 1`.
    pub fn primary_title(&self) -> Option<String> {
        self.selection().map(|s| format!("Top {}", s.rank()))
    }

    pub fn info_text(&self) -> Option<String> {
        self.selected_result().map(SearchResult::info_line)
    }

    pub fn selected_video_url(&self) -> Option<Url> {
        let result = self.selected_result()?;
        self.backend
            .video_url(&result.video_id, result.timestamp_seconds)
    }

    pub fn query_file(&self) -> Option<&QueryFile> {
        self.query.as_ref()
    }

    pub fn media(&self, slot: MediaSlot) -> &MediaElement {
        match slot {
            MediaSlot::QueryImage => &self.query_media,
            MediaSlot::ResultVideo => &self.result_media,
        }
    }

    fn media_mut(&mut self, slot: MediaSlot) -> &mut MediaElement {
        match slot {
            MediaSlot::QueryImage => &mut self.query_media,
            MediaSlot::ResultVideo => &mut self.result_media,
        }
    }

    pub fn overlay(&self, slot: MediaSlot) -> &OverlaySurface {
        match slot {
            MediaSlot::QueryImage => &self.query_overlay,
            MediaSlot::ResultVideo => &self.result_overlay,
        }
    }

    /// The result overlay is hidden while the video plays.
    pub fn is_overlay_visible(&self, slot: MediaSlot) -> bool {
        match slot {
            MediaSlot::QueryImage => true,
            MediaSlot::ResultVideo => self.result_overlay_visible,
        }
    }

    pub fn is_overlay_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Number of completed overlay renders since startup.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Bumped whenever overlay pixels change, including when they are cleared.
    pub fn overlay_revision(&self) -> u64 {
        self.overlay_revision
    }

    /// Why the current result's media could not be shown, if it failed.
    pub fn media_error(&self) -> Option<&str> {
        self.media_error.as_deref()
    }

    pub fn search_seq(&self) -> u64 {
        self.search_seq
    }

    pub fn event_sender(&self) -> Sender<ViewEvent> {
        self.events_tx.clone()
    }

    /// Something asynchronous is still expected to arrive.
    pub fn has_pending_work(&self) -> bool {
        self.is_loading() || (self.gate.is_armed() && !self.gate.is_ready() && self.media_error.is_none())
    }

    /// Start a search for `file`. A missing file is rejected before anything
    /// changes; a trigger while another search is in flight is ignored.
    pub fn trigger_search(&mut self, file: Option<QueryFile>) -> Result<SearchTrigger, InputError> {
        if self.is_loading() {
            tracing::debug!(seq = self.search_seq, "search already in flight; ignoring trigger");
            return Ok(SearchTrigger::Ignored);
        }
        let file = file.ok_or(InputError::NoFileSelected)?;

        self.search_seq += 1;
        let seq = self.search_seq;
        self.clear_presentation();
        self.query = Some(file.clone());
        self.transition(ViewState::Loading);
        tracing::info!(seq, file = file.name(), "search started");

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        std::thread::spawn(move || {
            let outcome = backend.search(&file);
            let _ = events.send(ViewEvent::SearchFinished { seq, outcome });
        });
        Ok(SearchTrigger::Started { seq })
    }

    /// Show result `index` of the current set.
    pub fn select(&mut self, index: usize) -> Result<SelectionChange, SelectionError> {
        let ViewState::Success(selection) = &mut self.state else {
            return Err(SelectionError::NoActiveResults);
        };
        let change = selection.select(index)?;
        tracing::debug!(?change, "result selected");
        self.arm_selected();
        Ok(change)
    }

    /// The displayed size of `slot` changed. Scale factors are recomputed from
    /// scratch, so a loaded overlay is rendered again.
    pub fn resize(&mut self, slot: MediaSlot, display: Dimensions) {
        if !self.media_mut(slot).set_display(display) {
            return;
        }
        if self.gate.relayout() == GateSignal::Fire {
            self.render_current();
        }
    }

    pub fn on_video_play(&mut self) {
        self.result_overlay_visible = false;
    }

    pub fn on_video_pause(&mut self) {
        self.result_overlay_visible = true;
    }

    /// Handle every event that is already waiting. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Block until one event arrives (or `timeout` passes) and handle it.
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(_) => false,
        }
    }

    pub fn handle_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::SearchFinished { seq, outcome } => self.on_search_finished(seq, outcome),
            ViewEvent::MediaLoaded { slot, cycle, media } => {
                self.on_media_loaded(slot, cycle, media)
            }
            ViewEvent::MediaFailed {
                slot,
                cycle,
                message,
            } => self.on_media_failed(slot, cycle, message),
        }
    }

    fn on_search_finished(&mut self, seq: u64, outcome: Result<ResultSet, SearchError>) {
        if seq != self.search_seq || !self.is_loading() {
            tracing::debug!(seq, latest = self.search_seq, "discarding stale search response");
            return;
        }
        match outcome.map(ResultSelection::install) {
            Ok(Ok(selection)) => {
                tracing::info!(seq, results = selection.results().len(), "search succeeded");
                self.transition(ViewState::Success(selection));
                self.arm_selected();
            }
            Ok(Err(err)) => {
                tracing::info!(seq, "search returned no results ({err})");
                self.transition(ViewState::Empty);
            }
            Err(err) => {
                tracing::warn!(seq, error = %err, "search failed");
                self.transition(ViewState::Error(err.to_string()));
            }
        }
    }

    fn on_media_loaded(&mut self, slot: MediaSlot, cycle: u64, media: LoadedMedia) {
        if cycle != self.gate.cycle() {
            tracing::debug!(?slot, cycle, current = self.gate.cycle(), "ignoring media from a superseded cycle");
            return;
        }
        self.media_mut(slot).loaded(media);
        match self.gate.mark_ready(slot, cycle) {
            GateSignal::Fire => self.render_current(),
            GateSignal::Waiting => tracing::debug!(?slot, "media ready; waiting for its pair"),
            GateSignal::AlreadyFired | GateSignal::Stale => {
                tracing::debug!(?slot, "media reloaded after render")
            }
        }
    }

    fn on_media_failed(&mut self, slot: MediaSlot, cycle: u64, message: String) {
        if cycle != self.gate.cycle() {
            tracing::debug!(?slot, cycle, "ignoring media failure from a superseded cycle");
            return;
        }
        tracing::warn!(?slot, "media failed to load: {message}");
        self.media_error = Some(message);
    }

    /// Start a new readiness cycle for the selected result and request both media.
    fn arm_selected(&mut self) {
        let Some(result) = self.selected_result() else {
            return;
        };
        let video_id = result.video_id.clone();
        let matched_frame = result.matched_frame.clone();

        let cycle = self.gate.arm();
        self.query_media.unload();
        self.result_media.unload();
        self.query_overlay.reset();
        self.result_overlay.reset();
        self.overlay_revision += 1;
        self.result_overlay_visible = true;
        self.media_error = None;
        tracing::debug!(cycle, video = %video_id, "readiness gate armed");

        if let Some(query) = &self.query {
            self.loader.load(
                MediaRequest::QueryImage {
                    cycle,
                    bytes: query.bytes(),
                },
                self.events_tx.clone(),
            );
        }
        self.loader.load(
            MediaRequest::ResultVideo {
                cycle,
                matched_frame,
            },
            self.events_tx.clone(),
        );
    }

    fn render_current(&mut self) {
        let Some(selection) = self.state.selection() else {
            return;
        };
        let result = selection.selected();
        let outcome = render_overlay(
            OverlayTarget {
                slot: MediaSlot::QueryImage,
                surface: &mut self.query_overlay,
                media: self.query_media.geometry(),
                points: &result.query_keypoints,
            },
            OverlayTarget {
                slot: MediaSlot::ResultVideo,
                surface: &mut self.result_overlay,
                media: self.result_media.geometry(),
                points: &result.matched_keypoints,
            },
            &self.style,
        );
        match outcome {
            Ok(()) => {
                self.render_count += 1;
                self.overlay_revision += 1;
                tracing::debug!(
                    cycle = self.gate.cycle(),
                    renders = self.render_count,
                    "overlay rendered"
                );
            }
            Err(err) => tracing::error!(%err, "overlay render precondition violated"),
        }
    }

    /// Hide everything that belongs to the previous search.
    fn clear_presentation(&mut self) {
        self.gate.disarm();
        self.query_media.unload();
        self.result_media.unload();
        self.query_overlay.reset();
        self.result_overlay.reset();
        self.overlay_revision += 1;
        self.result_overlay_visible = true;
        self.media_error = None;
    }

    fn transition(&mut self, next: ViewState) {
        let (from, to) = (self.state.kind(), next.kind());
        if !can_transition(from, to) {
            tracing::warn!(?from, ?to, "unexpected view state transition");
        }
        self.state = next;
    }
}
