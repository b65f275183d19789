use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scene_search_client::error::{ContractError, InputError, SearchError, SelectionError, TransportError};
use scene_search_client::overlay::{Dimensions, MarkerStyle, MediaSlot};
use scene_search_client::search::{decode_search_body, normalize_base_url, video_url};
use scene_search_client::search::{QueryFile, ResultSet, SearchBackend};
use scene_search_client::view::{
    LoadedMedia, MediaLoader, MediaRequest, SearchTrigger, SelectionChange, ViewController,
    ViewEvent, ViewStateKind,
};
use url::Url;

const WAIT: Duration = Duration::from_secs(5);

struct ScriptedBackend {
    outcomes: Mutex<VecDeque<Result<ResultSet, SearchError>>>,
    base: Url,
}

impl SearchBackend for ScriptedBackend {
    fn search(&self, _query: &QueryFile) -> Result<ResultSet, SearchError> {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SearchError::Rejected("no scripted outcome".into())))
    }

    fn video_url(&self, video_id: &str, timestamp_seconds: f64) -> Option<Url> {
        video_url(&self.base, video_id, timestamp_seconds)
    }
}

#[derive(Clone, Default)]
struct RecordingLoader {
    requests: Arc<Mutex<Vec<MediaRequest>>>,
}

impl MediaLoader for RecordingLoader {
    fn load(&self, request: MediaRequest, _events: Sender<ViewEvent>) {
        self.requests.lock().unwrap().push(request);
    }
}

struct Harness {
    controller: ViewController,
    requests: Arc<Mutex<Vec<MediaRequest>>>,
}

impl Harness {
    fn new(outcomes: Vec<Result<ResultSet, SearchError>>) -> Self {
        let backend = Arc::new(ScriptedBackend {
            outcomes: Mutex::new(outcomes.into()),
            base: normalize_base_url("http://backend.test:8000").unwrap(),
        });
        let loader = RecordingLoader::default();
        let requests = Arc::clone(&loader.requests);
        Self {
            controller: ViewController::new(backend, Box::new(loader), MarkerStyle::default()),
            requests,
        }
    }

    fn search(&mut self) {
        let trigger = self
            .controller
            .trigger_search(Some(QueryFile::from_bytes("query.png", vec![1, 2, 3])))
            .unwrap();
        assert!(matches!(trigger, SearchTrigger::Started { .. }));
        assert!(self.controller.wait_for_event(WAIT), "search never finished");
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self, slot: MediaSlot) -> MediaRequest {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.slot() == slot)
            .cloned()
            .expect("no media request for slot")
    }

    fn cycle(&self) -> u64 {
        self.last_request(MediaSlot::ResultVideo).cycle()
    }

    fn deliver(&mut self, slot: MediaSlot, cycle: u64, native: (f64, f64)) {
        self.controller.handle_event(ViewEvent::MediaLoaded {
            slot,
            cycle,
            media: LoadedMedia::metadata_only(Dimensions::new(native.0, native.1)),
        });
    }

    fn deliver_both(&mut self) {
        let cycle = self.cycle();
        self.deliver(MediaSlot::QueryImage, cycle, (100.0, 100.0));
        self.deliver(MediaSlot::ResultVideo, cycle, (200.0, 100.0));
    }
}

fn decode(json: &str) -> Result<ResultSet, SearchError> {
    decode_search_body(json.as_bytes())
}

fn scenario_a() -> Result<ResultSet, SearchError> {
    decode(
        r#"{"success":true,"result":[{"video_id":"v1","timestamp":12.5,"score":0.91,
            "query_keypoints":[[10,10]],"frame_keypoints":[[20,20]]}]}"#,
    )
}

fn five_results() -> Result<ResultSet, SearchError> {
    let items: Vec<String> = (0..5)
        .map(|i| {
            format!(
                r#"{{"video_id":"v{i}","timestamp":{i}.0,"score":0.{},"query_keypoints":[[{},10]],"frame_keypoints":[[20,{}]]}}"#,
                9 - i,
                10 + i * 10,
                10 + i * 10
            )
        })
        .collect();
    decode(&format!(r#"{{"success":true,"result":[{}]}}"#, items.join(",")))
}

#[test]
fn scenario_a_success_shows_top_result() {
    let mut h = Harness::new(vec![scenario_a()]);
    h.search();

    assert_eq!(h.controller.state().kind(), ViewStateKind::Success);
    assert_eq!(h.controller.selection().unwrap().selected_index(), 0);
    let info = h.controller.info_text().unwrap();
    assert!(info.contains("v1"), "{info}");
    assert!(info.contains("12.50s"), "{info}");
    assert!(info.contains("0.91"), "{info}");
    assert_eq!(h.controller.primary_title().as_deref(), Some("Top 1"));
    assert_eq!(
        h.controller.selected_video_url().unwrap().as_str(),
        "http://backend.test:8000/videos/v1#t=12.500"
    );

    match h.last_request(MediaSlot::ResultVideo) {
        MediaRequest::ResultVideo { matched_frame, .. } => assert!(matched_frame.is_none()),
        other => panic!("unexpected request {other:?}"),
    }
    assert_eq!(h.request_count(), 2);
}

#[test]
fn overlay_is_drawn_at_display_scale_once_both_media_are_ready() {
    let mut h = Harness::new(vec![scenario_a()]);
    h.search();
    h.controller
        .resize(MediaSlot::QueryImage, Dimensions::new(50.0, 50.0));
    h.controller
        .resize(MediaSlot::ResultVideo, Dimensions::new(100.0, 50.0));
    assert_eq!(h.controller.render_count(), 0);

    h.deliver_both();

    assert_eq!(h.controller.render_count(), 1);
    let query = h.controller.overlay(MediaSlot::QueryImage);
    assert_eq!(query.size(), (50, 50));
    assert_ne!(query.pixel(5, 5).unwrap().a, 0);
    assert_eq!(query.pixel(30, 30).unwrap().a, 0);

    let frame = h.controller.overlay(MediaSlot::ResultVideo);
    assert_eq!(frame.size(), (100, 50));
    assert_ne!(frame.pixel(10, 10).unwrap().a, 0);
}

#[test]
fn render_fires_once_for_either_arrival_order() {
    for order in [
        [MediaSlot::QueryImage, MediaSlot::ResultVideo],
        [MediaSlot::ResultVideo, MediaSlot::QueryImage],
    ] {
        let mut h = Harness::new(vec![scenario_a()]);
        h.search();
        let cycle = h.cycle();
        h.deliver(order[0], cycle, (100.0, 100.0));
        assert_eq!(h.controller.render_count(), 0, "{order:?}");
        assert!(!h.controller.is_overlay_ready());
        h.deliver(order[1], cycle, (100.0, 100.0));
        assert_eq!(h.controller.render_count(), 1, "{order:?}");
        // A repeated load for the same cycle does not render again.
        h.deliver(order[1], cycle, (100.0, 100.0));
        assert_eq!(h.controller.render_count(), 1, "{order:?}");
    }
}

#[test]
fn scenario_b_empty_results() {
    let mut h = Harness::new(vec![decode(r#"{"success":true,"result":[]}"#)]);
    h.search();

    assert_eq!(h.controller.state().kind(), ViewStateKind::Empty);
    assert!(h.controller.selection().is_none());
    assert_eq!(h.request_count(), 0);
    assert_eq!(h.controller.render_count(), 0);
    assert_eq!(h.controller.overlay(MediaSlot::QueryImage).size(), (0, 0));
}

#[test]
fn backend_no_candidates_answer_shows_empty_state() {
    let mut h = Harness::new(vec![decode(r#"{"success":false,"message":"nothing similar"}"#)]);
    h.search();
    assert_eq!(h.controller.state().kind(), ViewStateKind::Empty);
    assert_eq!(h.request_count(), 0);
}

#[test]
fn scenario_c_server_error_replaces_previous_success() {
    let mut h = Harness::new(vec![
        scenario_a(),
        Err(TransportError::Status {
            status: 500,
            detail: None,
        }
        .into()),
    ]);
    h.search();
    h.deliver_both();
    assert!(h.controller.overlay(MediaSlot::QueryImage).painted_pixels() > 0);

    h.search();
    assert_eq!(h.controller.state().kind(), ViewStateKind::Error);
    let message = h.controller.state().error_message().unwrap();
    assert!(message.contains("500"), "{message}");
    assert!(h.controller.selection().is_none());
    assert!(h.controller.info_text().is_none());
    assert_eq!(h.controller.overlay(MediaSlot::QueryImage).painted_pixels(), 0);
    assert_eq!(h.controller.overlay(MediaSlot::ResultVideo).painted_pixels(), 0);
}

#[test]
fn scenario_c_malformed_json_is_an_error() {
    let mut h = Harness::new(vec![decode("{not json")]);
    h.search();
    assert_eq!(h.controller.state().kind(), ViewStateKind::Error);
    assert!(!h.controller.state().error_message().unwrap().is_empty());
}

#[test]
fn scenario_d_keypoint_mismatch_fails_before_rendering() {
    let outcome = decode(
        r#"{"success":true,"result":[{"video_id":"v","timestamp":1,"score":1,
            "query_keypoints":[[1,1],[2,2],[3,3]],"frame_keypoints":[[1,1],[2,2]]}]}"#,
    );
    assert!(matches!(
        outcome,
        Err(SearchError::Contract(ContractError::KeypointCountMismatch { .. }))
    ));
    let mut h = Harness::new(vec![outcome]);
    h.search();

    assert_eq!(h.controller.state().kind(), ViewStateKind::Error);
    assert_eq!(h.request_count(), 0);
    assert_eq!(h.controller.render_count(), 0);
}

#[test]
fn scenario_e_selecting_a_result_rearms_for_that_result_only() {
    let mut h = Harness::new(vec![five_results()]);
    h.search();
    h.deliver_both();
    assert_eq!(h.controller.render_count(), 1);
    let old_cycle = h.cycle();

    assert_eq!(
        h.controller.select(2),
        Ok(SelectionChange::Changed { from: 0, to: 2 })
    );
    assert_eq!(h.controller.selected_result().unwrap().video_id, "v2");
    assert_eq!(h.controller.primary_title().as_deref(), Some("Top 3"));
    let new_cycle = h.cycle();
    assert_ne!(old_cycle, new_cycle);
    assert_eq!(h.controller.overlay(MediaSlot::QueryImage).painted_pixels(), 0);

    // Late loads for the previously shown result are ignored.
    h.deliver(MediaSlot::QueryImage, old_cycle, (100.0, 100.0));
    h.deliver(MediaSlot::ResultVideo, old_cycle, (200.0, 100.0));
    assert_eq!(h.controller.render_count(), 1);
    assert!(!h.controller.media(MediaSlot::QueryImage).is_loaded());

    h.deliver_both();
    assert_eq!(h.controller.render_count(), 2);
    let first = h.controller.overlay(MediaSlot::ResultVideo).clone();

    // Same index again: no state change, but one more render cycle.
    assert_eq!(h.controller.select(2), Ok(SelectionChange::Unchanged(2)));
    assert_eq!(h.controller.selection().unwrap().selected_index(), 2);
    h.deliver_both();
    assert_eq!(h.controller.render_count(), 3);
    assert_eq!(h.controller.overlay(MediaSlot::ResultVideo), &first);
}

#[test]
fn out_of_range_selection_changes_nothing() {
    let mut h = Harness::new(vec![five_results()]);
    h.search();
    h.controller.select(1).unwrap();
    let requests = h.request_count();

    assert_eq!(
        h.controller.select(5),
        Err(SelectionError::IndexOutOfRange { index: 5, len: 5 })
    );
    assert_eq!(h.controller.selection().unwrap().selected_index(), 1);
    assert_eq!(h.request_count(), requests);
}

#[test]
fn selecting_without_results_is_rejected() {
    let mut h = Harness::new(vec![]);
    assert_eq!(h.controller.select(0), Err(SelectionError::NoActiveResults));
}

#[test]
fn missing_file_is_an_input_error_and_state_stays_idle() {
    let mut h = Harness::new(vec![scenario_a()]);
    assert_eq!(
        h.controller.trigger_search(None),
        Err(InputError::NoFileSelected)
    );
    assert_eq!(h.controller.state().kind(), ViewStateKind::Idle);
    assert_eq!(h.controller.search_seq(), 0);
}

#[test]
fn second_trigger_while_loading_is_ignored() {
    let mut h = Harness::new(vec![scenario_a(), scenario_a()]);
    let file = QueryFile::from_bytes("q.png", vec![1]);
    let first = h.controller.trigger_search(Some(file.clone())).unwrap();
    assert_eq!(first, SearchTrigger::Started { seq: 1 });
    assert!(h.controller.is_loading());
    assert_eq!(
        h.controller.trigger_search(Some(file)).unwrap(),
        SearchTrigger::Ignored
    );
    assert_eq!(h.controller.search_seq(), 1);
    assert!(h.controller.wait_for_event(WAIT));
    assert_eq!(h.controller.state().kind(), ViewStateKind::Success);
    assert!(!h.controller.wait_for_event(Duration::from_millis(100)));
}

#[test]
fn stale_search_response_is_discarded() {
    let mut h = Harness::new(vec![scenario_a(), decode(r#"{"success":true,"result":[]}"#)]);
    h.search();
    assert_eq!(h.controller.state().kind(), ViewStateKind::Success);

    h.controller
        .trigger_search(Some(QueryFile::from_bytes("q.png", vec![1])))
        .unwrap();
    // A late duplicate of the first response arrives while the second search runs.
    h.controller.handle_event(ViewEvent::SearchFinished {
        seq: 1,
        outcome: scenario_a(),
    });
    assert_eq!(h.controller.state().kind(), ViewStateKind::Loading);

    assert!(h.controller.wait_for_event(WAIT));
    assert_eq!(h.controller.state().kind(), ViewStateKind::Empty);
}

#[test]
fn resize_rerenders_and_playback_only_toggles_visibility() {
    let mut h = Harness::new(vec![scenario_a()]);
    h.search();
    h.deliver_both();
    assert_eq!(h.controller.render_count(), 1);
    assert_eq!(h.controller.overlay(MediaSlot::QueryImage).size(), (100, 100));

    h.controller
        .resize(MediaSlot::QueryImage, Dimensions::new(40.0, 40.0));
    assert_eq!(h.controller.render_count(), 2);
    assert_eq!(h.controller.overlay(MediaSlot::QueryImage).size(), (40, 40));

    // Same size again is not a layout change.
    h.controller
        .resize(MediaSlot::QueryImage, Dimensions::new(40.0, 40.0));
    assert_eq!(h.controller.render_count(), 2);

    h.controller.on_video_play();
    assert!(!h.controller.is_overlay_visible(MediaSlot::ResultVideo));
    assert!(h.controller.is_overlay_visible(MediaSlot::QueryImage));
    h.controller.on_video_pause();
    assert!(h.controller.is_overlay_visible(MediaSlot::ResultVideo));
    assert_eq!(h.controller.render_count(), 2);
    assert!(h.controller.overlay(MediaSlot::ResultVideo).painted_pixels() > 0);
}

#[test]
fn media_failure_is_reported_without_rendering() {
    let mut h = Harness::new(vec![scenario_a()]);
    h.search();
    let cycle = h.cycle();
    h.deliver(MediaSlot::QueryImage, cycle, (100.0, 100.0));
    h.controller.handle_event(ViewEvent::MediaFailed {
        slot: MediaSlot::ResultVideo,
        cycle,
        message: "no preview".into(),
    });
    assert_eq!(h.controller.media_error(), Some("no preview"));
    assert_eq!(h.controller.render_count(), 0);
    assert_eq!(h.controller.state().kind(), ViewStateKind::Success);
    assert!(!h.controller.has_pending_work());
}
