use crate::error::SearchError;
use crate::overlay::gate::MediaSlot;
use crate::search::model::ResultSet;
use crate::view::media::LoadedMedia;

/// Continuations delivered to the view controller from worker threads.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    SearchFinished {
        seq: u64,
        outcome: Result<ResultSet, SearchError>,
    },
    MediaLoaded {
        slot: MediaSlot,
        cycle: u64,
        media: LoadedMedia,
    },
    MediaFailed {
        slot: MediaSlot,
        cycle: u64,
        message: String,
    },
}
