use image::RgbaImage;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::overlay::gate::MediaSlot;
use crate::overlay::model::Dimensions;
use crate::overlay::render::MediaGeometry;
use crate::search::model::decode_data_url;
use crate::view::messages::ViewEvent;

/// A decoded still: the query image, or the frame standing in for the video.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMedia {
    pub native: Dimensions,
    pub frame: Option<Arc<RgbaImage>>,
}

impl LoadedMedia {
    /// Media whose size is known but whose pixels are not kept.
    pub fn metadata_only(native: Dimensions) -> Self {
        Self {
            native,
            frame: None,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let rgba = img.to_rgba8();
        Ok(Self {
            native: Dimensions::new(rgba.width() as f64, rgba.height() as f64),
            frame: Some(Arc::new(rgba)),
        })
    }
}

/// One of the two media elements next to an overlay surface.
#[derive(Debug, Clone, Default)]
pub struct MediaElement {
    native: Option<Dimensions>,
    display: Option<Dimensions>,
    frame: Option<Arc<RgbaImage>>,
}

impl MediaElement {
    pub fn native(&self) -> Option<Dimensions> {
        self.native
    }

    /// Displayed size; media that was never laid out shows at its native size.
    pub fn display(&self) -> Option<Dimensions> {
        self.display.or(self.native)
    }

    pub fn frame(&self) -> Option<&Arc<RgbaImage>> {
        self.frame.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.native.is_some()
    }

    pub fn geometry(&self) -> MediaGeometry {
        MediaGeometry {
            native: self.native,
            display: self.display().unwrap_or_default(),
        }
    }

    /// Returns `true` when the displayed size actually changed.
    pub fn set_display(&mut self, display: Dimensions) -> bool {
        if self.display == Some(display) {
            return false;
        }
        self.display = Some(display);
        true
    }

    pub(crate) fn loaded(&mut self, media: LoadedMedia) {
        self.native = Some(media.native);
        self.frame = media.frame;
    }

    /// Forget the loaded media but keep the layout.
    pub(crate) fn unload(&mut self) {
        self.native = None;
        self.frame = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaRequest {
    QueryImage {
        cycle: u64,
        bytes: Arc<[u8]>,
    },
    /// The video itself plays in the system player; only its matched frame
    /// is decoded here.
    ResultVideo {
        cycle: u64,
        matched_frame: Option<String>,
    },
}

impl MediaRequest {
    pub fn slot(&self) -> MediaSlot {
        match self {
            MediaRequest::QueryImage { .. } => MediaSlot::QueryImage,
            MediaRequest::ResultVideo { .. } => MediaSlot::ResultVideo,
        }
    }

    pub fn cycle(&self) -> u64 {
        match self {
            MediaRequest::QueryImage { cycle, .. } | MediaRequest::ResultVideo { cycle, .. } => {
                *cycle
            }
        }
    }
}

/// Loads media asynchronously and reports completion as a [`ViewEvent`].
pub trait MediaLoader {
    fn load(&self, request: MediaRequest, events: Sender<ViewEvent>);
}

/// Decodes each request on its own worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadedMediaLoader;

impl MediaLoader for ThreadedMediaLoader {
    fn load(&self, request: MediaRequest, events: Sender<ViewEvent>) {
        std::thread::spawn(move || {
            let (slot, cycle) = (request.slot(), request.cycle());
            let event = match decode_request(request) {
                Ok(media) => ViewEvent::MediaLoaded { slot, cycle, media },
                Err(message) => ViewEvent::MediaFailed {
                    slot,
                    cycle,
                    message,
                },
            };
            let _ = events.send(event);
        });
    }
}

pub fn decode_request(request: MediaRequest) -> Result<LoadedMedia, String> {
    match request {
        MediaRequest::QueryImage { bytes, .. } => LoadedMedia::decode(&bytes),
        MediaRequest::ResultVideo { matched_frame, .. } => {
            let bytes = matched_frame
                .as_deref()
                .and_then(decode_data_url)
                .ok_or_else(|| "the backend did not send a preview frame for this video".to_string())?;
            LoadedMedia::decode(&bytes)
        }
    }
}
