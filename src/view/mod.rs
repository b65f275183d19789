pub mod controller;
pub mod media;
pub mod messages;
pub mod selection;
pub mod state;

pub use controller::{SearchTrigger, ViewController};
pub use media::{LoadedMedia, MediaElement, MediaLoader, MediaRequest, ThreadedMediaLoader};
pub use messages::ViewEvent;
pub use selection::{ResultSelection, SelectionChange};
pub use state::{can_transition, ViewState, ViewStateKind};
