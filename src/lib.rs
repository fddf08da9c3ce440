//! Annotator - image annotation editor engine
//!
//! A host-agnostic core for drawing, editing and reviewing rectangle, polygon,
//! mask and skeleton annotations on a zoomable image, with AI-assisted
//! annotation over a polled model service.
//!
//! The [`Editor`] owns all state. Hosts feed it pointer events in container
//! coordinates and named commands, and repaint from [`Editor::redraw`].
//! Annotations leave and enter the editor in the persisted format of
//! [`format`].

pub mod ai;
pub mod color;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod format;
pub mod history;
pub mod hit_test;
pub mod mask;
pub mod model;
pub mod render;
pub mod store;
pub mod tools;
pub mod viewport;

pub use ai::{AiError, AiTransport, AiTrigger};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{EditorError, EditorResult};
pub use format::PersistedAnnotation;
pub use render::RenderLayers;
pub use tools::{MouseButton, PointerInput};
pub use viewport::ZoomDirection;
