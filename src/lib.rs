//! Editing core for directB2S backglass files.
//!
//! A directB2S file describes the backglass shown behind a virtual pinball
//! table: a backglass image, an optional DMD image, illumination regions
//! ("bulbs") lit by the running game, score displays and lamp animations.
//! This crate is the editor behind it. It holds the document model, the undo
//! history, selection, hit-testing and the pointer/keyboard state machine,
//! and draws the canvas when compiled to WebAssembly. The XML file format,
//! native windows and pixel filters belong to the host and are reached
//! through [`codec::DocumentCodec`], [`platform::Platform`] and
//! [`engine::Action::ImageOpRequested`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | File lifecycle around the engine: new, open, save, close |
//! | [`engine`] | Input handling, commands, and the testable [`engine::EngineCore`] |
//! | [`session`] | Per-window document, selection, history and notifications |
//! | [`ops`] | Every user-facing document edit, one transaction each |
//! | [`undo`] | Snapshot-based undo/redo with a save point |
//! | [`doc`] | Document model and entity geometry |
//! | [`selection`] | Selected bulbs and scores plus the primary entity |
//! | [`command`] | Menu and toolbar commands |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types, click modes and the gesture state machine |
//! | [`hit`] | Hit-testing of entities, handles and overlay controls |
//! | [`render`] | Canvas drawing of the active surface and overlays |
//! | [`events`] | Observer bus for session notifications |
//! | [`console`] | Model of the log panel |
//! | [`codec`] | Document codec trait and the JSON codec |
//! | [`platform`] | Host services: dialogs, file writes, settings storage |
//! | [`settings`] | Persisted user settings |
//! | [`consts`] | Shared numeric constants (zoom limits, handle sizes, caps) |

pub mod camera;
pub mod codec;
pub mod command;
pub mod console;
pub mod consts;
pub mod doc;
pub mod editor;
pub mod engine;
pub mod events;
pub mod hit;
pub mod input;
pub mod ops;
pub mod platform;
pub mod render;
pub mod selection;
pub mod session;
pub mod settings;
pub mod undo;
