//! Normalize survey photos and stamp GPS metadata as a corner watermark.
//!
//! An uploaded photograph is normalized to a fixed output resolution
//! (aspect-preserving resize-to-cover plus center-crop), a translucent
//! caption panel with the survey metadata is composited into the
//! bottom-left corner, and the result is encoded as a downloadable JPEG.
//!
//! # Quick Start
//!
//! ```no_run
//! use geostamp::{Caption, Engine, PipelineConfig};
//!
//! let engine = Engine::new(PipelineConfig::default());
//! let upload = std::fs::read("photo.jpg").unwrap();
//! let caption = Caption::new([
//!     Some("48.2082".to_string()),
//!     Some("16.3738".to_string()),
//!     None, None, None, None, None,
//! ]);
//! let jpeg = engine.process(&upload, &caption).unwrap();
//! std::fs::write("processed_photo.jpg", jpeg).unwrap();
//! ```
//!
//! # HTTP boundary
//!
//! With the `server` feature (on by default), [`server::router`] exposes
//! the pipeline as a single upload endpoint; the `geostamp-server`
//! binary serves it. The boundary is a thin wrapper — all behavior lives
//! in the library and is reachable without it.

#![deny(missing_docs)]

pub mod caption;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod error;
pub mod font;
pub mod geometry;
mod pipeline;
#[cfg(feature = "server")]
pub mod server;

pub use caption::Caption;
pub use compositor::WatermarkSpec;
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use font::{FontFace, FontSource};
pub use pipeline::{suggested_filename, Engine};
