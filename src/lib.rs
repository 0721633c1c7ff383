//! # Lottie Player
//!
//! Loads Lottie vector animations and renders any frame into a pixel
//! buffer with a software rasterizer.
//!
//! ```no_run
//! use lottie_player::Animation;
//!
//! let animation = Animation::from_file("loader.json")?;
//! let mut surface = animation.surface()?;
//! let frame = animation.frame_at_pos(0.5);
//! animation.render_sync(frame, &mut surface)?;
//! # Ok::<(), lottie_player::RenderError>(())
//! ```

pub mod animation;
pub mod config;
pub mod errors;

pub use animation::{Animation, RenderTask};
pub use config::RenderConfig;
pub use errors::RenderError;
pub use lottie_core::{Composition, LoadError, RenderTree};
pub use lottie_raster::{PixelFormat, Surface, SurfaceError};
