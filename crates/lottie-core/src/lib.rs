pub mod animatable;
pub mod bezier;
pub mod composition;
pub mod contour;
pub mod dash;
pub mod error;
pub mod evaluator;
pub mod gradient;
pub mod import;
pub mod renderer;
pub mod repeater;
pub mod scene;
pub mod shapes;
pub mod transform;
pub mod trim;

pub use composition::Composition;
pub use error::LoadError;
pub use renderer::*;
