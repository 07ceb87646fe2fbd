// Display-side state for the portfolio panels.
// Card projections, the filterable gallery, and the showcase carousel.

pub mod card;
pub mod carousel;
pub mod gallery;

pub use card::{CardOptions, RenderableCard};
pub use carousel::{CardPosition, Carousel};
pub use gallery::{GalleryState, merge_projects};
