// Description history storage

pub mod history;
pub mod record;

pub use history::History;
pub use record::{DescriptionRecord, ImageInput, COLUMNS};
