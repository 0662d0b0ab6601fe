pub mod describe;
pub mod history;
pub mod info;
pub mod photo;
pub mod text;

pub use describe::{describe_from_url, reply_with_generation};
pub use history::{export_history, show_history};
pub use info::show_system_info;
pub use photo::{describe_uploaded_photo, uploaded_image};
pub use text::help;
