mod admin;
mod bridge;
mod content;
mod files;

pub use admin::health;
pub use bridge::{fs_delete, fs_list, fs_write};
pub use content::{file_content, file_preview};
pub use files::{add_files, clear_files, get_file, list_files, remove_file, stored_files};
