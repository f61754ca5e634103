use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "lexicards", "Lexicards") {
        pd.data_dir().to_path_buf()
    } else {
        // Fallback: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn store_file_in(dir: &Path) -> (PathBuf, PathBuf) {
    (dir.join("lexicards.json"), dir.join("backups"))
}

pub fn default_store_file() -> (PathBuf, PathBuf) {
    store_file_in(&data_root())
}
