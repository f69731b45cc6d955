/*
 * This module provides utility functions for path manipulation, focusing on
 * retrieving and ensuring the existence of application-specific directories.
 * The history log's JSON file lives under the per-user local configuration
 * directory resolved here.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

const HISTORY_FILENAME: &str = "history.json";

/*
 * Retrieves the application's primary local configuration directory,
 * creating it if necessary. The path is derived without an organization
 * qualifier, placing it directly under the user's local application data
 * directory structure. Returns None if the directory could not be
 * determined or created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Attempting to get base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| {
        let config_path = proj_dirs.config_local_dir();
        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(config_path) {
                log::error!(
                    "PathUtils: Failed to create base app config directory {config_path:?}: {e}"
                );
                return None;
            }
            log::debug!("PathUtils: Created base app config directory: {config_path:?}");
        } else {
            log::trace!("PathUtils: Base app config directory already exists: {config_path:?}");
        }
        Some(config_path.to_path_buf())
    })
}

/// Location of the persisted history file for this application.
pub fn history_file_path(app_name: &str) -> Option<PathBuf> {
    get_base_app_config_local_dir(app_name).map(|dir| dir.join(HISTORY_FILENAME))
}
