//! Create a new project directory

use std::fs;

use sheetsync_fs::{NormalizedPath, ProjectPath};

use crate::config::ProjectConfig;
use crate::fields::builtin_fields;
use crate::manifest::{FormatRegistry, FormatRow, ManifestStore, NoteRow, ValidationRow};
use crate::remote::Spreadsheet;
use crate::{Error, Result};

/// Options for [`init`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Display title stored in `config.tsv`
    pub title: String,
    /// Location of the file-backed remote, when not the default
    pub remote: Option<String>,
}

/// Create `.sheetsync/` under `root` for the spreadsheet behind `remote`.
///
/// Seeds `config.tsv`, the header-only manifest tables, the built-in
/// fields, the applied formats and the cache directory.
///
/// # Errors
///
/// Returns [`Error::Conflict`] if `root` already holds a project. Any later
/// failure removes the partially created directory before returning.
pub fn init(root: &NormalizedPath, remote: &dyn Spreadsheet, options: &InitOptions) -> Result<ProjectConfig> {
    let project_dir = root.join(ProjectPath::ProjectDir.as_str());
    if project_dir.exists() {
        return Err(Error::conflict(format!(
            "A sheetsync project already exists in {}",
            root
        )));
    }
    if options.title.trim().is_empty() {
        return Err(Error::invalid_input("A project title is required"));
    }

    let spreadsheet_id = remote.spreadsheet_id()?;
    let mut config = ProjectConfig::new(spreadsheet_id, options.title.trim());
    config.remote = options.remote.clone();

    let store = ManifestStore::new(project_dir.clone());
    if let Err(e) = seed(&store, &config) {
        tracing::error!("Unable to create project in {}: {}", root, e);
        if let Err(cleanup) = fs::remove_dir_all(project_dir.to_native()) {
            tracing::warn!("Could not remove {}: {}", project_dir, cleanup);
        }
        return Err(e);
    }

    tracing::info!(title = %config.title, id = %config.spreadsheet_id, "Initialized project");
    Ok(config)
}

fn seed(store: &ManifestStore, config: &ProjectConfig) -> Result<()> {
    fs::create_dir_all(store.path(ProjectPath::CacheDir).to_native())?;
    config.save(&store.path(ProjectPath::Config))?;
    store.replace_sheets(&[])?;
    store.save_fields(&builtin_fields())?;
    store.replace_attributes::<FormatRow>(&[])?;
    store.replace_attributes::<NoteRow>(&[])?;
    store.replace_attributes::<ValidationRow>(&[])?;
    store.save_format_registry(&FormatRegistry::with_applied_formats())?;
    Ok(())
}
