mod index;
mod tokenize;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use civic_core::{ApplicationStatus, Program, ProgramInvariantError};
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

pub use index::{CatalogIndex, SearchHit};
pub use tokenize::tokenize;

const DEFAULT_CATALOG: &str = include_str!("../data/default_catalog.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed reading catalog file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed parsing catalog file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid program in {}: {source}", .path.display())]
    InvalidProgram {
        path: PathBuf,
        source: ProgramInvariantError,
    },
    #[error("program id {id} appears more than once")]
    DuplicateProgram { id: String },
    #[error("catalog directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),
}

/// Programs plus the application-status map, as shipped to the engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogBundle {
    #[serde(default)]
    pub programs: Vec<Program>,
    #[serde(default)]
    pub applications: Vec<ApplicationStatus>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Bundle(CatalogBundle),
    Programs(Vec<Program>),
}

impl CatalogBundle {
    fn merge(&mut self, other: CatalogBundle) {
        self.programs.extend(other.programs);
        self.applications.extend(other.applications);
    }

    fn validate(&self, path: &Path) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for program in &self.programs {
            program
                .validate()
                .map_err(|source| CatalogError::InvalidProgram {
                    path: path.to_path_buf(),
                    source,
                })?;
            if !seen.insert(program.id.as_str()) {
                return Err(CatalogError::DuplicateProgram {
                    id: program.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The catalog compiled into the binary.
pub fn default_bundle() -> Result<CatalogBundle, CatalogError> {
    let path = Path::new("<built-in>");
    let bundle = parse_catalog(DEFAULT_CATALOG, path)?;
    bundle.validate(path)?;
    Ok(bundle)
}

/// Loads every `.json` file under `root`, in file-name order. A file holds
/// either a bare program array or an object with `programs` and
/// `applications`.
pub fn load_catalog_dir(root: impl AsRef<Path>) -> Result<CatalogBundle, CatalogError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(CatalogError::MissingDirectory(root.to_path_buf()));
    }

    let mut bundle = CatalogBundle::default();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(%error, "skipping unreadable catalog entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("json"))
    {
        let path = entry.path();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        bundle.merge(parse_catalog(&raw, path)?);
    }

    bundle.validate(root)?;
    info!(
        root = %root.display(),
        programs = bundle.programs.len(),
        applications = bundle.applications.len(),
        "catalog loaded"
    );
    Ok(bundle)
}

fn parse_catalog(raw: &str, path: &Path) -> Result<CatalogBundle, CatalogError> {
    let file: CatalogFile = serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(match file {
        CatalogFile::Bundle(bundle) => bundle,
        CatalogFile::Programs(programs) => CatalogBundle {
            programs,
            applications: Vec::new(),
        },
    })
}
