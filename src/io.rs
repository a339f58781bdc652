//! Reading and writing unit packages
//!
//! A unit package is a directory with the model description as JSON and an optional
//! process diagram. This module loads such packages into a [`Unit`], writes units back
//! out and locates the process diagram.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

use crate::{
    engine::error::EngineError,
    session::naming::{initial_value_path, InitialValueMarker},
    unit::{
        description::ModelDescription,
        dynamics::{Dynamics, Unit},
        yeast::{YeastBatch, MODEL_NAME as YEAST_BATCH},
    },
};

/// File holding the model description inside a unit package.
pub const DESCRIPTION_FILE: &str = "modelDescription.json";
/// Process diagram inside a unit package.
pub const DIAGRAM_FILE: &str = "documentation/processDiagram.png";

/// Loads a model description from a JSON file.
///
/// # Errors
///
/// * The file cannot be opened (`IOError::FileNotFound`)
/// * The contents are not a valid model description (`IOError::JsonParseError`)
pub fn load_description(path: impl Into<PathBuf>) -> Result<ModelDescription, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(file).map_err(IOError::JsonParseError)
}

/// Saves a model description as pretty-printed JSON.
///
/// # Errors
///
/// * The file cannot be created (`IOError::FileNotFound`)
/// * The description cannot be serialized (`IOError::JsonParseError`)
pub fn save_description(
    path: impl Into<PathBuf>,
    description: &ModelDescription,
) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(file, description).map_err(IOError::JsonParseError)
}

impl Unit {
    /// Loads a unit package directory.
    ///
    /// The package holds `modelDescription.json` and optionally
    /// `documentation/processDiagram.png`. The description is paired with the dynamics
    /// registered for its model name.
    ///
    /// # Arguments
    ///
    /// * `dir` - Path of the package directory
    ///
    /// # Returns
    ///
    /// The unit, remembering `dir` as its package.
    ///
    /// # Errors
    ///
    /// * [`EngineError::Package`] if the description is missing or not valid JSON
    /// * [`EngineError::UnknownModel`] if no dynamics are registered for the model name
    pub fn load(dir: impl AsRef<Path>) -> Result<Unit, EngineError> {
        let dir = dir.as_ref();
        let description = load_description(dir.join(DESCRIPTION_FILE))?;
        let dynamics = dynamics_for(&description)?;
        log::info!(
            "Loaded unit '{}' from {}",
            description.model_name,
            dir.display()
        );
        Ok(Unit::new(description, dynamics)?.with_package(dir.to_path_buf()))
    }

    /// Writes the unit as a package directory, creating it if needed.
    ///
    /// A process diagram is carried over when the unit was loaded from a package that
    /// has one.
    ///
    /// # Errors
    ///
    /// Returns an [`IOError`] if the directory or one of its files cannot be written.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<(), IOError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        save_description(dir.join(DESCRIPTION_FILE), self.description())?;

        if let Some(package) = self.package() {
            let diagram = package.join(DIAGRAM_FILE);
            if diagram.is_file() && package != dir {
                std::fs::create_dir_all(dir.join("documentation"))?;
                std::fs::copy(diagram, dir.join(DIAGRAM_FILE))?;
            }
        }
        Ok(())
    }
}

/// Dynamics registered for the model a description declares.
///
/// The initial-value marker is taken from the description: the convention whose
/// initial-value path exists for the first state wins.
pub fn dynamics_for(description: &ModelDescription) -> Result<Arc<dyn Dynamics>, EngineError> {
    match description.model_name.as_str() {
        YEAST_BATCH => Ok(Arc::new(YeastBatch::new(marker_of(description)))),
        other => Err(EngineError::UnknownModel(other.to_string())),
    }
}

/// Initial-value naming convention used by a description.
pub fn marker_of(description: &ModelDescription) -> InitialValueMarker {
    let states = description.state_names();
    [InitialValueMarker::Zero, InitialValueMarker::Start]
        .into_iter()
        .find(|marker| {
            states.first().is_some_and(|state| {
                initial_value_path(state, *marker)
                    .is_ok_and(|path| description.variable(&path).is_some())
            })
        })
        .unwrap_or_default()
}

/// Where a process diagram was found.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramSource {
    /// Inside the unit package
    Package(PathBuf),
    /// The fallback file
    Disk(PathBuf),
}

/// PNG image of the process.
#[derive(Debug, Clone)]
pub struct ProcessDiagram {
    /// Where the image was read from
    pub source: DiagramSource,
    /// Raw PNG data
    pub bytes: Vec<u8>,
}

/// Reads the process diagram from the unit package, falling back to a file on disk.
///
/// # Arguments
///
/// * `unit` - The unit whose package is searched first
/// * `fallback` - File to read when the package has no diagram
///
/// # Returns
///
/// The image bytes together with the place they were read from.
///
/// # Errors
///
/// * [`IOError::DiagramNotFound`] if neither the package nor `fallback` holds a diagram
/// * [`IOError::FileNotFound`] if a diagram exists but cannot be read
pub fn process_diagram(unit: &Unit, fallback: Option<&Path>) -> Result<ProcessDiagram, IOError> {
    if let Some(package) = unit.package() {
        let path = package.join(DIAGRAM_FILE);
        if path.is_file() {
            let bytes = std::fs::read(&path)?;
            return Ok(ProcessDiagram {
                source: DiagramSource::Package(path),
                bytes,
            });
        }
    }

    log::warn!("No processDiagram.png in the unit package, trying the file on disk");
    match fallback {
        Some(path) if path.is_file() => Ok(ProcessDiagram {
            source: DiagramSource::Disk(path.to_path_buf()),
            bytes: std::fs::read(path)?,
        }),
        _ => Err(IOError::DiagramNotFound),
    }
}

/// Represents errors that can occur while reading or writing unit packages.
#[derive(Error, Debug)]
pub enum IOError {
    /// The file could not be found, opened or written.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// The file contents could not be parsed as valid JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// Neither the unit package nor the disk holds a process diagram.
    #[error("No process diagram in the unit package and no such file on disk either")]
    DiagramNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::yeast::yeast_batch_unit;

    #[test]
    fn test_export_and_load_package() {
        let dir = tempfile::tempdir().unwrap();
        let unit = yeast_batch_unit(InitialValueMarker::Zero);
        unit.export(dir.path()).unwrap();

        let loaded = Unit::load(dir.path()).unwrap();
        assert_eq!(loaded.description(), unit.description());
        assert_eq!(loaded.package(), Some(&dir.path().to_path_buf()));
    }

    #[test]
    fn test_marker_of() {
        for marker in [InitialValueMarker::Zero, InitialValueMarker::Start] {
            let unit = yeast_batch_unit(marker);
            assert_eq!(marker_of(unit.description()), marker);
        }
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let mut description = yeast_batch_unit(InitialValueMarker::Start)
            .description()
            .clone();
        description.model_name = "BPL_YEAST_COB.Fedbatch".to_string();
        assert!(matches!(
            dynamics_for(&description),
            Err(EngineError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_load_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        let err = Unit::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, EngineError::Package(IOError::FileNotFound(_))));
    }

    #[test]
    fn test_diagram_falls_back_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let unit = yeast_batch_unit(InitialValueMarker::Start);
        unit.export(dir.path()).unwrap();
        let unit = Unit::load(dir.path()).unwrap();

        let fallback = dir.path().join("diagram.png");
        assert!(matches!(
            process_diagram(&unit, Some(&fallback)),
            Err(IOError::DiagramNotFound)
        ));

        std::fs::write(&fallback, [0x89, b'P', b'N', b'G']).unwrap();
        let diagram = process_diagram(&unit, Some(&fallback)).unwrap();
        assert_eq!(diagram.source, DiagramSource::Disk(fallback));

        std::fs::create_dir_all(dir.path().join("documentation")).unwrap();
        std::fs::write(dir.path().join(DIAGRAM_FILE), [1, 2, 3]).unwrap();
        let diagram = process_diagram(&unit, None).unwrap();
        assert_eq!(diagram.bytes, vec![1, 2, 3]);
        assert!(matches!(diagram.source, DiagramSource::Package(_)));
    }
}
