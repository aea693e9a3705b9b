use emgmm_mixture::*;
use std::path::Path;
use std::path::PathBuf;

/// A model parameter file on disk, of known shape.
///
/// Jobs read the snapshot at startup and only the reducer writes it.
/// Writes go through a sibling temporary file and a rename, so a reader
/// sees either the previous parameters or the new ones, never a mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    path: PathBuf,
    dim: usize,
    components: usize,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>, dim: usize, components: usize) -> Self {
        Self {
            path: path.into(),
            dim,
            components,
        }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn dim(&self) -> usize {
        self.dim
    }
    pub fn components(&self) -> usize {
        self.components
    }
    /// check if file exists on disk
    pub fn done(&self) -> bool {
        std::fs::metadata(&self.path).is_ok()
    }

    /// read from disk
    pub fn load(&self) -> Result<Mixture> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingParameterFile(self.path.clone()));
            }
            Err(e) => return Err(Error::Io(e)),
        };
        log::debug!("{:<32}{:<32}", "loaded parameters", self.path.display());
        Mixture::decode(&text, self.dim, self.components)
    }

    /// write to disk
    pub fn save(&self, model: &Mixture) -> Result<()> {
        if (model.dim(), model.components()) != (self.dim, self.components) {
            return Err(Error::ShapeMismatch {
                expected: (self.components, self.dim),
                found: (model.components(), model.dim()),
            });
        }
        self.save_text(&model.encode())
    }

    /// Writes already-encoded parameters, e.g. a reducer's output.
    pub fn save_text(&self, parameters: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let ref temp = self.temp();
        std::fs::write(temp, parameters)?;
        std::fs::rename(temp, &self.path)?;
        log::debug!("{:<32}{:<32}", "saved parameters", self.path.display());
        Ok(())
    }

    /// Loads the snapshot, or falls back to a seeded random model when no
    /// parameter file exists yet. Any other failure is propagated.
    pub fn load_or_random(&self, seed: u64) -> Result<Mixture> {
        match self.load() {
            Err(Error::MissingParameterFile(path)) => {
                log::warn!(
                    "no parameters at {}, starting from random seed {}",
                    path.display(),
                    seed
                );
                let mut model = Mixture::new(self.dim, self.components)?;
                model.initialize_random(seed);
                Ok(model)
            }
            result => result,
        }
    }

    fn temp(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
