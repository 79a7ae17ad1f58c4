use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::model::task::Task;
use crate::repository::traits::TaskRepository;
use crate::repository::{decode_tasks, encode_tasks, TASKS_KEY};

#[derive(Debug, Clone)]
pub struct FileTaskRepository {
    file_path: PathBuf,
}

impl FileTaskRepository {
    /// Opens the slot `<data_dir>/tasks.json`, creating `data_dir` if needed.
    pub fn new(data_dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(data_dir).map_err(|source| PersistenceError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let file_path = data_dir.join(format!("{}.json", TASKS_KEY));

        Ok(FileTaskRepository { file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn write_atomically(&self, contents: &str) -> Result<(), PersistenceError> {
        let tmp_path = self.file_path.with_extension("json.tmp");
        let io_err = |source| PersistenceError::Io {
            path: self.file_path.clone(),
            source,
        };

        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(contents.as_bytes()).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, &self.file_path).map_err(io_err)
    }
}

impl TaskRepository for FileTaskRepository {
    fn load(&self) -> Vec<Task> {
        match fs::read_to_string(&self.file_path) {
            Ok(raw) => decode_tasks(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.file_path.display(), "could not read task slot");
                Vec::new()
            }
        }
    }

    fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        let contents = encode_tasks(tasks)?;
        self.write_atomically(&contents)?;
        tracing::debug!(count = tasks.len(), path = %self.file_path.display(), "saved tasks");
        Ok(())
    }
}
