use std::path::PathBuf;

use plyshrink_types::PlyError;
use thiserror::Error;

pub type ShrinkResult<T> = std::result::Result<T, ShrinkError>;

#[derive(Debug, Error)]
pub enum ShrinkError {
    /// Ошибка обработки конкретного файла (путь всегда в сообщении)
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: PlyError,
    },

    /// Ошибка формата PLY
    #[error("PLY error: {0}")]
    Ply(#[from] PlyError),

    /// Ошибка ввода/вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка упаковки gzip/lz4
    #[error("Compression error: {0}")]
    Compression(String),

    /// Некорректная конфигурация
    #[error("Config error: {0}")]
    Config(String),

    /// Ошибка пайплайна (inter-thread)
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

impl ShrinkError {
    /// Оборачивает ошибку с путём файла.
    pub fn file<P: Into<PathBuf>, E: Into<PlyError>>(
        path: P,
        source: E,
    ) -> Self {
        Self::File {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Вид ошибки для отчёта.
    pub fn kind(&self) -> &'static str {
        match self {
            ShrinkError::File { source, .. } | ShrinkError::Ply(source) => source.kind(),
            ShrinkError::Io(_) => "IOError",
            ShrinkError::Compression(_) => "Compression",
            ShrinkError::Config(_) => "Config",
            ShrinkError::Pipeline(_) => "Pipeline",
        }
    }
}
