use thiserror::Error;

/// Результат для операций над PLY файлами
pub type PlyResult<T> = std::result::Result<T, PlyError>;

/// Типы ошибок разбора и прореживания PLY.
#[derive(Debug, Error)]
pub enum PlyError {
    /// Не PLY файл (неверное магическое слово) или битая строка заголовка
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Кодировка данных не бинарная
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Коэффициент прореживания вне диапазона (0, 2]
    #[error("Invalid resolution: {0} (expected a value in (0, 2])")]
    InvalidResolution(f64),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlyError {
    /// Удобные конструкторы
    pub fn invalid_format<S: Into<String>>(s: S) -> Self {
        Self::InvalidFormat(s.into())
    }

    pub fn unsupported_format<S: Into<String>>(s: S) -> Self {
        Self::UnsupportedFormat(s.into())
    }

    /// Короткое имя вида ошибки (для отчётов batch-режима).
    pub fn kind(&self) -> &'static str {
        match self {
            PlyError::InvalidFormat(_) => "InvalidFormat",
            PlyError::UnsupportedFormat(_) => "UnsupportedFormat",
            PlyError::InvalidResolution(_) => "InvalidResolution",
            PlyError::Io(_) => "IOError",
        }
    }
}
