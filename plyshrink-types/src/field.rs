/// Скалярный тип свойства PLY
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    /// `float`: 32-битное число с плавающей точкой
    Float32,
    /// `uchar`: беззнаковый байт
    UChar8,
    /// `int`: 32-битное знаковое целое
    Int32,
    /// `uint`: 32-битное беззнаковое целое
    UInt32,
    /// Любой другой токен (`double`, `short`, `list`, ...). Ширина считается
    /// нулевой.
    Other(String),
}

impl ScalarType {
    /// Разбирает токен типа из строки `property <type> <name>`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "float" => ScalarType::Float32,
            "uchar" => ScalarType::UChar8,
            "int" => ScalarType::Int32,
            "uint" => ScalarType::UInt32,
            other => ScalarType::Other(other.to_string()),
        }
    }

    /// Токен типа в том виде, в каком он записывается в заголовок.
    pub fn as_token(&self) -> &str {
        match self {
            ScalarType::Float32 => "float",
            ScalarType::UChar8 => "uchar",
            ScalarType::Int32 => "int",
            ScalarType::UInt32 => "uint",
            ScalarType::Other(s) => s,
        }
    }

    /// Размер значения в байтах внутри записи.
    pub fn byte_width(&self) -> usize {
        match self {
            ScalarType::Float32 => 4,
            ScalarType::UChar8 => 1,
            ScalarType::Int32 => 4,
            ScalarType::UInt32 => 4,
            ScalarType::Other(_) => 0,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ScalarType::Other(_))
    }
}

/// Описание одного свойства записи (`property <type> <name>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub scalar: ScalarType,
}

impl FieldSpec {
    pub fn new<S: Into<String>>(
        name: S,
        scalar: ScalarType,
    ) -> Self {
        Self {
            name: name.into(),
            scalar,
        }
    }
}

impl std::fmt::Display for FieldSpec {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{} {}", self.scalar.as_token(), self.name)
    }
}
