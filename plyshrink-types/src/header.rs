use crate::FieldSpec;

/// Строка текстового заголовка PLY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    /// Строка, переносимая в выходной файл без изменений
    Text(String),
    /// Строка `element vertex <N>` с исходным числом; при записи
    /// подставляется `N / sample_step`
    VertexCount(u64),
}

/// Разобранный заголовок PLY файла.
#[derive(Debug, Clone, Default)]
pub struct PlyHeader {
    /// Строки заголовка по порядку, от `ply` до `end_header` включительно
    pub lines: Vec<HeaderLine>,
    /// Количество вершин из строки `element vertex`
    pub record_count: u64,
    /// Строка `format` содержит `binary`
    pub is_binary: bool,
    /// Свойства по порядку объявления
    pub fields: Vec<FieldSpec>,
}

impl PlyHeader {
    /// Размер одной записи в байтах (неизвестные типы дают 0).
    pub fn bytes_per_record(&self) -> usize {
        self.fields.iter().map(|f| f.scalar.byte_width()).sum()
    }

    /// Строки заголовка в текстовом виде. Каждая строка `element vertex`
    /// получает своё число, делённое на `sample_step`.
    pub fn render_lines(
        &self,
        sample_step: u64,
    ) -> Vec<String> {
        let step = sample_step.max(1);

        self.lines
            .iter()
            .map(|line| match line {
                HeaderLine::Text(s) => s.clone(),
                HeaderLine::VertexCount(count) => format!("element vertex {}", count / step),
            })
            .collect()
    }

    /// Есть ли свойство с данным именем.
    pub fn has_field(
        &self,
        name: &str,
    ) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Цвета: наличие свойства `red`.
    pub fn has_colors(&self) -> bool {
        self.has_field("red")
    }

    /// Нормали: наличие свойства `nx`.
    pub fn has_normals(&self) -> bool {
        self.has_field("nx")
    }
}
