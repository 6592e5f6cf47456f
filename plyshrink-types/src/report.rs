/// Итог одной операции прореживания.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeReport {
    /// Записей, объявленных во входном заголовке
    pub source_count: u64,
    /// Записей фактически записано в выходной поток
    pub records_written: u64,
    /// Число, объявленное в `element vertex` выходного заголовка.
    ///
    /// Может быть больше `records_written`, если payload входного файла
    /// короче объявленного.
    pub declared_count: u64,
    /// Байт заголовка
    pub header_bytes: u64,
    /// Байт данных записей
    pub payload_bytes: u64,
    /// Всего байт (заголовок + данные)
    pub bytes_written: u64,
}

impl SizeReport {
    /// Выходной заголовок объявляет больше записей, чем записано.
    pub fn is_short(&self) -> bool {
        self.records_written < self.declared_count
    }
}
