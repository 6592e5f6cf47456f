//! Прореживание бинарных PLY облаков точек
//!
//! Читает текстовый заголовок PLY, считает размер записи по списку свойств и
//! оставляет каждую N-ю вершину, копируя байты записей без изменений.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use std::fs::File;
//!
//! use plyshrink_core::decimate;
//!
//! let input = File::open("scan.ply")?;
//! let output = File::create("scan_low.ply")?;
//! let report = decimate(input, 0.25, output)?;
//! println!("{} points written", report.records_written);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod binary;
pub mod format;
pub mod shrink;

pub use analysis::*;
pub use binary::*;
pub use format::*;
pub use plyshrink_types::*;
pub use shrink::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
