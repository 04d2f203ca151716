// ============================================
// Core Module - Конфиг, ошибки, диагностика
// ============================================

mod config;
mod diagnostics;
mod error;

pub use config::{ConvertConfig, DEFAULT_LAYOUT_FILE, MAX_HEIGHT_PLANE};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticsSink, LogSink};
pub use error::{ConvertError, ConvertResult};
