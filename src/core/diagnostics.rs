// ============================================
// Diagnostics - Канал предупреждений конвертера
// ============================================
// Детекция отделена от вывода: конвертер пишет в sink,
// а что с этим делать - решает вызывающий код.

use std::fmt;

use crate::blocks::Block;

/// Предупреждение, не прерывающее конвертацию
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Исходный блок не найден в таблице - вместо него воздух
    UnmappedSource { block: Block },
    /// Пара id/aux тайла не найдена в таблице - воксель пропущен
    UnmappedTarget { id: u8, aux: u8 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmappedSource { block } => {
                write!(f, "{} is not mapped to anything, it will be replaced by air", block)
            }
            Diagnostic::UnmappedTarget { id, aux } => {
                write!(f, "tile block {}:{} is not mapped to anything, it will be skipped", id, aux)
            }
        }
    }
}

/// Приёмник предупреждений
pub trait DiagnosticsSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Любой callback тоже годится как sink
impl<F: FnMut(Diagnostic)> DiagnosticsSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Sink по умолчанию: пишет в log::warn!
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

/// Собирает предупреждения в список (тесты, итоговая сводка)
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
