// ============================================
// Block - Блок исходного мира
// ============================================

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace по умолчанию для ID без двоеточия
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Блок мира: namespace, id и свойства состояния.
/// Свойства в BTreeMap, чтобы равенство и хэш не зависели от порядка.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Block {
    pub namespace: String,
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Block {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Разобрать "namespace:id" (без namespace - minecraft)
    pub fn parse(name: &str) -> Self {
        match name.split_once(':') {
            Some((namespace, id)) => Self::new(namespace, id),
            None => Self::new(DEFAULT_NAMESPACE, name),
        }
    }

    pub fn air() -> Self {
        Self::new(DEFAULT_NAMESPACE, "air")
    }

    /// Добавить свойство состояния
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Полное имя "namespace:id"
    pub fn name(&self) -> String {
        format!("{}:{}", self.namespace, self.id)
    }

    /// Сравнение имени без аллокации
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        match name.split_once(':') {
            Some((namespace, id)) => self.namespace == namespace && self.id == id,
            None => self.namespace == DEFAULT_NAMESPACE && self.id == name,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)?;
        if !self.properties.is_empty() {
            let props: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "[{}]", props.join(","))?;
        }
        Ok(())
    }
}
