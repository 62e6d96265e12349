//! 工藝目錄（記憶體內工藝載入器）

use std::collections::HashMap;

use crate::resolver::TechnologyLoader;
use crate::technology::Technology;
use crate::{CostError, Result};

/// 依主產品編號索引的工藝目錄
#[derive(Debug, Clone, Default)]
pub struct TechnologyCatalog {
    technologies: HashMap<String, Technology>,
}

impl TechnologyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加工藝（同一產品後加者覆蓋）
    pub fn insert(&mut self, technology: Technology) {
        self.technologies
            .insert(technology.product.number.clone(), technology);
    }

    /// 從 JSON 陣列載入
    ///
    /// 節點只需給出 `parent`，`children` 會依此補齊
    pub fn from_json(json: &str) -> Result<Self> {
        let technologies: Vec<Technology> =
            serde_json::from_str(json).map_err(|e| CostError::Serialization(e.to_string()))?;

        let mut catalog = Self::new();
        for mut technology in technologies {
            technology.link_children();
            catalog.insert(technology);
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }
}

impl TechnologyLoader for TechnologyCatalog {
    fn load(&self, product_number: &str) -> Result<Technology> {
        self.technologies
            .get(product_number)
            .cloned()
            .ok_or_else(|| CostError::TechnologyNotFound(product_number.to_string()))
    }
}
