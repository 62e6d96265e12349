//! # Cost Core
//!
//! 成本計算核心資料模型與類型定義

pub mod catalog;
pub mod config;
pub mod costs;
pub mod inventory;
pub mod product;
pub mod rates;
pub mod resolver;
pub mod result;
pub mod technology;

// Re-export 主要類型
pub use catalog::TechnologyCatalog;
pub use config::{
    round_half_up, CostCalculationRequest, MaterialCostsUsed, SourceOfOperationCosts,
    StandardLaborCost, DEFAULT_SCALE,
};
pub use costs::{ProductCostNorms, ProductCostTable};
pub use inventory::{StockLevel, StockTable};
pub use product::{Product, ProductComponent, SizeVariant};
pub use rates::{OperationRateTable, OperationRates};
pub use resolver::{PriceResolver, RateResolver, StockResolver, TechnologyLoader};
pub use result::{CalculationResult, ComponentCost, MaterialCostLine, OperationCostLine};
pub use technology::{compare_node_numbers, NodeId, Operation, Technology, TechnologyNode, TimeNorms};

/// 成本計算錯誤類型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostError {
    #[error("無效的工藝 {technology}: {reason}")]
    InvalidTechnology { technology: String, reason: String },

    #[error("找不到工藝: {0}")]
    TechnologyNotFound(String),

    #[error("找不到工藝節點: {0}")]
    NodeNotFound(usize),

    #[error("無效的計算請求: {0}")]
    InvalidRequest(String),

    #[error("資料格式錯誤: {0}")]
    Serialization(String),

    #[error("數值溢位: {0}")]
    Overflow(String),
}

impl CostError {
    /// 建立 InvalidTechnology 錯誤
    pub fn invalid_technology(technology: &str, reason: impl Into<String>) -> Self {
        Self::InvalidTechnology {
            technology: technology.to_string(),
            reason: reason.into(),
        }
    }

    /// 建立 Overflow 錯誤
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::Overflow(context.into())
    }

    /// 是否只影響單一工藝（其他工藝可繼續計算）
    pub fn is_technology_scoped(&self) -> bool {
        matches!(
            self,
            Self::InvalidTechnology { .. }
                | Self::TechnologyNotFound(_)
                | Self::NodeNotFound(_)
                | Self::Overflow(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CostError>;
