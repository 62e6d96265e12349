//! # Cost Calculation Engine
//!
//! 工藝成本計算引擎：數量展開、物料/人工成本彙總、定價與零組件拆解

pub mod calculator;
mod checked;
pub mod components;
pub mod materials;
pub mod operations;
pub mod pricing;
pub mod quantity;
pub mod snapshot;

// Re-export 主要類型
pub use calculator::{CostCalculator, TechnologyCost};
pub use components::ComponentCostCalculator;
pub use materials::{MaterialCostAggregator, MaterialCosts};
pub use operations::{LabourCostAggregator, LabourCosts};
pub use pricing::{CostBreakdown, PricingCalculator, PricingParameters};
pub use quantity::{InputKind, MaterialKey, NodeRequirement, QuantityPlan, QuantityPropagator};
pub use snapshot::CostSnapshot;

use chrono::NaiveDate;
use cost_core::{
    CalculationResult, ComponentCost, CostError, MaterialCostLine, OperationCostLine,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 成本計算結果（一次請求）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCalculationRun {
    /// 計算ID
    pub calculation_id: Uuid,

    /// 計算編號
    pub number: String,

    /// 計算日期
    pub date: NaiveDate,

    /// 目標產量
    pub quantity: Decimal,

    /// 每個工藝的計算結果（依請求順序）
    pub results: Vec<CalculationResult>,

    /// 物料成本明細
    pub material_costs: Vec<MaterialCostLine>,

    /// 工序成本明細
    pub labour_costs: Vec<OperationCostLine>,

    /// 零組件成本
    pub component_costs: Vec<ComponentCost>,

    /// 無法計算的工藝
    pub failures: Vec<TechnologyFailure>,

    /// 警告信息
    pub warnings: Vec<CostWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl CostCalculationRun {
    /// 創建空的計算結果
    pub fn empty(request: &cost_core::CostCalculationRequest) -> Self {
        Self {
            calculation_id: request.id,
            number: request.number.clone(),
            date: request.date,
            quantity: request.quantity,
            results: Vec::new(),
            material_costs: Vec::new(),
            labour_costs: Vec::new(),
            component_costs: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加單一工藝的結果
    pub fn add_technology(&mut self, cost: TechnologyCost) {
        self.results.push(cost.result);
        self.material_costs.extend(cost.material_costs);
        self.labour_costs.extend(cost.labour_costs);
        self.component_costs.extend(cost.component_costs);
        self.warnings.extend(cost.warnings);
    }

    /// 記錄無法計算的工藝
    pub fn add_failure(&mut self, technology_number: impl Into<String>, error: CostError) {
        self.failures.push(TechnologyFailure {
            technology_number: technology_number.into(),
            error,
        });
    }

    /// 查找指定工藝的結果
    pub fn result_for(&self, technology_number: &str) -> Option<&CalculationResult> {
        self.results
            .iter()
            .find(|r| r.technology_number == technology_number)
    }

    /// 是否所有工藝都已成功計算
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 工藝計算失敗
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyFailure {
    /// 工藝編號；工藝載入失敗時為請求的產品編號
    pub technology_number: String,

    #[serde(with = "error_message")]
    pub error: CostError,
}

/// 失敗原因以訊息字串序列化
mod error_message {
    use cost_core::CostError;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(error: &CostError, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&error.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CostError, D::Error> {
        String::deserialize(deserializer).map(CostError::Serialization)
    }
}

/// 成本警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostWarning {
    /// 工藝編號
    pub technology_number: String,

    /// 相關的物料或工序編號
    pub subject: String,

    pub kind: WarningKind,
    pub message: String,
    pub severity: WarningSeverity,
}

impl CostWarning {
    pub fn new(
        technology_number: impl Into<String>,
        subject: impl Into<String>,
        kind: WarningKind,
        message: impl Into<String>,
        severity: WarningSeverity,
    ) -> Self {
        Self {
            technology_number: technology_number.into(),
            subject: subject.into(),
            kind,
            message: message.into(),
            severity,
        }
    }

    /// 物料未定價
    pub fn missing_price(technology_number: &str, product_number: &str) -> Self {
        Self::new(
            technology_number,
            product_number,
            WarningKind::MissingPrice,
            format!("物料 {} 未定價，成本以 0 計", product_number),
            WarningSeverity::Warning,
        )
    }

    /// 工序缺少費率
    pub fn missing_rate(technology_number: &str, operation_number: &str) -> Self {
        Self::new(
            technology_number,
            operation_number,
            WarningKind::MissingRate,
            format!("工序 {} 缺少費率，成本以 0 計", operation_number),
            WarningSeverity::Warning,
        )
    }
}

/// 警告類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    MissingPrice,
    MissingRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
