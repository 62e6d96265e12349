//! 成本計算請求（計算參數配置）

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CostError, Result};

/// 預設金額小數位數
pub const DEFAULT_SCALE: u32 = 2;

/// Decimal 可表示的最大小數位數
const MAX_SCALE: u32 = 28;

/// 成本計算請求
///
/// 一次計算的全部輸入參數，計算期間不可變
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCalculationRequest {
    /// 計算ID
    pub id: Uuid,

    /// 計算編號
    pub number: String,

    /// 計算日期
    pub date: NaiveDate,

    /// 目標產量（必須 > 0）
    pub quantity: Decimal,

    /// 物料成本來源
    pub material_costs_used: MaterialCostsUsed,

    /// 未指定成本時是否使用名義成本
    pub use_nominal_cost_price_not_specified: bool,

    /// 人工成本來源
    pub source_of_operation_costs: SourceOfOperationCosts,

    /// 物料成本加成（%）
    pub material_cost_margin: Decimal,

    /// 人工成本加成（%）
    pub production_cost_margin: Decimal,

    /// 額外管理費（金額）
    pub additional_overhead: Decimal,

    /// 登記價格管理費（%）
    pub registration_price_overhead: Decimal,

    /// 利潤（%）
    pub profit: Decimal,

    /// 是否拆解零組件成本
    pub include_components: bool,

    /// 是否依尺寸組拆分物料成本
    #[serde(default)]
    pub materials_by_size: bool,

    /// 庫存查詢庫位（僅供報表參考）
    #[serde(default)]
    pub location: Option<String>,

    /// 金額小數位數
    #[serde(default = "default_scale")]
    pub scale: u32,
}

fn default_scale() -> u32 {
    DEFAULT_SCALE
}

impl CostCalculationRequest {
    /// 創建新的計算請求（預設：名義成本、工時定額、無加成）
    pub fn new(number: impl Into<String>, date: NaiveDate, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            date,
            quantity,
            material_costs_used: MaterialCostsUsed::Nominal,
            use_nominal_cost_price_not_specified: false,
            source_of_operation_costs: SourceOfOperationCosts::TechnologyOperation,
            material_cost_margin: Decimal::ZERO,
            production_cost_margin: Decimal::ZERO,
            additional_overhead: Decimal::ZERO,
            registration_price_overhead: Decimal::ZERO,
            profit: Decimal::ZERO,
            include_components: false,
            materials_by_size: false,
            location: None,
            scale: DEFAULT_SCALE,
        }
    }

    /// 建構器模式：設置物料成本來源
    pub fn with_material_costs_used(mut self, policy: MaterialCostsUsed) -> Self {
        self.material_costs_used = policy;
        self
    }

    /// 建構器模式：未指定成本時退回名義成本
    pub fn with_nominal_fallback(mut self, enabled: bool) -> Self {
        self.use_nominal_cost_price_not_specified = enabled;
        self
    }

    /// 建構器模式：設置人工成本來源
    pub fn with_source_of_operation_costs(mut self, source: SourceOfOperationCosts) -> Self {
        self.source_of_operation_costs = source;
        self
    }

    /// 建構器模式：設置物料與人工加成（%）
    pub fn with_margins(mut self, material_cost_margin: Decimal, production_cost_margin: Decimal) -> Self {
        self.material_cost_margin = material_cost_margin;
        self.production_cost_margin = production_cost_margin;
        self
    }

    /// 建構器模式：設置額外管理費
    pub fn with_additional_overhead(mut self, overhead: Decimal) -> Self {
        self.additional_overhead = overhead;
        self
    }

    /// 建構器模式：設置登記價格管理費（%）
    pub fn with_registration_price_overhead(mut self, overhead: Decimal) -> Self {
        self.registration_price_overhead = overhead;
        self
    }

    /// 建構器模式：設置利潤（%）
    pub fn with_profit(mut self, profit: Decimal) -> Self {
        self.profit = profit;
        self
    }

    /// 建構器模式：拆解零組件成本
    pub fn with_include_components(mut self, include: bool) -> Self {
        self.include_components = include;
        self
    }

    /// 建構器模式：依尺寸組拆分物料
    pub fn with_materials_by_size(mut self, by_size: bool) -> Self {
        self.materials_by_size = by_size;
        self
    }

    /// 建構器模式：設置庫存查詢庫位
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// 建構器模式：設置金額小數位數
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// 從 JSON 載入請求
    pub fn from_json(json: &str) -> Result<Self> {
        let request: Self =
            serde_json::from_str(json).map_err(|e| CostError::Serialization(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// 檢查請求參數
    pub fn validate(&self) -> Result<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(CostError::InvalidRequest(format!(
                "產量必須大於 0，實際為 {}",
                self.quantity
            )));
        }

        if self.scale > MAX_SCALE {
            return Err(CostError::InvalidRequest(format!(
                "小數位數不可超過 {}，實際為 {}",
                MAX_SCALE, self.scale
            )));
        }

        if let SourceOfOperationCosts::StandardLaborCosts(standard) = &self.source_of_operation_costs {
            if standard.labor_cost < Decimal::ZERO {
                return Err(CostError::InvalidRequest(format!(
                    "標準人工成本 {} 不可為負",
                    standard.number
                )));
            }
        }

        Ok(())
    }

    /// 四捨五入至請求的小數位數
    pub fn round(&self, value: Decimal) -> Decimal {
        round_half_up(value, self.scale)
    }

    /// 是否使用工時定額計算人工成本
    pub fn uses_time_norms(&self) -> bool {
        matches!(
            self.source_of_operation_costs,
            SourceOfOperationCosts::TechnologyOperation
        )
    }
}

/// 四捨五入（half-up）
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// 物料成本來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialCostsUsed {
    /// 名義成本
    Nominal,
    /// 最後採購成本
    LastPurchase,
    /// 平均成本
    Average,
    /// 手動指定成本
    Specified,
}

/// 標準人工成本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardLaborCost {
    /// 編號
    pub number: String,

    /// 名稱
    pub name: String,

    /// 固定人工成本（與工藝樹無關）
    pub labor_cost: Decimal,
}

impl StandardLaborCost {
    pub fn new(number: impl Into<String>, name: impl Into<String>, labor_cost: Decimal) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            labor_cost,
        }
    }
}

/// 人工成本來源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceOfOperationCosts {
    /// 依工序工時定額 × 費率
    TechnologyOperation,
    /// 固定標準人工成本
    StandardLaborCosts(StandardLaborCost),
}
