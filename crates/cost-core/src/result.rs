//! 成本計算結果模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 計算結果（每個工藝 / 最終產品一筆）
///
/// 金額均已依請求的小數位數四捨五入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// 工藝編號
    pub technology_number: String,

    /// 最終產品編號
    pub product_number: String,

    /// 最終產品單位
    pub unit: String,

    /// 計算產量
    pub quantity: Decimal,

    /// 物料成本
    pub material_costs: Decimal,

    /// 人工成本
    pub labour_cost: Decimal,

    /// 生產成本（物料 + 人工）
    pub production_costs: Decimal,

    /// 物料成本加成金額
    pub material_cost_margin_value: Decimal,

    /// 人工成本加成金額
    pub labour_cost_margin_value: Decimal,

    /// 額外管理費
    pub additional_overhead: Decimal,

    /// 總成本
    pub total_cost: Decimal,

    /// 登記價格管理費金額
    pub registration_price_overhead_value: Decimal,

    /// 登記價格
    pub registration_price: Decimal,

    /// 技術生產成本
    pub technical_production_cost: Decimal,

    /// 利潤金額
    pub profit_value: Decimal,

    /// 售價
    pub selling_price: Decimal,

    /// 是否含未定價物料
    pub contains_unpriced_materials: bool,

    /// 是否含零組件成本拆解
    pub contains_components: bool,
}

impl CalculationResult {
    /// 單位售價（產量為 0 或溢位時為 None）
    pub fn selling_price_per_unit(&self) -> Option<Decimal> {
        self.selling_price.checked_div(self.quantity)
    }
}

/// 物料成本明細（每個所需物料一筆）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialCostLine {
    /// 工藝編號
    pub technology_number: String,

    /// 最終產品編號
    pub final_product_number: String,

    /// 投入料件類型
    pub input_product_type: Option<String>,

    /// 是否為「不同尺寸使用不同產品」
    pub different_products_in_different_sizes: bool,

    /// 尺寸組編號（依尺寸拆分時）
    pub size_group_number: Option<String>,

    /// 物料編號
    pub product_number: String,

    /// 物料名稱
    pub product_name: String,

    /// 計量單位
    pub unit: String,

    /// 所需數量
    pub quantity: Decimal,

    /// 單位成本
    pub cost_per_unit: Decimal,

    /// 成本（數量 × 單位成本，已四捨五入）
    pub cost_for_given_quantity: Decimal,

    /// 是否取得價格
    pub priced: bool,

    /// 指定庫位的可用庫存
    pub stock_quantity: Option<Decimal>,
}

/// 工序人工/機台成本明細（每個節點一筆）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCostLine {
    /// 工藝編號
    pub technology_number: String,

    /// 最終產品編號
    pub product_number: String,

    /// 工序產出產品編號
    pub operation_output: String,

    /// 節點編號
    pub node_number: String,

    /// 工序編號
    pub operation_number: String,

    /// 機台工時（秒）
    pub machine_work_time: u64,

    /// 機台成本
    pub machine_cost: Decimal,

    /// 人工工時（秒）
    pub labour_work_time: u64,

    /// 人工成本
    pub labour_cost: Decimal,

    /// 工序成本（機台 + 人工）
    pub operation_cost: Decimal,
}

/// 零組件（半成品）成本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCost {
    /// 所屬計算ID
    pub cost_calculation_id: Uuid,

    /// 工藝編號
    pub technology_number: String,

    /// 投入料件類型
    pub input_product_type: Option<String>,

    /// 零組件產品編號
    pub product_number: String,

    /// 零組件產品名稱
    pub product_name: String,

    /// 計量單位
    pub unit: String,

    /// 數量
    pub quantity: Decimal,

    /// 物料成本份額
    pub material_cost: Decimal,

    /// 人工成本份額
    pub labour_cost: Decimal,

    /// 成本合計
    pub sum_of_costs: Decimal,

    /// 單位成本
    pub cost_per_unit: Decimal,
}
