//! 成本彙總與定價
//!
//! 所有百分比均以各自的基數線性計算，不互相複利：
//!
//! ```text
//! 生產成本     = 物料 + 人工
//! 總成本       = 生產成本 + 物料 × 物料加成% + 人工 × 人工加成% + 額外管理費
//! 登記價格     = 總成本 + 總成本 × 登記價格管理費%
//! 技術生產成本 = 總成本
//! 售價         = 技術生產成本 + 技術生產成本 × 利潤%
//! ```

use cost_core::{round_half_up, CalculationResult, CostCalculationRequest, Technology};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checked;

/// 定價參數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingParameters {
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
}

impl From<&CostCalculationRequest> for PricingParameters {
    fn from(request: &CostCalculationRequest) -> Self {
        Self {
            material_cost_margin: request.material_cost_margin,
            production_cost_margin: request.production_cost_margin,
            additional_overhead: request.additional_overhead,
            registration_price_overhead: request.registration_price_overhead,
            profit: request.profit,
        }
    }
}

/// 成本拆解（未四捨五入）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub material_costs: Decimal,
    pub labour_cost: Decimal,
    pub production_costs: Decimal,
    pub material_cost_margin_value: Decimal,
    pub labour_cost_margin_value: Decimal,
    pub additional_overhead: Decimal,
    pub total_cost: Decimal,
    pub registration_price_overhead_value: Decimal,
    pub registration_price: Decimal,
    pub technical_production_cost: Decimal,
    pub profit_value: Decimal,
    pub selling_price: Decimal,
}

impl CostBreakdown {
    /// 各金額四捨五入至指定小數位數
    pub fn rounded(&self, scale: u32) -> Self {
        let r = |value: Decimal| round_half_up(value, scale);
        Self {
            material_costs: r(self.material_costs),
            labour_cost: r(self.labour_cost),
            production_costs: r(self.production_costs),
            material_cost_margin_value: r(self.material_cost_margin_value),
            labour_cost_margin_value: r(self.labour_cost_margin_value),
            additional_overhead: r(self.additional_overhead),
            total_cost: r(self.total_cost),
            registration_price_overhead_value: r(self.registration_price_overhead_value),
            registration_price: r(self.registration_price),
            technical_production_cost: r(self.technical_production_cost),
            profit_value: r(self.profit_value),
            selling_price: r(self.selling_price),
        }
    }

    /// 轉為計算結果記錄
    pub fn into_result(
        self,
        technology: &Technology,
        request: &CostCalculationRequest,
        contains_unpriced_materials: bool,
        contains_components: bool,
    ) -> CalculationResult {
        let rounded = self.rounded(request.scale);

        CalculationResult {
            technology_number: technology.number.clone(),
            product_number: technology.product.number.clone(),
            unit: technology.product.unit.clone(),
            quantity: request.quantity,
            material_costs: rounded.material_costs,
            labour_cost: rounded.labour_cost,
            production_costs: rounded.production_costs,
            material_cost_margin_value: rounded.material_cost_margin_value,
            labour_cost_margin_value: rounded.labour_cost_margin_value,
            additional_overhead: rounded.additional_overhead,
            total_cost: rounded.total_cost,
            registration_price_overhead_value: rounded.registration_price_overhead_value,
            registration_price: rounded.registration_price,
            technical_production_cost: rounded.technical_production_cost,
            profit_value: rounded.profit_value,
            selling_price: rounded.selling_price,
            contains_unpriced_materials,
            contains_components,
        }
    }
}

/// 定價計算器
pub struct PricingCalculator;

impl PricingCalculator {
    /// 由物料與人工成本推算總成本與售價
    pub fn roll_up(
        material_costs: Decimal,
        labour_cost: Decimal,
        parameters: &PricingParameters,
    ) -> cost_core::Result<CostBreakdown> {
        let sum = |left: Decimal, right: Decimal, what: &'static str| {
            checked::add(left, right, || format!("定價計算的{}", what))
        };

        let production_costs = sum(material_costs, labour_cost, "生產成本")?;
        let material_cost_margin_value =
            percent_of(material_costs, parameters.material_cost_margin)?;
        let labour_cost_margin_value =
            percent_of(labour_cost, parameters.production_cost_margin)?;

        let total_cost = [
            material_cost_margin_value,
            labour_cost_margin_value,
            parameters.additional_overhead,
        ]
        .into_iter()
        .try_fold(production_costs, |acc, value| sum(acc, value, "總成本"))?;

        let registration_price_overhead_value =
            percent_of(total_cost, parameters.registration_price_overhead)?;
        let registration_price = sum(total_cost, registration_price_overhead_value, "登記價格")?;
        let technical_production_cost = total_cost;

        let profit_value = percent_of(technical_production_cost, parameters.profit)?;
        let selling_price = sum(technical_production_cost, profit_value, "售價")?;

        Ok(CostBreakdown {
            material_costs,
            labour_cost,
            production_costs,
            material_cost_margin_value,
            labour_cost_margin_value,
            additional_overhead: parameters.additional_overhead,
            total_cost,
            registration_price_overhead_value,
            registration_price,
            technical_production_cost,
            profit_value,
            selling_price,
        })
    }
}

fn percent_of(base: Decimal, percent: Decimal) -> cost_core::Result<Decimal> {
    let overflow = || format!("{} 的 {}%", base, percent);
    checked::mul(base, percent, overflow)
        .and_then(|value| checked::div(value, Decimal::ONE_HUNDRED, overflow))
}
