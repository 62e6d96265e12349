//! 物料成本彙總

use std::collections::BTreeMap;

use cost_core::{CostCalculationRequest, MaterialCostLine, Technology};
use rust_decimal::Decimal;

use crate::checked;
use crate::quantity::{MaterialKey, QuantityPlan};
use crate::snapshot::CostSnapshot;

/// 一個工藝的物料成本
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialCosts {
    /// 明細（依產品編號、尺寸組排序）
    pub lines: Vec<MaterialCostLine>,

    /// 物料成本合計（未四捨五入）
    pub total: Decimal,

    /// 各物料單位成本（未定價者為 0）
    pub unit_costs: BTreeMap<MaterialKey, Decimal>,

    /// 未定價的物料編號
    pub unpriced: Vec<String>,
}

impl MaterialCosts {
    /// 是否含未定價物料
    pub fn contains_unpriced_materials(&self) -> bool {
        !self.unpriced.is_empty()
    }

    /// 物料單位成本
    pub fn unit_cost(&self, key: &MaterialKey) -> Decimal {
        self.unit_costs.get(key).copied().unwrap_or(Decimal::ZERO)
    }
}

/// 物料成本彙總器
pub struct MaterialCostAggregator;

impl MaterialCostAggregator {
    /// 依所需數量與單位成本計算物料成本
    ///
    /// 未定價物料以 0 計入並標記，不中斷計算
    pub fn aggregate(
        technology: &Technology,
        plan: &QuantityPlan,
        snapshot: &CostSnapshot,
        request: &CostCalculationRequest,
    ) -> cost_core::Result<MaterialCosts> {
        let mut lines = Vec::new();
        let mut total = Decimal::ZERO;
        let mut unit_costs = BTreeMap::new();
        let mut unpriced = Vec::new();

        for (key, needed) in plan.needed_materials()? {
            let unit_cost = snapshot.unit_cost(&needed.product.number);
            let priced = unit_cost.is_some();
            let cost_per_unit = unit_cost.unwrap_or(Decimal::ZERO);
            let cost = checked::mul(needed.quantity, cost_per_unit, || {
                format!("工藝 {} 物料 {} 的成本", technology.number, needed.product.number)
            })?;

            if !priced && !unpriced.contains(&needed.product.number) {
                tracing::warn!(
                    "工藝 {} 的物料 {} 未定價，成本以 0 計",
                    technology.number,
                    needed.product.number
                );
                unpriced.push(needed.product.number.clone());
            }

            total = checked::add(total, cost, || {
                format!("工藝 {} 的物料成本合計", technology.number)
            })?;
            unit_costs.insert(key, cost_per_unit);

            lines.push(MaterialCostLine {
                technology_number: technology.number.clone(),
                final_product_number: technology.product.number.clone(),
                input_product_type: needed.input_product_type,
                different_products_in_different_sizes: needed.different_products_in_different_sizes,
                size_group_number: needed.size_group,
                stock_quantity: snapshot.stock_quantity(&needed.product.number),
                product_number: needed.product.number,
                product_name: needed.product.name,
                unit: needed.product.unit,
                quantity: needed.quantity.normalize(),
                cost_per_unit: cost_per_unit.normalize(),
                cost_for_given_quantity: request.round(cost),
                priced,
            });
        }

        tracing::debug!(
            "工藝 {} 物料成本：{} 筆，合計 {}",
            technology.number,
            lines.len(),
            total
        );

        Ok(MaterialCosts {
            lines,
            total,
            unit_costs,
            unpriced,
        })
    }
}
