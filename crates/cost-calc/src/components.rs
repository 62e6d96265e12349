//! 零組件（庫存半成品）成本拆解

use std::collections::BTreeMap;

use cost_core::{ComponentCost, CostCalculationRequest, Product, Technology};
use rust_decimal::Decimal;

use crate::checked;
use crate::materials::MaterialCosts;
use crate::operations::LabourCosts;
use crate::quantity::QuantityPlan;

struct ComponentAccumulator {
    product: Product,
    input_product_type: Option<String>,
    quantity: Decimal,
    material_cost: Decimal,
    labour_cost: Decimal,
}

/// 零組件成本計算器
pub struct ComponentCostCalculator;

impl ComponentCostCalculator {
    /// 拆解庫存半成品的成本份額
    ///
    /// 每個非根節點若其主產出為庫存品，則其子樹（含自身）的物料與工序成本歸屬於該產品；
    /// 同一產品出現在多個節點時合併為一筆。
    pub fn breakdown(
        technology: &Technology,
        plan: &QuantityPlan,
        materials: &MaterialCosts,
        labour: &LabourCosts,
        request: &CostCalculationRequest,
    ) -> cost_core::Result<Vec<ComponentCost>> {
        let mut components: BTreeMap<String, ComponentAccumulator> = BTreeMap::new();

        for requirement in &plan.nodes {
            let node = technology.try_node(requirement.node)?;
            let Some(parent_id) = node.parent else {
                continue;
            };
            if !requirement.output_product.stocked {
                continue;
            }

            let overflow = || {
                format!(
                    "工藝 {} 零組件 {} 的成本",
                    technology.number, requirement.output_product.number
                )
            };

            let mut material_cost = Decimal::ZERO;
            let mut labour_cost = Decimal::ZERO;
            for id in technology.walk_from(requirement.node)? {
                labour_cost = checked::add(labour_cost, labour.node_cost(id), overflow)?;
                if let Some(sub) = plan.node(id) {
                    for input in sub.inputs.iter().filter(|i| i.is_material()) {
                        let cost =
                            checked::mul(input.quantity, materials.unit_cost(&input.key()), overflow)?;
                        material_cost = checked::add(material_cost, cost, overflow)?;
                    }
                }
            }

            let input_product_type = technology
                .try_node(parent_id)?
                .input_of(&requirement.output_product.number)
                .and_then(|c| c.input_product_type.clone());

            let entry = components
                .entry(requirement.output_product.number.clone())
                .or_insert_with(|| ComponentAccumulator {
                    product: requirement.output_product.clone(),
                    input_product_type,
                    quantity: Decimal::ZERO,
                    material_cost: Decimal::ZERO,
                    labour_cost: Decimal::ZERO,
                });
            entry.quantity = checked::add(entry.quantity, requirement.output_quantity, overflow)?;
            entry.material_cost = checked::add(entry.material_cost, material_cost, overflow)?;
            entry.labour_cost = checked::add(entry.labour_cost, labour_cost, overflow)?;
        }

        tracing::debug!(
            "工藝 {} 零組件成本：{} 筆",
            technology.number,
            components.len()
        );

        components
            .into_values()
            .map(|acc| -> cost_core::Result<ComponentCost> {
                let overflow = || {
                    format!("工藝 {} 零組件 {} 的成本", technology.number, acc.product.number)
                };
                let sum_of_costs = checked::add(acc.material_cost, acc.labour_cost, overflow)?;
                let cost_per_unit = if acc.quantity > Decimal::ZERO {
                    checked::div(sum_of_costs, acc.quantity, overflow)?
                } else {
                    Decimal::ZERO
                };

                Ok(ComponentCost {
                    cost_calculation_id: request.id,
                    technology_number: technology.number.clone(),
                    input_product_type: acc.input_product_type,
                    product_number: acc.product.number,
                    product_name: acc.product.name,
                    unit: acc.product.unit,
                    quantity: acc.quantity.normalize(),
                    material_cost: request.round(acc.material_cost),
                    labour_cost: request.round(acc.labour_cost),
                    sum_of_costs: request.round(sum_of_costs),
                    cost_per_unit: request.round(cost_per_unit),
                })
            })
            .collect()
    }
}
