//! 工序人工/機台成本彙總

use std::collections::HashMap;

use cost_core::{
    CostCalculationRequest, CostError, NodeId, OperationCostLine, SourceOfOperationCosts, Technology,
    TimeNorms,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::checked;
use crate::quantity::{NodeRequirement, QuantityPlan};
use crate::snapshot::CostSnapshot;

const SECONDS_PER_HOUR: Decimal = Decimal::from_parts(3600, 0, 0, false, 0);

/// 一個工藝的人工成本
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabourCosts {
    /// 工序明細（依節點編號排序；標準人工成本時為空）
    pub lines: Vec<OperationCostLine>,

    /// 人工成本合計（未四捨五入）
    pub total: Decimal,

    /// 各節點工序成本（未四捨五入）
    pub node_costs: HashMap<NodeId, Decimal>,

    /// 缺少費率的工序編號
    pub missing_rates: Vec<String>,
}

impl LabourCosts {
    /// 節點工序成本
    pub fn node_cost(&self, node: NodeId) -> Decimal {
        self.node_costs.get(&node).copied().unwrap_or(Decimal::ZERO)
    }
}

/// 人工成本彙總器
pub struct LabourCostAggregator;

impl LabourCostAggregator {
    /// 依人工成本來源計算
    ///
    /// - 標準人工成本：固定金額，不產生工序明細
    /// - 工時定額：每個節點 (準備時間 + 批次 × 單批工時) ÷ 3600 × 每小時費率
    pub fn aggregate(
        technology: &Technology,
        plan: &QuantityPlan,
        snapshot: &CostSnapshot,
        request: &CostCalculationRequest,
    ) -> cost_core::Result<LabourCosts> {
        if let SourceOfOperationCosts::StandardLaborCosts(standard) =
            &request.source_of_operation_costs
        {
            tracing::debug!(
                "工藝 {} 使用標準人工成本 {}：{}",
                technology.number,
                standard.number,
                standard.labor_cost
            );
            return Ok(LabourCosts {
                total: standard.labor_cost,
                ..LabourCosts::default()
            });
        }

        let mut costs = LabourCosts::default();

        for requirement in &plan.nodes {
            let node = technology.try_node(requirement.node)?;
            let operation_number = &node.operation.number;

            let overflow = || {
                CostError::overflow(format!(
                    "工藝 {} 節點 {} 的工序成本",
                    technology.number, node.node_number
                ))
            };

            let (machine_time, labour_time) =
                work_times(&node.time_norms, requirement).map_err(|_| overflow())?;

            let machine_cost = Self::time_cost(
                machine_time,
                snapshot.machine_rate(operation_number),
                operation_number,
                &mut costs.missing_rates,
            )
            .map_err(|_| overflow())?;
            let labour_cost = Self::time_cost(
                labour_time,
                snapshot.labour_rate(operation_number),
                operation_number,
                &mut costs.missing_rates,
            )
            .map_err(|_| overflow())?;
            let operation_cost =
                checked::add(machine_cost, labour_cost, String::new).map_err(|_| overflow())?;

            costs.total = checked::add(costs.total, operation_cost, || {
                format!("工藝 {} 的人工成本合計", technology.number)
            })?;
            costs.node_costs.insert(requirement.node, operation_cost);
            costs.lines.push(OperationCostLine {
                technology_number: technology.number.clone(),
                product_number: technology.product.number.clone(),
                operation_output: requirement.output_product.number.clone(),
                node_number: node.node_number.clone(),
                operation_number: operation_number.clone(),
                machine_work_time: machine_time,
                machine_cost: request.round(machine_cost),
                labour_work_time: labour_time,
                labour_cost: request.round(labour_cost),
                operation_cost: request.round(operation_cost),
            });
        }

        for operation in &costs.missing_rates {
            tracing::warn!(
                "工藝 {} 的工序 {} 缺少費率，成本以 0 計",
                technology.number,
                operation
            );
        }

        tracing::debug!(
            "工藝 {} 人工成本：工序 {} 筆，合計 {}",
            technology.number,
            costs.lines.len(),
            costs.total
        );

        Ok(costs)
    }

    fn time_cost(
        seconds: u64,
        rate: Option<Decimal>,
        operation_number: &str,
        missing_rates: &mut Vec<String>,
    ) -> cost_core::Result<Decimal> {
        if seconds == 0 {
            return Ok(Decimal::ZERO);
        }

        match rate {
            Some(rate) => {
                checked::mul(Decimal::from(seconds) / SECONDS_PER_HOUR, rate, String::new)
            }
            None => {
                if !missing_rates.iter().any(|op| op == operation_number) {
                    missing_rates.push(operation_number.to_string());
                }
                Ok(Decimal::ZERO)
            }
        }
    }
}

/// 節點的機台與人工工時（秒，無條件進位）
///
/// 準備時間只計入有設定單批工時的資源；批次數為 0 時不計工時。
/// 工時超出 `u64` 秒數時回傳 Overflow。
pub fn work_times(
    norms: &TimeNorms,
    requirement: &NodeRequirement,
) -> cost_core::Result<(u64, u64)> {
    if requirement.batches <= Decimal::ZERO {
        return Ok((0, 0));
    }

    let batches = if norms.whole_cycles_only {
        requirement.batches.ceil()
    } else {
        requirement.batches
    };
    let setup = Decimal::from(norms.setup_time.unwrap_or(0));

    let seconds = |per_batch: Option<u32>| -> cost_core::Result<u64> {
        let Some(per_batch) = per_batch else {
            return Ok(0);
        };
        let overflow = || format!("產出 {} 的工時秒數", requirement.output_product.number);

        let total = checked::mul(batches, Decimal::from(per_batch), overflow)
            .and_then(|time| checked::add(setup, time, overflow))?;
        total.ceil().to_u64().ok_or_else(|| CostError::overflow(overflow()))
    };

    Ok((
        seconds(norms.machine_work_time)?,
        seconds(norms.labour_work_time)?,
    ))
}
