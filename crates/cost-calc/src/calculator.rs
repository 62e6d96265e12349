//! 成本主計算器

use cost_core::{
    compare_node_numbers, CalculationResult, ComponentCost, CostCalculationRequest,
    MaterialCostLine, OperationCostLine, PriceResolver, RateResolver, StockResolver, Technology,
    TechnologyLoader,
};
use rayon::prelude::*;

use crate::components::ComponentCostCalculator;
use crate::materials::MaterialCostAggregator;
use crate::operations::LabourCostAggregator;
use crate::pricing::{PricingCalculator, PricingParameters};
use crate::quantity::{QuantityPlan, QuantityPropagator};
use crate::snapshot::CostSnapshot;
use crate::{CostCalculationRun, CostWarning};

/// 單一工藝的計算結果
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyCost {
    pub result: CalculationResult,
    pub material_costs: Vec<MaterialCostLine>,
    pub labour_costs: Vec<OperationCostLine>,
    pub component_costs: Vec<ComponentCost>,
    pub warnings: Vec<CostWarning>,
}

impl TechnologyCost {
    /// 單一工藝的成本計算（數量展開已完成）
    pub fn calculate(
        technology: &Technology,
        plan: &QuantityPlan,
        snapshot: &CostSnapshot,
        request: &CostCalculationRequest,
    ) -> cost_core::Result<TechnologyCost> {
        let materials = MaterialCostAggregator::aggregate(technology, plan, snapshot, request)?;
        let labour = LabourCostAggregator::aggregate(technology, plan, snapshot, request)?;

        let component_costs = if request.include_components {
            ComponentCostCalculator::breakdown(technology, plan, &materials, &labour, request)?
        } else {
            Vec::new()
        };

        let breakdown = PricingCalculator::roll_up(
            materials.total,
            labour.total,
            &PricingParameters::from(request),
        )?;
        let result = breakdown.into_result(
            technology,
            request,
            materials.contains_unpriced_materials(),
            !component_costs.is_empty(),
        );

        let warnings = materials
            .unpriced
            .iter()
            .map(|product| CostWarning::missing_price(&technology.number, product))
            .chain(
                labour
                    .missing_rates
                    .iter()
                    .map(|operation| CostWarning::missing_rate(&technology.number, operation)),
            )
            .collect();

        tracing::debug!(
            "工藝 {} 完成：物料 {}，人工 {}，售價 {}",
            technology.number,
            result.material_costs,
            result.labour_cost,
            result.selling_price
        );

        Ok(TechnologyCost {
            result,
            material_costs: materials.lines,
            labour_costs: labour.lines,
            component_costs,
            warnings,
        })
    }
}

/// 成本計算器
pub struct CostCalculator<P, R> {
    /// 物料價格來源
    prices: P,

    /// 工序費率來源
    rates: R,

    /// 庫存來源（僅供報表）
    stock: Option<Box<dyn StockResolver>>,
}

impl<P: PriceResolver, R: RateResolver> CostCalculator<P, R> {
    /// 創建新的成本計算器
    pub fn new(prices: P, rates: R) -> Self {
        Self {
            prices,
            rates,
            stock: None,
        }
    }

    /// 建構器模式：設置庫存來源
    pub fn with_stock(mut self, stock: impl StockResolver + 'static) -> Self {
        self.stock = Some(Box::new(stock));
        self
    }

    /// 主計算入口
    ///
    /// 請求無效時整體失敗；單一工藝無效只記錄於 `failures`，其餘工藝照常計算
    pub fn calculate(
        &self,
        request: &CostCalculationRequest,
        technologies: &[Technology],
    ) -> cost_core::Result<CostCalculationRun> {
        request.validate()?;

        tracing::info!(
            "開始成本計算 {}：工藝 {} 個，產量 {}",
            request.number,
            technologies.len(),
            request.quantity
        );

        let start_time = std::time::Instant::now();

        // Step 1: 數量展開（各工藝獨立，並行）
        tracing::debug!("Step 1: 數量展開");
        let plans: Vec<cost_core::Result<QuantityPlan>> = technologies
            .par_iter()
            .map(|technology| {
                QuantityPropagator::propagate(
                    technology,
                    request.quantity,
                    request.materials_by_size,
                )
            })
            .collect();

        // Step 2: 擷取價格/費率/庫存快照
        tracing::debug!("Step 2: 擷取外部資料快照");
        let snapshot = {
            let planned: Vec<(&Technology, &QuantityPlan)> = technologies
                .iter()
                .zip(&plans)
                .filter_map(|(technology, plan)| plan.as_ref().ok().map(|p| (technology, p)))
                .collect();
            CostSnapshot::capture(
                request,
                &planned,
                &self.prices,
                &self.rates,
                self.stock.as_deref(),
            )
        };

        // Step 3: 逐工藝計算成本（並行，共用快照）
        tracing::debug!("Step 3: 計算工藝成本");
        let outcomes: Vec<cost_core::Result<TechnologyCost>> = technologies
            .par_iter()
            .zip(plans.into_par_iter())
            .map(|(technology, plan)| {
                plan.and_then(|plan| {
                    TechnologyCost::calculate(technology, &plan, &snapshot, request)
                })
            })
            .collect();

        // Step 4: 依請求順序合併結果
        tracing::debug!("Step 4: 合併結果");
        let mut run = CostCalculationRun::empty(request);
        for (technology, outcome) in technologies.iter().zip(outcomes) {
            match outcome {
                Ok(cost) => run.add_technology(cost),
                Err(error) => {
                    tracing::warn!("工藝 {} 無法計算：{}", technology.number, error);
                    run.add_failure(&technology.number, error);
                }
            }
        }
        sort_lines(&mut run);
        run.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!("成本計算完成，耗時 {:?}", start_time.elapsed());
        tracing::info!(
            "成功 {} 個，失敗 {} 個，警告 {} 筆",
            run.results.len(),
            run.failures.len(),
            run.warnings.len()
        );

        Ok(run)
    }

    /// 依產品編號載入工藝後計算
    ///
    /// 找不到工藝的產品記錄為失敗，失敗記錄的 `technology_number` 為產品編號
    pub fn calculate_for_products<L: TechnologyLoader + ?Sized>(
        &self,
        request: &CostCalculationRequest,
        loader: &L,
        product_numbers: &[&str],
    ) -> cost_core::Result<CostCalculationRun> {
        let mut technologies = Vec::with_capacity(product_numbers.len());
        let mut load_failures = Vec::new();
        for &product_number in product_numbers {
            match loader.load(product_number) {
                Ok(technology) => technologies.push(technology),
                Err(error) => {
                    tracing::warn!("產品 {} 的工藝載入失敗：{}", product_number, error);
                    load_failures.push((product_number.to_string(), error));
                }
            }
        }

        let mut run = self.calculate(request, &technologies)?;
        for (product_number, error) in load_failures {
            run.add_failure(product_number, error);
        }
        Ok(run)
    }
}

/// 明細依（工藝編號, 產品編號/節點編號）排序
fn sort_lines(run: &mut CostCalculationRun) {
    run.material_costs.sort_by(|a, b| {
        a.technology_number
            .cmp(&b.technology_number)
            .then_with(|| a.product_number.cmp(&b.product_number))
            .then_with(|| a.size_group_number.cmp(&b.size_group_number))
    });
    run.labour_costs.sort_by(|a, b| {
        a.technology_number
            .cmp(&b.technology_number)
            .then_with(|| compare_node_numbers(&a.node_number, &b.node_number))
    });
    run.component_costs.sort_by(|a, b| {
        a.technology_number
            .cmp(&b.technology_number)
            .then_with(|| a.product_number.cmp(&b.product_number))
    });
}
