//! 價格/費率/庫存快照
//!
//! 一次計算只向外部來源查詢一次，之後所有工藝共用同一份不可變資料。

use std::collections::BTreeMap;

use cost_core::{
    CostCalculationRequest, MaterialCostsUsed, Operation, PriceResolver, Product, RateResolver,
    StockResolver, Technology,
};
use rust_decimal::Decimal;

use crate::quantity::QuantityPlan;

/// 計算期間使用的外部資料快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostSnapshot {
    unit_costs: BTreeMap<String, Option<Decimal>>,
    machine_rates: BTreeMap<String, Option<Decimal>>,
    labour_rates: BTreeMap<String, Option<Decimal>>,
    stock: BTreeMap<String, Option<Decimal>>,
}

impl CostSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 擷取所有工藝所需的外部資料
    pub fn capture<P, R>(
        request: &CostCalculationRequest,
        planned: &[(&Technology, &QuantityPlan)],
        prices: &P,
        rates: &R,
        stock: Option<&dyn StockResolver>,
    ) -> Self
    where
        P: PriceResolver + ?Sized,
        R: RateResolver + ?Sized,
    {
        let mut snapshot = Self::new();

        for (technology, plan) in planned {
            // 數量合計溢位的工藝會在物料彙總時失敗
            for needed in plan.needed_materials().unwrap_or_default().into_values() {
                snapshot.record_price(
                    prices,
                    &needed.product,
                    request.material_costs_used,
                    request.use_nominal_cost_price_not_specified,
                );
                if let (Some(stock), Some(location)) = (stock, request.location.as_deref()) {
                    snapshot.record_stock(stock, &needed.product, location);
                }
            }

            if request.uses_time_norms() {
                for node in &technology.nodes {
                    snapshot.record_rates(rates, &node.operation);
                }
            }
        }

        tracing::debug!(
            "快照完成：價格 {} 筆，費率 {} 筆，庫存 {} 筆",
            snapshot.unit_costs.len(),
            snapshot.machine_rates.len(),
            snapshot.stock.len()
        );

        snapshot
    }

    /// 記錄物料單位成本（同一產品只查詢一次）
    pub fn record_price<P: PriceResolver + ?Sized>(
        &mut self,
        prices: &P,
        product: &Product,
        policy: MaterialCostsUsed,
        use_nominal_fallback: bool,
    ) {
        if !self.unit_costs.contains_key(&product.number) {
            let cost = prices.unit_cost(product, policy, use_nominal_fallback);
            self.unit_costs.insert(product.number.clone(), cost);
        }
    }

    /// 記錄工序費率
    pub fn record_rates<R: RateResolver + ?Sized>(&mut self, rates: &R, operation: &Operation) {
        if !self.machine_rates.contains_key(&operation.number) {
            self.machine_rates
                .insert(operation.number.clone(), rates.machine_rate(operation));
            self.labour_rates
                .insert(operation.number.clone(), rates.labour_rate(operation));
        }
    }

    /// 記錄庫位可用庫存
    pub fn record_stock(&mut self, stock: &dyn StockResolver, product: &Product, location: &str) {
        if !self.stock.contains_key(&product.number) {
            self.stock.insert(
                product.number.clone(),
                stock.available_quantity(product, location),
            );
        }
    }

    /// 物料單位成本；None 表示未定價
    pub fn unit_cost(&self, product_number: &str) -> Option<Decimal> {
        self.unit_costs.get(product_number).copied().flatten()
    }

    /// 機台每小時費率
    pub fn machine_rate(&self, operation_number: &str) -> Option<Decimal> {
        self.machine_rates.get(operation_number).copied().flatten()
    }

    /// 人工每小時費率
    pub fn labour_rate(&self, operation_number: &str) -> Option<Decimal> {
        self.labour_rates.get(operation_number).copied().flatten()
    }

    /// 庫位可用庫存
    pub fn stock_quantity(&self, product_number: &str) -> Option<Decimal> {
        self.stock.get(product_number).copied().flatten()
    }
}
