//! 物料成本定額與價格表

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MaterialCostsUsed;
use crate::product::Product;
use crate::resolver::PriceResolver;

/// 產品成本定額
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCostNorms {
    /// 產品編號
    pub product_number: String,

    /// 名義成本
    pub nominal_cost: Option<Decimal>,

    /// 最後採購成本
    pub last_purchase_cost: Option<Decimal>,

    /// 平均成本
    pub average_cost: Option<Decimal>,

    /// 手動指定成本
    pub specified_cost: Option<Decimal>,

    /// 成本對應數量（成本以每 N 單位報價）
    pub cost_for_number: Decimal,
}

impl ProductCostNorms {
    /// 創建新的成本定額（每 1 單位報價）
    pub fn new(product_number: impl Into<String>) -> Self {
        Self {
            product_number: product_number.into(),
            nominal_cost: None,
            last_purchase_cost: None,
            average_cost: None,
            specified_cost: None,
            cost_for_number: Decimal::ONE,
        }
    }

    /// 建構器模式：設置名義成本
    pub fn with_nominal_cost(mut self, cost: Decimal) -> Self {
        self.nominal_cost = Some(cost);
        self
    }

    /// 建構器模式：設置最後採購成本
    pub fn with_last_purchase_cost(mut self, cost: Decimal) -> Self {
        self.last_purchase_cost = Some(cost);
        self
    }

    /// 建構器模式：設置平均成本
    pub fn with_average_cost(mut self, cost: Decimal) -> Self {
        self.average_cost = Some(cost);
        self
    }

    /// 建構器模式：設置手動指定成本
    pub fn with_specified_cost(mut self, cost: Decimal) -> Self {
        self.specified_cost = Some(cost);
        self
    }

    /// 建構器模式：設置成本對應數量
    pub fn with_cost_for_number(mut self, number: Decimal) -> Self {
        self.cost_for_number = number;
        self
    }

    /// 指定來源的單位成本（成本 ÷ 成本對應數量）
    pub fn unit_cost(&self, policy: MaterialCostsUsed) -> Option<Decimal> {
        let cost = match policy {
            MaterialCostsUsed::Nominal => self.nominal_cost,
            MaterialCostsUsed::LastPurchase => self.last_purchase_cost,
            MaterialCostsUsed::Average => self.average_cost,
            MaterialCostsUsed::Specified => self.specified_cost,
        }?;

        if self.cost_for_number > Decimal::ZERO {
            // 溢位視為未定價
            cost.checked_div(self.cost_for_number)
        } else {
            Some(cost)
        }
    }
}

/// 記憶體內價格表
#[derive(Debug, Clone, Default)]
pub struct ProductCostTable {
    norms: HashMap<String, ProductCostNorms>,
}

impl ProductCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加或覆蓋成本定額
    pub fn insert(&mut self, norms: ProductCostNorms) {
        self.norms.insert(norms.product_number.clone(), norms);
    }

    /// 建構器模式：添加成本定額
    pub fn with(mut self, norms: ProductCostNorms) -> Self {
        self.insert(norms);
        self
    }

    /// 獲取成本定額
    pub fn get(&self, product_number: &str) -> Option<&ProductCostNorms> {
        self.norms.get(product_number)
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }
}

impl FromIterator<ProductCostNorms> for ProductCostTable {
    fn from_iter<I: IntoIterator<Item = ProductCostNorms>>(iter: I) -> Self {
        let mut table = Self::new();
        for norms in iter {
            table.insert(norms);
        }
        table
    }
}

impl PriceResolver for ProductCostTable {
    fn cost(&self, product: &Product, policy: MaterialCostsUsed) -> Option<Decimal> {
        self.get(&product.number)?.unit_cost(policy)
    }
}
