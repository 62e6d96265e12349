//! 外部協作者介面：價格、費率、庫存、工藝載入

use rust_decimal::Decimal;

use crate::config::MaterialCostsUsed;
use crate::product::Product;
use crate::technology::{Operation, Technology};
use crate::Result;

/// 物料價格來源
pub trait PriceResolver {
    /// 指定成本來源的單位成本，未設定時回傳 None
    fn cost(&self, product: &Product, policy: MaterialCostsUsed) -> Option<Decimal>;

    /// 依優先順序解析單位成本
    ///
    /// 1. 指定來源的成本（為 0 視同未指定）
    /// 2. 未指定且允許時，退回名義成本
    /// 3. 皆無則回傳 None（呼叫端標記為未定價）
    fn unit_cost(
        &self,
        product: &Product,
        policy: MaterialCostsUsed,
        use_nominal_fallback: bool,
    ) -> Option<Decimal> {
        let specified = self.cost(product, policy).filter(|cost| !cost.is_zero());

        match specified {
            Some(cost) => Some(cost),
            None if use_nominal_fallback && policy != MaterialCostsUsed::Nominal => self
                .cost(product, MaterialCostsUsed::Nominal)
                .filter(|cost| !cost.is_zero()),
            None => None,
        }
    }
}

/// 工序費率來源（每小時）
pub trait RateResolver {
    /// 機台每小時費率
    fn machine_rate(&self, operation: &Operation) -> Option<Decimal>;

    /// 人工每小時費率
    fn labour_rate(&self, operation: &Operation) -> Option<Decimal>;
}

/// 庫位庫存查詢
pub trait StockResolver {
    /// 指定庫位的可用數量
    fn available_quantity(&self, product: &Product, location: &str) -> Option<Decimal>;
}

/// 工藝載入
pub trait TechnologyLoader {
    /// 載入指定產品的工藝
    fn load(&self, product_number: &str) -> Result<Technology>;
}

impl<T: PriceResolver + ?Sized> PriceResolver for &T {
    fn cost(&self, product: &Product, policy: MaterialCostsUsed) -> Option<Decimal> {
        (**self).cost(product, policy)
    }
}

impl<T: RateResolver + ?Sized> RateResolver for &T {
    fn machine_rate(&self, operation: &Operation) -> Option<Decimal> {
        (**self).machine_rate(operation)
    }

    fn labour_rate(&self, operation: &Operation) -> Option<Decimal> {
        (**self).labour_rate(operation)
    }
}
