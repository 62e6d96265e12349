//! 工序費率表

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::resolver::RateResolver;
use crate::technology::Operation;

/// 工序每小時費率
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRates {
    /// 工序編號
    pub operation_number: String,

    /// 機台每小時費率
    pub machine_hourly_cost: Option<Decimal>,

    /// 人工每小時費率
    pub labour_hourly_cost: Option<Decimal>,
}

impl OperationRates {
    pub fn new(
        operation_number: impl Into<String>,
        machine_hourly_cost: Decimal,
        labour_hourly_cost: Decimal,
    ) -> Self {
        Self {
            operation_number: operation_number.into(),
            machine_hourly_cost: Some(machine_hourly_cost),
            labour_hourly_cost: Some(labour_hourly_cost),
        }
    }
}

/// 記憶體內費率表，可設置預設費率
#[derive(Debug, Clone, Default)]
pub struct OperationRateTable {
    rates: HashMap<String, OperationRates>,
    default_machine_rate: Option<Decimal>,
    default_labour_rate: Option<Decimal>,
}

impl OperationRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加或覆蓋工序費率
    pub fn insert(&mut self, rates: OperationRates) {
        self.rates.insert(rates.operation_number.clone(), rates);
    }

    /// 建構器模式：添加工序費率
    pub fn with(mut self, rates: OperationRates) -> Self {
        self.insert(rates);
        self
    }

    /// 建構器模式：設置預設費率（未個別設定的工序使用）
    pub fn with_defaults(mut self, machine_rate: Decimal, labour_rate: Decimal) -> Self {
        self.default_machine_rate = Some(machine_rate);
        self.default_labour_rate = Some(labour_rate);
        self
    }
}

impl RateResolver for OperationRateTable {
    fn machine_rate(&self, operation: &Operation) -> Option<Decimal> {
        self.rates
            .get(&operation.number)
            .and_then(|r| r.machine_hourly_cost)
            .or(self.default_machine_rate)
    }

    fn labour_rate(&self, operation: &Operation) -> Option<Decimal> {
        self.rates
            .get(&operation.number)
            .and_then(|r| r.labour_hourly_cost)
            .or(self.default_labour_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_lookup() {
        let table = OperationRateTable::new().with(OperationRates::new("WELD", dec!(60), dec!(30)));
        let weld = Operation::new("WELD", "Welding");
        let paint = Operation::new("PAINT", "Painting");

        assert_eq!(table.machine_rate(&weld), Some(dec!(60)));
        assert_eq!(table.labour_rate(&weld), Some(dec!(30)));
        assert_eq!(table.machine_rate(&paint), None);
    }

    #[test]
    fn test_default_rates() {
        let mut partial = OperationRates::new("CUT", dec!(40), dec!(20));
        partial.labour_hourly_cost = None;

        let table = OperationRateTable::new()
            .with(partial)
            .with_defaults(dec!(10), dec!(25));
        let cut = Operation::new("CUT", "Cutting");
        let other = Operation::new("PACK", "Packing");

        assert_eq!(table.machine_rate(&cut), Some(dec!(40)));
        assert_eq!(table.labour_rate(&cut), Some(dec!(25)));
        assert_eq!(table.machine_rate(&other), Some(dec!(10)));
    }
}
