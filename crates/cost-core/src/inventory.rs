//! 庫位庫存模型

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::resolver::StockResolver;

/// 庫位庫存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// 產品編號
    pub product_number: String,

    /// 庫位
    pub location: String,

    /// 現有庫存
    pub on_hand_qty: Decimal,

    /// 已分配數量（鎖定）
    pub allocated_qty: Decimal,

    /// 品檢凍結數量
    pub blocked_qty: Decimal,
}

impl StockLevel {
    /// 創建新的庫存記錄
    pub fn new(product_number: impl Into<String>, location: impl Into<String>, on_hand_qty: Decimal) -> Self {
        Self {
            product_number: product_number.into(),
            location: location.into(),
            on_hand_qty,
            allocated_qty: Decimal::ZERO,
            blocked_qty: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置已分配數量
    pub fn with_allocated_qty(mut self, allocated_qty: Decimal) -> Self {
        self.allocated_qty = allocated_qty;
        self
    }

    /// 建構器模式：設置品檢凍結數量
    pub fn with_blocked_qty(mut self, blocked_qty: Decimal) -> Self {
        self.blocked_qty = blocked_qty;
        self
    }

    /// 可用庫存（現有 - 已分配 - 凍結，不低於 0）
    pub fn available_qty(&self) -> Decimal {
        self.on_hand_qty
            .saturating_sub(self.allocated_qty)
            .saturating_sub(self.blocked_qty)
            .max(Decimal::ZERO)
    }
}

/// 記憶體內庫存表（依產品與庫位彙總）
#[derive(Debug, Clone, Default)]
pub struct StockTable {
    levels: HashMap<(String, String), StockLevel>,
}

impl StockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加庫存；同產品同庫位的記錄會累加
    pub fn add(&mut self, level: StockLevel) {
        let key = (level.product_number.clone(), level.location.clone());
        match self.levels.get_mut(&key) {
            Some(existing) => {
                existing.on_hand_qty = existing.on_hand_qty.saturating_add(level.on_hand_qty);
                existing.allocated_qty = existing.allocated_qty.saturating_add(level.allocated_qty);
                existing.blocked_qty = existing.blocked_qty.saturating_add(level.blocked_qty);
            }
            None => {
                self.levels.insert(key, level);
            }
        }
    }

    /// 建構器模式：添加庫存
    pub fn with(mut self, level: StockLevel) -> Self {
        self.add(level);
        self
    }

    /// 獲取庫存記錄
    pub fn get(&self, product_number: &str, location: &str) -> Option<&StockLevel> {
        self.levels
            .get(&(product_number.to_string(), location.to_string()))
    }
}

impl StockResolver for StockTable {
    fn available_quantity(&self, product: &Product, location: &str) -> Option<Decimal> {
        self.get(&product.number, location).map(StockLevel::available_qty)
    }
}
