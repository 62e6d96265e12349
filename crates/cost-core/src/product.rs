//! 產品與工序投入/產出料件模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 產品（物料、半成品、成品）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// 產品編號（唯一識別）
    pub number: String,

    /// 產品名稱
    pub name: String,

    /// 計量單位
    pub unit: String,

    /// 是否為入庫半成品
    ///
    /// 入庫半成品可作為獨立零組件計價（見零組件成本拆解）
    #[serde(default)]
    pub stocked: bool,
}

impl Product {
    /// 創建新產品
    pub fn new(number: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            unit: unit.into(),
            stocked: false,
        }
    }

    /// 建構器模式：標記為入庫半成品
    pub fn as_stocked(mut self) -> Self {
        self.stocked = true;
        self
    }
}

/// 尺寸變體：同一投入料件在不同尺寸組使用不同產品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    /// 尺寸組編號
    pub size_group: String,

    /// 該尺寸組實際使用的產品
    pub product: Product,

    /// 每批次用量
    pub quantity: Decimal,
}

impl SizeVariant {
    pub fn new(size_group: impl Into<String>, product: Product, quantity: Decimal) -> Self {
        Self {
            size_group: size_group.into(),
            product,
            quantity,
        }
    }
}

/// 工序上的投入或產出料件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductComponent {
    /// 產品
    pub product: Product,

    /// 每批次數量（必須 ≥ 0）
    pub quantity: Decimal,

    /// 投入料件類型（例如：布料、線材），僅供報表分類
    #[serde(default)]
    pub input_product_type: Option<String>,

    /// 不同尺寸使用不同產品
    #[serde(default)]
    pub size_variants: Vec<SizeVariant>,
}

impl ProductComponent {
    /// 創建新的料件
    pub fn new(product: Product, quantity: Decimal) -> Self {
        Self {
            product,
            quantity,
            input_product_type: None,
            size_variants: Vec::new(),
        }
    }

    /// 建構器模式：設置投入料件類型
    pub fn with_input_product_type(mut self, input_product_type: impl Into<String>) -> Self {
        self.input_product_type = Some(input_product_type.into());
        self
    }

    /// 建構器模式：設置尺寸變體
    pub fn with_size_variants(mut self, size_variants: Vec<SizeVariant>) -> Self {
        self.size_variants = size_variants;
        self
    }

    /// 是否為「不同尺寸使用不同產品」
    pub fn has_different_products_in_different_sizes(&self) -> bool {
        !self.size_variants.is_empty()
    }

    /// 產品編號
    pub fn product_number(&self) -> &str {
        &self.product.number
    }
}
