//! # Costing
//!
//! 工藝成本計算：由工藝樹推算物料、人工成本，彙總為總成本與售價。
//!
//! - [`cost_core`]：資料模型、計算請求、外部資料介面
//! - [`cost_calc`]：計算引擎

pub use cost_calc;
pub use cost_core;

pub use cost_calc::{CostCalculationRun, CostCalculator, CostWarning, TechnologyFailure};
pub use cost_core::{CostCalculationRequest, CostError, Result};
