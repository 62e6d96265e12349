//! 自行車成本計算示例

use anyhow::Context;
use chrono::NaiveDate;
use cost_calc::CostCalculator;
use cost_core::{
    CostCalculationRequest, Operation, OperationRateTable, OperationRates, Product,
    ProductComponent, ProductCostNorms, ProductCostTable, StockLevel, StockTable, Technology,
    TechnologyNode, TimeNorms,
};
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== 自行車成本計算示例 ===\n");

    // 工藝樹：整車組裝 ← 車架焊接 ← 鋼管切割
    let frame = Product::new("FRAME-001", "Frame", "pcs").as_stocked();
    let mut technology = Technology::new(
        "TECH-BIKE-001",
        "Bike assembly",
        Product::new("BIKE-001", "Bike", "pcs"),
    );
    let root = technology.add_root(
        TechnologyNode::new("1", Operation::new("ASSY", "Assembly"))
            .with_output(ProductComponent::new(
                Product::new("BIKE-001", "Bike", "pcs"),
                Decimal::ONE,
            ))
            .with_input(ProductComponent::new(frame.clone(), Decimal::ONE))
            .with_input(ProductComponent::new(
                Product::new("WHEEL-001", "Wheel", "pcs"),
                Decimal::TWO,
            ))
            .with_time_norms(TimeNorms::new(300, 1800)),
    );
    let weld = technology.add_child(
        root,
        TechnologyNode::new("1.1", Operation::new("WELD", "Welding"))
            .with_output(ProductComponent::new(frame, Decimal::ONE))
            .with_input(ProductComponent::new(
                Product::new("TUBE-001", "Tube", "pcs"),
                Decimal::from(3),
            ))
            .with_time_norms(TimeNorms::new(900, 900).with_setup_time(1200)),
    )?;
    technology.add_child(
        weld,
        TechnologyNode::new("1.1.1", Operation::new("CUT", "Cutting"))
            .with_output(ProductComponent::new(
                Product::new("TUBE-001", "Tube", "pcs"),
                Decimal::ONE,
            ))
            .with_input(ProductComponent::new(
                Product::new("STEEL-001", "Steel", "kg"),
                Decimal::new(5, 1),
            ))
            .with_time_norms(TimeNorms::new(120, 60).with_whole_cycles_only()),
    )?;

    // 價格與費率
    let prices = ProductCostTable::new()
        .with(ProductCostNorms::new("WHEEL-001").with_nominal_cost(Decimal::from(35)))
        .with(
            ProductCostNorms::new("STEEL-001")
                .with_nominal_cost(Decimal::from(120))
                .with_cost_for_number(Decimal::from(10)),
        );
    let rates = OperationRateTable::new()
        .with(OperationRates::new("WELD", Decimal::from(80), Decimal::from(45)))
        .with_defaults(Decimal::from(30), Decimal::from(40));
    let stock = StockTable::new().with(StockLevel::new("WHEEL-001", "WH-01", Decimal::from(150)));

    let request = CostCalculationRequest::new(
        "CC-2025-001",
        NaiveDate::from_ymd_opt(2025, 11, 1).context("無效的日期")?,
        Decimal::from(100),
    )
    .with_margins(Decimal::from(10), Decimal::from(5))
    .with_additional_overhead(Decimal::from(250))
    .with_profit(Decimal::from(20))
    .with_include_components(true)
    .with_location("WH-01");

    let calculator = CostCalculator::new(prices, rates).with_stock(stock);
    let run = calculator.calculate(&request, &[technology])?;
    tracing::info!(
        "計算 {}（{}）完成：結果 {} 筆，失敗 {} 筆",
        run.number,
        run.calculation_id,
        run.results.len(),
        run.failures.len()
    );

    println!("物料成本:");
    for line in &run.material_costs {
        println!(
            "  - {} 數量 {} × {} = {}（庫存 {:?}）",
            line.product_number,
            line.quantity,
            line.cost_per_unit,
            line.cost_for_given_quantity,
            line.stock_quantity
        );
    }

    println!("\n工序成本:");
    for line in &run.labour_costs {
        println!(
            "  - {} {} 機台 {} 秒 / 人工 {} 秒 = {}",
            line.node_number,
            line.operation_number,
            line.machine_work_time,
            line.labour_work_time,
            line.operation_cost
        );
    }

    println!("\n零組件成本:");
    for component in &run.component_costs {
        println!(
            "  - {} 數量 {}，單位成本 {}",
            component.product_number, component.quantity, component.cost_per_unit
        );
    }

    for result in &run.results {
        println!("\n{} 彙總:", result.technology_number);
        println!("  生產成本: {}", result.production_costs);
        println!("  總成本:   {}", result.total_cost);
        println!("  售價:     {}", result.selling_price);
        if let Some(per_unit) = result.selling_price_per_unit() {
            println!("  單位售價: {}", per_unit.round_dp(2));
        }
    }

    for warning in &run.warnings {
        println!("警告: {}", warning.message);
    }

    println!("\n{}", serde_json::to_string_pretty(&run.results)?);

    Ok(())
}
