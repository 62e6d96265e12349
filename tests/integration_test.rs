//! 集成測試

use chrono::NaiveDate;
use cost_calc::{CostCalculator, WarningKind};
use cost_core::{
    CostCalculationRequest, CostError, MaterialCostsUsed, NodeId, Operation, OperationRateTable,
    OperationRates, Product, ProductComponent, ProductCostNorms, ProductCostTable, SizeVariant,
    SourceOfOperationCosts, StandardLaborCost, Technology, TechnologyCatalog, TechnologyNode,
    TimeNorms,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
}

fn product(number: &str) -> Product {
    Product::new(number, number, "pcs")
}

/// 單層工藝：每批 1 個 TABLE，消耗 2.5 個 RAW，人工 360 秒
fn table_technology() -> Technology {
    let mut technology = Technology::new("T-TABLE", "Table", product("TABLE"));
    technology.add_root(
        TechnologyNode::new("1", Operation::new("ASSY", "Assembly"))
            .with_output(ProductComponent::new(product("TABLE"), dec!(1)))
            .with_input(ProductComponent::new(product("RAW"), dec!(2.5)))
            .with_time_norms(TimeNorms::new(0, 360)),
    );
    technology
}

/// 多層工藝：
///
/// ```text
/// 1      ASSY  BIKE x1  ← FRAME x1 + WHEEL x2
/// 1.1    WELD  FRAME x2 ← TUBE x3
/// 1.1.1  CUT   TUBE x1  ← STEEL x0.5
/// ```
fn bike_technology() -> Technology {
    let frame = product("FRAME").as_stocked();
    let mut technology = Technology::new("T-BIKE", "Bike", product("BIKE"));
    let root = technology.add_root(
        TechnologyNode::new("1", Operation::new("ASSY", "Assembly"))
            .with_output(ProductComponent::new(product("BIKE"), dec!(1)))
            .with_input(
                ProductComponent::new(frame.clone(), dec!(1)).with_input_product_type("frame"),
            )
            .with_input(ProductComponent::new(product("WHEEL"), dec!(2)))
            .with_time_norms(TimeNorms::new(0, 1800)),
    );
    let weld = technology
        .add_child(
            root,
            TechnologyNode::new("1.1", Operation::new("WELD", "Welding"))
                .with_output(ProductComponent::new(frame, dec!(2)))
                .with_input(ProductComponent::new(product("TUBE"), dec!(3)))
                .with_time_norms(TimeNorms::new(720, 720)),
        )
        .unwrap();
    technology
        .add_child(
            weld,
            TechnologyNode::new("1.1.1", Operation::new("CUT", "Cutting"))
                .with_output(ProductComponent::new(product("TUBE"), dec!(1)))
                .with_input(ProductComponent::new(product("STEEL"), dec!(0.5)))
                .with_time_norms(TimeNorms::new(120, 0)),
        )
        .unwrap();
    technology
}

fn prices() -> ProductCostTable {
    ProductCostTable::new()
        .with(ProductCostNorms::new("RAW").with_nominal_cost(dec!(4.00)))
        .with(ProductCostNorms::new("WHEEL").with_nominal_cost(dec!(15)))
        .with(ProductCostNorms::new("STEEL").with_nominal_cost(dec!(8)))
}

fn rates() -> OperationRateTable {
    OperationRateTable::new()
        .with(OperationRates::new("ASSY", dec!(0), dec!(50)))
        .with(OperationRates::new("WELD", dec!(60), dec!(30)))
        .with(OperationRates::new("CUT", dec!(40), dec!(0)))
}

fn calculator() -> CostCalculator<ProductCostTable, OperationRateTable> {
    CostCalculator::new(prices(), rates())
}

#[test]
fn test_single_level_material_cost() {
    let request = CostCalculationRequest::new("CC-001", date(), dec!(10));

    let run = calculator().calculate(&request, &[table_technology()]).unwrap();

    assert_eq!(run.material_costs.len(), 1);
    let raw = &run.material_costs[0];
    assert_eq!(raw.product_number, "RAW");
    assert_eq!(raw.final_product_number, "TABLE");
    assert_eq!(raw.quantity, dec!(25.0));
    assert_eq!(raw.cost_for_given_quantity, dec!(100.00));

    let result = run.result_for("T-TABLE").unwrap();
    assert_eq!(result.material_costs, dec!(100.00));
    assert_eq!(result.quantity, dec!(10));
    assert!(!result.contains_unpriced_materials);
    // 物料 100 + 人工 1 小時 × 50
    assert_eq!(result.selling_price, dec!(150.00));
    assert_eq!(result.selling_price_per_unit(), Some(dec!(15)));
}

#[test]
fn test_margins_and_overhead() {
    // 物料 100，人工 10 批 × 360 秒 = 1 小時 × 50 = 50
    let request = CostCalculationRequest::new("CC-002", date(), dec!(10))
        .with_margins(dec!(10), dec!(5))
        .with_additional_overhead(dec!(5));

    let run = calculator().calculate(&request, &[table_technology()]).unwrap();
    let result = &run.results[0];

    assert_eq!(result.labour_cost, dec!(50.00));
    assert_eq!(result.production_costs, dec!(150.00));
    assert_eq!(result.material_cost_margin_value, dec!(10.00));
    assert_eq!(result.labour_cost_margin_value, dec!(2.50));
    assert_eq!(result.total_cost, dec!(167.50));
    assert_eq!(result.registration_price, dec!(167.50));
    assert_eq!(result.selling_price, dec!(167.50));
}

#[test]
fn test_multi_level_bike() {
    let request =
        CostCalculationRequest::new("CC-BIKE", date(), dec!(10)).with_include_components(true);

    let run = calculator().calculate(&request, &[bike_technology()]).unwrap();
    assert!(run.is_complete());
    assert!(run.warnings.is_empty());

    // 只有外購物料列入明細：STEEL 7.5 × 8 = 60；WHEEL 20 × 15 = 300
    let materials: Vec<_> = run
        .material_costs
        .iter()
        .map(|l| (l.product_number.as_str(), l.quantity, l.cost_for_given_quantity))
        .collect();
    assert_eq!(
        materials,
        vec![("STEEL", dec!(7.5), dec!(60.00)), ("WHEEL", dec!(20), dec!(300.00))]
    );

    // ASSY：10 批 × 1800 秒 = 5 小時 × 50 = 250
    // WELD：5 批 × 720 秒 = 1 小時 × (60 + 30) = 90
    // CUT：15 批 × 120 秒 = 0.5 小時 × 40 = 20
    let operations: Vec<_> = run
        .labour_costs
        .iter()
        .map(|l| (l.node_number.as_str(), l.operation_cost))
        .collect();
    assert_eq!(
        operations,
        vec![("1", dec!(250.00)), ("1.1", dec!(90.00)), ("1.1.1", dec!(20.00))]
    );
    assert_eq!(run.labour_costs[2].machine_work_time, 1800);
    assert_eq!(run.labour_costs[2].operation_output, "TUBE");

    let result = &run.results[0];
    assert_eq!(result.material_costs, dec!(360.00));
    assert_eq!(result.labour_cost, dec!(360.00));
    assert_eq!(result.production_costs, dec!(720.00));
    assert!(result.contains_components);

    // FRAME 子樹：物料 60，人工 90 + 20 = 110，數量 10
    assert_eq!(run.component_costs.len(), 1);
    let frame = &run.component_costs[0];
    assert_eq!(frame.product_number, "FRAME");
    assert_eq!(frame.input_product_type.as_deref(), Some("frame"));
    assert_eq!(frame.quantity, dec!(10));
    assert_eq!(frame.material_cost, dec!(60.00));
    assert_eq!(frame.labour_cost, dec!(110.00));
    assert_eq!(frame.sum_of_costs, dec!(170.00));
    assert_eq!(frame.cost_per_unit, dec!(17.00));
    assert_eq!(frame.cost_calculation_id, run.calculation_id);
}

#[test]
fn test_components_not_requested() {
    let request = CostCalculationRequest::new("CC-NOCOMP", date(), dec!(10));

    let run = calculator().calculate(&request, &[bike_technology()]).unwrap();

    assert!(run.component_costs.is_empty());
    assert!(!run.results[0].contains_components);
}

#[test]
fn test_cycle_does_not_abort_other_technologies() {
    let mut cyclic = bike_technology();
    cyclic.nodes[2].children.push(NodeId(1));
    let request = CostCalculationRequest::new("CC-CYCLE", date(), dec!(10));

    let run = calculator()
        .calculate(&request, &[cyclic, table_technology()])
        .unwrap();

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].technology_number, "T-BIKE");
    assert!(matches!(run.failures[0].error, CostError::InvalidTechnology { .. }));
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].technology_number, "T-TABLE");
    assert!(run.material_costs.iter().all(|l| l.technology_number == "T-TABLE"));
}

/// 節點只給 `parent`，不列 `children`
const PARENT_LINKED_BIKE: &str = r#"[
    {
        "number": "T-BIKE",
        "name": "Bike",
        "product": { "number": "BIKE", "name": "Bike", "unit": "pcs" },
        "root": 0,
        "nodes": [
            {
                "id": 0,
                "node_number": "1",
                "operation": { "number": "ASSY", "name": "Assembly" },
                "parent": null,
                "output_products": [
                    { "product": { "number": "BIKE", "name": "Bike", "unit": "pcs" }, "quantity": "1" }
                ],
                "input_products": [
                    { "product": { "number": "FRAME", "name": "Frame", "unit": "pcs" }, "quantity": "1" }
                ]
            },
            {
                "id": 1,
                "node_number": "1.1",
                "operation": { "number": "WELD", "name": "Welding" },
                "parent": 0,
                "output_products": [
                    { "product": { "number": "FRAME", "name": "Frame", "unit": "pcs" }, "quantity": "1" }
                ],
                "input_products": [
                    { "product": { "number": "STEEL", "name": "Steel", "unit": "kg" }, "quantity": "3" }
                ]
            }
        ]
    }
]"#;

#[test]
fn test_parent_linked_catalog_keeps_subtree() {
    let catalog = TechnologyCatalog::from_json(PARENT_LINKED_BIKE).unwrap();
    let calculator = CostCalculator::new(
        ProductCostTable::new().with(ProductCostNorms::new("STEEL").with_nominal_cost(dec!(2))),
        OperationRateTable::new(),
    );
    let request = CostCalculationRequest::new("CC-LINK", date(), dec!(10));

    let run = calculator
        .calculate_for_products(&request, &catalog, &["BIKE"])
        .unwrap();

    assert!(run.is_complete());
    // FRAME 是中間品，不計價；STEEL 30 kg × 2
    assert_eq!(run.material_costs.len(), 1);
    assert_eq!(run.material_costs[0].product_number, "STEEL");
    assert_eq!(run.material_costs[0].quantity, dec!(30));
    assert_eq!(run.results[0].material_costs, dec!(60.00));
    assert!(!run.results[0].contains_unpriced_materials);
}

#[test]
fn test_inconsistent_links_fail_technology() {
    let mut broken = bike_technology();
    // 根節點不再列出車架節點，車架節點仍指向根節點
    broken.nodes[0].children.clear();
    let request = CostCalculationRequest::new("CC-LINKS", date(), dec!(10));

    let run = calculator()
        .calculate(&request, &[broken, table_technology()])
        .unwrap();

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].technology_number, "T-BIKE");
    assert!(matches!(run.failures[0].error, CostError::InvalidTechnology { .. }));
    assert_eq!(run.results.len(), 1);
}

#[test]
fn test_overflow_does_not_abort_other_technologies() {
    let mut huge_input = table_technology();
    huge_input.number = "T-HUGE".to_string();
    huge_input.nodes[0].input_products[0].quantity = dec!(1000);
    huge_input.nodes[0].time_norms = TimeNorms::default();
    let mut plain = table_technology();
    plain.nodes[0].time_norms = TimeNorms::default();
    let request = CostCalculationRequest::new(
        "CC-HUGE",
        date(),
        Decimal::from_i128_with_scale(10_i128.pow(26), 0),
    );

    let run = calculator()
        .calculate(&request, &[huge_input, plain])
        .unwrap();

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].technology_number, "T-HUGE");
    assert!(matches!(run.failures[0].error, CostError::Overflow(_)));
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].technology_number, "T-TABLE");
}

#[test]
fn test_unpriced_material_flag() {
    let prices =
        ProductCostTable::new().with(ProductCostNorms::new("STEEL").with_nominal_cost(dec!(8)));
    let request = CostCalculationRequest::new("CC-UNPRICED", date(), dec!(10));

    let run = CostCalculator::new(prices, rates())
        .calculate(&request, &[bike_technology()])
        .unwrap();

    let result = &run.results[0];
    assert!(result.contains_unpriced_materials);
    assert_eq!(result.material_costs, dec!(60.00));

    let wheel = run
        .material_costs
        .iter()
        .find(|l| l.product_number == "WHEEL")
        .unwrap();
    assert!(!wheel.priced);
    assert_eq!(wheel.cost_for_given_quantity, Decimal::ZERO);

    assert_eq!(run.warnings.len(), 1);
    assert_eq!(run.warnings[0].kind, WarningKind::MissingPrice);
    assert_eq!(run.warnings[0].subject, "WHEEL");
}

#[test]
fn test_specified_cost_with_nominal_fallback() {
    let prices = ProductCostTable::new().with(
        ProductCostNorms::new("RAW")
            .with_nominal_cost(dec!(4))
            .with_last_purchase_cost(dec!(4.4)),
    );
    let request = CostCalculationRequest::new("CC-LP", date(), dec!(10))
        .with_material_costs_used(MaterialCostsUsed::LastPurchase);

    let run = CostCalculator::new(&prices, rates())
        .calculate(&request, &[table_technology()])
        .unwrap();
    assert_eq!(run.results[0].material_costs, dec!(110.00));

    let request = request.with_material_costs_used(MaterialCostsUsed::Average);
    let without_fallback = CostCalculator::new(&prices, rates())
        .calculate(&request, &[table_technology()])
        .unwrap();
    assert!(without_fallback.results[0].contains_unpriced_materials);

    let request = request.with_nominal_fallback(true);
    let with_fallback = CostCalculator::new(&prices, rates())
        .calculate(&request, &[table_technology()])
        .unwrap();
    assert_eq!(with_fallback.results[0].material_costs, dec!(100.00));
    assert!(!with_fallback.results[0].contains_unpriced_materials);
}

#[test]
fn test_standard_labour_cost() {
    let request = CostCalculationRequest::new("CC-STD", date(), dec!(10))
        .with_include_components(true)
        .with_source_of_operation_costs(SourceOfOperationCosts::StandardLaborCosts(
            StandardLaborCost::new("STD-1", "Standard", dec!(123.45)),
        ));

    let run = calculator().calculate(&request, &[bike_technology()]).unwrap();

    assert!(run.labour_costs.is_empty());
    assert_eq!(run.results[0].labour_cost, dec!(123.45));
    assert_eq!(run.results[0].production_costs, dec!(483.45));
    assert_eq!(run.component_costs[0].labour_cost, Decimal::ZERO);
}

#[test]
fn test_materials_by_size() {
    let mut technology = Technology::new("T-SHOE", "Shoe", product("SHOE"));
    technology.add_root(
        TechnologyNode::new("1", Operation::new("SEW", "Sewing"))
            .with_output(ProductComponent::new(product("SHOE"), dec!(1)))
            .with_input(
                ProductComponent::new(product("SOLE"), dec!(1)).with_size_variants(vec![
                    SizeVariant::new("38", product("SOLE-38"), dec!(0.4)),
                    SizeVariant::new("42", product("SOLE-42"), dec!(0.6)),
                ]),
            ),
    );
    let prices = ProductCostTable::new()
        .with(ProductCostNorms::new("SOLE").with_nominal_cost(dec!(5)))
        .with(ProductCostNorms::new("SOLE-38").with_nominal_cost(dec!(4)))
        .with(ProductCostNorms::new("SOLE-42").with_nominal_cost(dec!(6)));
    let calculator = CostCalculator::new(prices, OperationRateTable::new());

    let request = CostCalculationRequest::new("CC-SIZE", date(), dec!(10));
    let whole = calculator.calculate(&request, &[technology.clone()]).unwrap();
    assert_eq!(whole.material_costs.len(), 1);
    assert!(whole.material_costs[0].different_products_in_different_sizes);
    assert_eq!(whole.results[0].material_costs, dec!(50.00));

    let by_size = calculator
        .calculate(&request.with_materials_by_size(true), &[technology])
        .unwrap();
    let lines: Vec<_> = by_size
        .material_costs
        .iter()
        .map(|l| {
            (
                l.size_group_number.as_deref(),
                l.product_number.as_str(),
                l.cost_for_given_quantity,
            )
        })
        .collect();
    assert_eq!(
        lines,
        vec![
            (Some("38"), "SOLE-38", dec!(16.00)),
            (Some("42"), "SOLE-42", dec!(36.00)),
        ]
    );
    assert_eq!(by_size.results[0].material_costs, dec!(52.00));
}

#[test]
fn test_calculate_from_catalog() {
    let mut catalog = TechnologyCatalog::new();
    catalog.insert(table_technology());
    catalog.insert(bike_technology());
    let request = CostCalculationRequest::new("CC-CAT", date(), dec!(1));

    let run = calculator()
        .calculate_for_products(&request, &catalog, &["BIKE", "LAMP", "TABLE"])
        .unwrap();

    let numbers: Vec<_> = run.results.iter().map(|r| r.technology_number.as_str()).collect();
    assert_eq!(numbers, vec!["T-BIKE", "T-TABLE"]);
    assert_eq!(run.failures.len(), 1);
    assert_eq!(
        run.failures[0].error,
        CostError::TechnologyNotFound("LAMP".to_string())
    );
}

#[test]
fn test_repeated_calculation_is_identical() {
    let request = CostCalculationRequest::new("CC-REPEAT", date(), dec!(7))
        .with_margins(dec!(12.5), dec!(7.5))
        .with_registration_price_overhead(dec!(3))
        .with_profit(dec!(15))
        .with_include_components(true);
    let technologies = [bike_technology(), table_technology()];
    let calculator = calculator();

    let mut first = calculator.calculate(&request, &technologies).unwrap();
    let mut second = calculator.calculate(&request, &technologies).unwrap();
    first.calculation_time_ms = None;
    second.calculation_time_ms = None;

    assert_eq!(first, second);
}

#[test]
fn test_line_sums_match_totals() {
    // 3 個產品：不整除的批次數讓明細四捨五入
    let request = CostCalculationRequest::new("CC-SUM", date(), dec!(3)).with_scale(2);

    let run = calculator()
        .calculate(&request, &[bike_technology(), table_technology()])
        .unwrap();

    for result in &run.results {
        let lines: Vec<_> = run
            .material_costs
            .iter()
            .filter(|l| l.technology_number == result.technology_number)
            .collect();
        let sum: Decimal = lines.iter().map(|l| l.cost_for_given_quantity).sum();
        let tolerance = dec!(0.005) * Decimal::from(lines.len() + 1);
        assert!((sum - result.material_costs).abs() <= tolerance);

        let operations: Vec<_> = run
            .labour_costs
            .iter()
            .filter(|l| l.technology_number == result.technology_number)
            .collect();
        let sum: Decimal = operations.iter().map(|l| l.operation_cost).sum();
        let tolerance = dec!(0.005) * Decimal::from(operations.len() + 1);
        assert!((sum - result.labour_cost).abs() <= tolerance);
    }
}

#[test]
fn test_request_and_catalog_from_json() {
    let request = CostCalculationRequest::from_json(
        r#"{
            "id": "0b6a4c55-2f0e-4b8e-9d7c-0f3f7d9d1e21",
            "number": "CC-JSON",
            "date": "2025-11-01",
            "quantity": "10",
            "material_costs_used": "Nominal",
            "use_nominal_cost_price_not_specified": false,
            "source_of_operation_costs": "TechnologyOperation",
            "material_cost_margin": "0",
            "production_cost_margin": "0",
            "additional_overhead": "0",
            "registration_price_overhead": "0",
            "profit": "20",
            "include_components": false
        }"#,
    )
    .unwrap();
    let technology_json = serde_json::to_string(&vec![table_technology()]).unwrap();
    let catalog = TechnologyCatalog::from_json(&technology_json).unwrap();

    let run = calculator()
        .calculate_for_products(&request, &catalog, &["TABLE"])
        .unwrap();

    // (100 + 50) × 1.2
    assert_eq!(run.results[0].selling_price, dec!(180.00));
    assert!(serde_json::to_string(&run).is_ok());
}

proptest! {
    #[test]
    fn prop_material_cost_scales_with_quantity(
        quantity in 1u32..500,
        per_batch in 1u32..10,
        cents in 1i64..100_000,
    ) {
        let mut technology = Technology::new("T-P", "Prop", product("P"));
        technology.add_root(
            TechnologyNode::new("1", Operation::new("OP", "Op"))
                .with_output(ProductComponent::new(product("P"), dec!(1)))
                .with_input(ProductComponent::new(product("M"), Decimal::from(per_batch))),
        );
        let prices = ProductCostTable::new()
            .with(ProductCostNorms::new("M").with_nominal_cost(Decimal::new(cents, 2)));
        let calculator = CostCalculator::new(prices, OperationRateTable::new());

        let single = CostCalculationRequest::new("CC-P1", date(), Decimal::from(quantity));
        let double = CostCalculationRequest::new("CC-P2", date(), Decimal::from(quantity * 2));
        let technologies = [technology];

        let single = calculator.calculate(&single, &technologies).unwrap();
        let double = calculator.calculate(&double, &technologies).unwrap();

        prop_assert_eq!(
            double.results[0].material_costs,
            single.results[0].material_costs * Decimal::TWO
        );
        prop_assert!(single.results[0].selling_price >= single.results[0].production_costs);
    }
}
