//! 需求數量展開
//!
//! 由根節點往下推算每個節點的批次數，並把投入料件換算成目標產量下的所需數量。

use std::collections::{BTreeMap, HashMap, HashSet};

use cost_core::{CostError, NodeId, Product, ProductComponent, Technology, TechnologyNode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checked;

/// 投入料件分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InputKind {
    /// 外購/庫存物料（需計價）
    Material,
    /// 由子節點產出的中間品（成本經由子樹計入）
    Intermediate,
}

/// 物料鍵：產品編號 + 尺寸組
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialKey {
    pub product_number: String,
    pub size_group: Option<String>,
}

/// 節點上換算後的投入需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredInput {
    pub product: Product,
    pub quantity: Decimal,
    pub kind: InputKind,
    pub input_product_type: Option<String>,
    pub different_products_in_different_sizes: bool,
    pub size_group: Option<String>,
}

impl RequiredInput {
    pub fn key(&self) -> MaterialKey {
        MaterialKey {
            product_number: self.product.number.clone(),
            size_group: self.size_group.clone(),
        }
    }

    pub fn is_material(&self) -> bool {
        self.kind == InputKind::Material
    }
}

/// 單一節點的需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRequirement {
    /// 節點
    pub node: NodeId,

    /// 批次數（節點倍數）
    pub batches: Decimal,

    /// 主產出產品
    pub output_product: Product,

    /// 主產出所需數量
    pub output_quantity: Decimal,

    /// 換算後的投入
    pub inputs: Vec<RequiredInput>,
}

/// 彙總後的物料需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeededMaterial {
    pub product: Product,
    pub quantity: Decimal,
    pub input_product_type: Option<String>,
    pub different_products_in_different_sizes: bool,
    pub size_group: Option<String>,
}

/// 一個工藝的數量展開結果
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityPlan {
    /// 工藝編號
    pub technology_number: String,

    /// 目標產量
    pub quantity: Decimal,

    /// 節點需求（前序，依節點編號排序）
    pub nodes: Vec<NodeRequirement>,

    index: HashMap<NodeId, usize>,
}

impl QuantityPlan {
    /// 獲取節點需求
    pub fn node(&self, id: NodeId) -> Option<&NodeRequirement> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// 全部投入（物料與中間品）依產品彙總的所需數量
    pub fn needed_quantities(&self) -> cost_core::Result<BTreeMap<String, Decimal>> {
        let mut quantities = BTreeMap::new();
        for input in self.nodes.iter().flat_map(|n| &n.inputs) {
            let quantity = quantities
                .entry(input.product.number.clone())
                .or_insert(Decimal::ZERO);
            *quantity = checked::add(*quantity, input.quantity, || {
                format!("工藝 {} 投入 {} 的數量合計", self.technology_number, input.product.number)
            })?;
        }
        Ok(quantities)
    }

    /// 需計價的物料，依產品與尺寸組彙總
    pub fn needed_materials(&self) -> cost_core::Result<BTreeMap<MaterialKey, NeededMaterial>> {
        let mut materials: BTreeMap<MaterialKey, NeededMaterial> = BTreeMap::new();

        for input in self
            .nodes
            .iter()
            .flat_map(|n| &n.inputs)
            .filter(|i| i.is_material())
        {
            match materials.get_mut(&input.key()) {
                Some(material) => {
                    material.quantity = checked::add(material.quantity, input.quantity, || {
                        format!(
                            "工藝 {} 物料 {} 的數量合計",
                            self.technology_number, input.product.number
                        )
                    })?;
                }
                None => {
                    materials.insert(
                        input.key(),
                        NeededMaterial {
                            product: input.product.clone(),
                            quantity: input.quantity,
                            input_product_type: input.input_product_type.clone(),
                            different_products_in_different_sizes: input
                                .different_products_in_different_sizes,
                            size_group: input.size_group.clone(),
                        },
                    );
                }
            }
        }

        Ok(materials)
    }
}

/// 數量展開計算器
pub struct QuantityPropagator;

impl QuantityPropagator {
    /// 展開工藝樹
    ///
    /// # 參數
    /// * `quantity` - 最終產品目標產量
    /// * `materials_by_size` - 是否把「不同尺寸使用不同產品」的料件拆成各尺寸組
    pub fn propagate(
        technology: &Technology,
        quantity: Decimal,
        materials_by_size: bool,
    ) -> cost_core::Result<QuantityPlan> {
        technology.validate()?;

        let root = technology.root_node()?;
        let root_output = technology.main_output(root.id)?;
        Self::ensure_positive_output(technology, root, root_output)?;

        let mut nodes = Vec::with_capacity(technology.node_count());
        let mut index = HashMap::new();
        let mut visited = HashSet::new();
        let root_batches = checked::div(quantity, root_output.quantity, || {
            format!("工藝 {} 根節點 {} 的批次數", technology.number, root.node_number)
        })?;
        let mut stack = vec![(root.id, root_batches)];

        while let Some((id, batches)) = stack.pop() {
            let node = technology.try_node(id)?;
            if !visited.insert(id) {
                return Err(CostError::invalid_technology(
                    &technology.number,
                    format!("節點 {} 形成循環", node.node_number),
                ));
            }

            let main_output = technology.main_output(id)?;

            let mut inputs = Vec::new();
            for component in &node.input_products {
                let kind = match technology.child_producing(id, component.product_number())? {
                    Some(_) => InputKind::Intermediate,
                    None => InputKind::Material,
                };
                Self::scale_component(component, batches, kind, materials_by_size, &mut inputs)
                    .map_err(|_| {
                        CostError::overflow(format!(
                            "工藝 {} 節點 {} 投入 {} 的所需數量",
                            technology.number,
                            node.node_number,
                            component.product_number()
                        ))
                    })?;
            }

            // 反向壓入，確保依節點編號出棧
            for child_id in technology.sorted_children(id)?.into_iter().rev() {
                let child = technology.try_node(child_id)?;
                let child_output = technology.main_output(child_id)?;
                Self::ensure_positive_output(technology, child, child_output)?;

                let consumed = node
                    .input_of(child_output.product_number())
                    .map(|c| c.quantity)
                    .unwrap_or(Decimal::ZERO);
                let child_batches = checked::mul(batches, consumed, String::new)
                    .and_then(|q| checked::div(q, child_output.quantity, String::new))
                    .map_err(|_| {
                        CostError::overflow(format!(
                            "工藝 {} 節點 {} 的批次數",
                            technology.number, child.node_number
                        ))
                    })?;
                stack.push((child_id, child_batches));
            }

            index.insert(id, nodes.len());
            nodes.push(NodeRequirement {
                node: id,
                batches,
                output_product: main_output.product.clone(),
                output_quantity: checked::mul(batches, main_output.quantity, || {
                    format!("工藝 {} 節點 {} 的產出數量", technology.number, node.node_number)
                })?,
                inputs,
            });
        }

        tracing::debug!(
            "工藝 {} 數量展開完成：節點 {} 個",
            technology.number,
            nodes.len()
        );

        Ok(QuantityPlan {
            technology_number: technology.number.clone(),
            quantity,
            nodes,
            index,
        })
    }

    fn ensure_positive_output(
        technology: &Technology,
        node: &TechnologyNode,
        output: &ProductComponent,
    ) -> cost_core::Result<()> {
        if output.quantity <= Decimal::ZERO {
            return Err(CostError::invalid_technology(
                &technology.number,
                format!(
                    "節點 {} 的產出 {} 數量必須大於 0",
                    node.node_number, output.product.number
                ),
            ));
        }
        Ok(())
    }

    fn scale_component(
        component: &ProductComponent,
        batches: Decimal,
        kind: InputKind,
        materials_by_size: bool,
        inputs: &mut Vec<RequiredInput>,
    ) -> cost_core::Result<()> {
        let different_sizes = component.has_different_products_in_different_sizes();

        if materials_by_size && different_sizes && kind == InputKind::Material {
            for variant in &component.size_variants {
                inputs.push(RequiredInput {
                    product: variant.product.clone(),
                    quantity: checked::mul(variant.quantity, batches, String::new)?,
                    kind,
                    input_product_type: component.input_product_type.clone(),
                    different_products_in_different_sizes: true,
                    size_group: Some(variant.size_group.clone()),
                });
            }
            return Ok(());
        }

        inputs.push(RequiredInput {
            product: component.product.clone(),
            quantity: checked::mul(component.quantity, batches, String::new)?,
            kind,
            input_product_type: component.input_product_type.clone(),
            different_products_in_different_sizes: different_sizes,
            size_group: None,
        });
        Ok(())
    }
}
