//! 工藝樹模型（工藝路線 + 物料清單）
//!
//! 節點以 arena 方式存放，父子關係以 [`NodeId`] 索引表示，避免所有權循環。

use std::cmp::Ordering;
use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::{Product, ProductComponent};
use crate::{CostError, Result};

/// 節點索引（對應 `Technology::nodes` 的位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// 工序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// 工序編號
    pub number: String,

    /// 工序名稱
    pub name: String,
}

impl Operation {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
        }
    }
}

/// 工時定額（秒，以一個批次計）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeNorms {
    /// 準備時間（每次生產只計一次）
    #[serde(default)]
    pub setup_time: Option<u32>,

    /// 每批次機台工時
    #[serde(default)]
    pub machine_work_time: Option<u32>,

    /// 每批次人工工時
    #[serde(default)]
    pub labour_work_time: Option<u32>,

    /// 批次數是否必須為整數（不可分割的生產週期）
    #[serde(default)]
    pub whole_cycles_only: bool,
}

impl TimeNorms {
    /// 創建工時定額
    pub fn new(machine_work_time: u32, labour_work_time: u32) -> Self {
        Self {
            setup_time: None,
            machine_work_time: Some(machine_work_time),
            labour_work_time: Some(labour_work_time),
            whole_cycles_only: false,
        }
    }

    /// 建構器模式：設置準備時間
    pub fn with_setup_time(mut self, seconds: u32) -> Self {
        self.setup_time = Some(seconds);
        self
    }

    /// 建構器模式：批次數向上取整
    pub fn with_whole_cycles_only(mut self) -> Self {
        self.whole_cycles_only = true;
        self
    }
}

/// 工藝節點（一個工序步驟）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyNode {
    /// 節點索引
    pub id: NodeId,

    /// 節點編號（層級路徑，例如 "1.2.3"）
    pub node_number: String,

    /// 工序
    pub operation: Operation,

    /// 父節點（根節點為 None）
    pub parent: Option<NodeId>,

    /// 子節點
    #[serde(default)]
    pub children: Vec<NodeId>,

    /// 產出料件（每批次）
    #[serde(default)]
    pub output_products: Vec<ProductComponent>,

    /// 投入料件（每批次）
    #[serde(default)]
    pub input_products: Vec<ProductComponent>,

    /// 工時定額
    #[serde(default)]
    pub time_norms: TimeNorms,
}

impl TechnologyNode {
    /// 創建新的工藝節點（尚未加入工藝）
    pub fn new(node_number: impl Into<String>, operation: Operation) -> Self {
        Self {
            id: NodeId(0),
            node_number: node_number.into(),
            operation,
            parent: None,
            children: Vec::new(),
            output_products: Vec::new(),
            input_products: Vec::new(),
            time_norms: TimeNorms::default(),
        }
    }

    /// 建構器模式：添加產出料件
    pub fn with_output(mut self, component: ProductComponent) -> Self {
        self.output_products.push(component);
        self
    }

    /// 建構器模式：添加投入料件
    pub fn with_input(mut self, component: ProductComponent) -> Self {
        self.input_products.push(component);
        self
    }

    /// 建構器模式：設置工時定額
    pub fn with_time_norms(mut self, time_norms: TimeNorms) -> Self {
        self.time_norms = time_norms;
        self
    }

    /// 查找指定產品的產出料件
    pub fn output_of(&self, product_number: &str) -> Option<&ProductComponent> {
        self.output_products
            .iter()
            .find(|c| c.product.number == product_number)
    }

    /// 查找指定產品的投入料件
    pub fn input_of(&self, product_number: &str) -> Option<&ProductComponent> {
        self.input_products
            .iter()
            .find(|c| c.product.number == product_number)
    }

    /// 是否為根節點
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// 工藝：以主產品為根的工序樹
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    /// 工藝編號
    pub number: String,

    /// 工藝名稱
    pub name: String,

    /// 主產品（最終產出）
    pub product: Product,

    /// 節點 arena
    #[serde(default)]
    pub nodes: Vec<TechnologyNode>,

    /// 根節點
    #[serde(default)]
    pub root: Option<NodeId>,
}

impl Technology {
    /// 創建空的工藝
    pub fn new(number: impl Into<String>, name: impl Into<String>, product: Product) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            product,
            nodes: Vec::new(),
            root: None,
        }
    }

    /// 設置根節點
    pub fn add_root(&mut self, mut node: TechnologyNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.id = id;
        node.parent = None;
        self.nodes.push(node);
        self.root = Some(id);
        id
    }

    /// 在父節點下添加子節點
    pub fn add_child(&mut self, parent: NodeId, mut node: TechnologyNode) -> Result<NodeId> {
        if parent.0 >= self.nodes.len() {
            return Err(CostError::NodeNotFound(parent.0));
        }

        let id = NodeId(self.nodes.len());
        node.id = id;
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// 獲取節點
    pub fn node(&self, id: NodeId) -> Option<&TechnologyNode> {
        self.nodes.get(id.0)
    }

    /// 獲取節點，不存在時回傳 InvalidTechnology
    pub fn try_node(&self, id: NodeId) -> Result<&TechnologyNode> {
        self.node(id).ok_or_else(|| {
            CostError::invalid_technology(&self.number, format!("節點索引 {} 不存在", id.0))
        })
    }

    /// 獲取根節點
    pub fn root_node(&self) -> Result<&TechnologyNode> {
        let root = self
            .root
            .ok_or_else(|| CostError::invalid_technology(&self.number, "缺少根節點"))?;
        self.try_node(root)
    }

    /// 節點數量
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 子節點（依節點編號排序）
    pub fn sorted_children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.try_node(id)?;
        let mut children = Vec::with_capacity(node.children.len());
        for &child in &node.children {
            children.push(self.try_node(child)?);
        }
        children.sort_by(|a, b| compare_node_numbers(&a.node_number, &b.node_number));
        Ok(children.into_iter().map(|n| n.id).collect())
    }

    /// 節點的主產出料件
    ///
    /// 根節點：工藝主產品；其他節點：父節點所消耗的產出
    pub fn main_output(&self, id: NodeId) -> Result<&ProductComponent> {
        let node = self.try_node(id)?;

        match node.parent {
            None => node.output_of(&self.product.number).ok_or_else(|| {
                CostError::invalid_technology(
                    &self.number,
                    format!("根節點 {} 沒有產出主產品 {}", node.node_number, self.product.number),
                )
            }),
            Some(parent_id) => {
                let parent = self.try_node(parent_id)?;
                node.output_products
                    .iter()
                    .find(|out| parent.input_of(&out.product.number).is_some())
                    .ok_or_else(|| {
                        CostError::invalid_technology(
                            &self.number,
                            format!(
                                "節點 {} 的產出未被父節點 {} 消耗",
                                node.node_number, parent.node_number
                            ),
                        )
                    })
            }
        }
    }

    /// 查找在指定節點下產出某產品的子節點
    pub fn child_producing(&self, id: NodeId, product_number: &str) -> Result<Option<NodeId>> {
        let node = self.try_node(id)?;
        for &child in &node.children {
            if self.try_node(child)?.output_of(product_number).is_some() {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// 由指定節點開始的前序遍歷（子節點依節點編號排序）
    ///
    /// 重複造訪節點即視為循環，回傳 InvalidTechnology
    pub fn walk_from(&self, start: NodeId) -> Result<Vec<NodeId>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                let node = self.try_node(id)?;
                return Err(CostError::invalid_technology(
                    &self.number,
                    format!("節點 {} 形成循環", node.node_number),
                ));
            }
            order.push(id);

            // 反向壓入，確保依編號順序出棧
            let children = self.sorted_children(id)?;
            stack.extend(children.into_iter().rev());
        }

        Ok(order)
    }

    /// 整棵樹的前序遍歷
    pub fn walk(&self) -> Result<Vec<NodeId>> {
        let root = self.root_node()?.id;
        self.walk_from(root)
    }

    /// 結構檢查：索引、編號唯一、循環、父子連結、可達性、產出唯一
    pub fn validate(&self) -> Result<()> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.0 != index {
                return Err(CostError::invalid_technology(
                    &self.number,
                    format!("節點 {} 的索引不一致", node.node_number),
                ));
            }
            if let Some(parent) = node.parent {
                self.try_node(parent)?;
            }
            for component in node.input_products.iter().chain(&node.output_products) {
                if component.quantity < Decimal::ZERO {
                    return Err(CostError::invalid_technology(
                        &self.number,
                        format!(
                            "節點 {} 的料件 {} 數量為負",
                            node.node_number, component.product.number
                        ),
                    ));
                }
            }
        }

        let mut numbers = HashSet::new();
        for node in &self.nodes {
            if !numbers.insert(node.node_number.as_str()) {
                return Err(CostError::invalid_technology(
                    &self.number,
                    format!("節點編號 {} 重複", node.node_number),
                ));
            }
        }

        let root = self.root_node()?;
        if root.parent.is_some() {
            return Err(CostError::invalid_technology(&self.number, "根節點不可有父節點"));
        }

        let reachable = self.walk()?;
        self.validate_links()?;
        if reachable.len() != self.nodes.len() {
            return Err(CostError::invalid_technology(
                &self.number,
                format!(
                    "{} 個節點無法由根節點到達",
                    self.nodes.len() - reachable.len()
                ),
            ));
        }

        self.main_output(root.id)?;
        self.validate_producers()?;

        Ok(())
    }

    /// 依 `parent` 補齊父節點的 `children`（外部資料常只給父節點）
    pub fn link_children(&mut self) {
        for index in 0..self.nodes.len() {
            let id = self.nodes[index].id;
            let Some(parent) = self.nodes[index].parent else {
                continue;
            };
            if let Some(parent_node) = self.nodes.get_mut(parent.0) {
                if !parent_node.children.contains(&id) {
                    parent_node.children.push(id);
                }
            }
        }
    }

    /// `parent` 與 `children` 必須互相一致
    fn validate_links(&self) -> Result<()> {
        for node in &self.nodes {
            if let Some(parent_id) = node.parent {
                let parent = self.try_node(parent_id)?;
                if !parent.children.contains(&node.id) {
                    return Err(CostError::invalid_technology(
                        &self.number,
                        format!(
                            "節點 {} 未列於父節點 {} 的子節點中",
                            node.node_number, parent.node_number
                        ),
                    ));
                }
            }

            for &child_id in &node.children {
                let child = self.try_node(child_id)?;
                if child.parent != Some(node.id) {
                    return Err(CostError::invalid_technology(
                        &self.number,
                        format!(
                            "節點 {} 列出的子節點 {} 指向其他父節點",
                            node.node_number, child.node_number
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// 同一投入料件只能由一個子節點產出
    fn validate_producers(&self) -> Result<()> {
        for node in &self.nodes {
            for input in &node.input_products {
                let mut producers = Vec::new();
                for &child_id in &node.children {
                    let child = self.try_node(child_id)?;
                    if child.output_of(input.product_number()).is_some() {
                        producers.push(child.node_number.as_str());
                    }
                }
                if producers.len() > 1 {
                    return Err(CostError::invalid_technology(
                        &self.number,
                        format!(
                            "節點 {} 的投入 {} 由多個子節點產出：{}",
                            node.node_number,
                            input.product_number(),
                            producers.join(", ")
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 依層級比較節點編號（"1.2" < "1.10"）
pub fn compare_node_numbers(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
