use foundation::bounds::Extent;
use foundation::ids::FeatureId;
use foundation::math::precision::stable_total_cmp_f64;

/// A deterministic bounding volume hierarchy over planar feature extents.
///
/// Ordering contract:
/// - `query_extent` returns feature ids in ascending order.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Extent,
        items: Vec<Item>,
    },
    Internal {
        bounds: Extent,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub id: FeatureId,
    pub bounds: Extent,
}

impl Bvh {
    pub fn build(items: Vec<Item>) -> Self {
        let mut nodes = Vec::new();
        let mut items = items;
        if !items.is_empty() {
            let _root = build_node(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Candidate ids whose extents intersect `query`, ascending.
    pub fn query_extent(&self, query: &Extent) -> Vec<FeatureId> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<FeatureId> = Vec::new();
        let mut stack: Vec<usize> = vec![0];

        while let Some(idx) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { bounds, items } => {
                    if !bounds.intersects(query) {
                        continue;
                    }
                    for item in items {
                        if item.bounds.intersects(query) {
                            hits.push(item.id);
                        }
                    }
                }
                Node::Internal {
                    bounds,
                    left,
                    right,
                } => {
                    if !bounds.intersects(query) {
                        continue;
                    }
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        hits.sort();
        hits.dedup();
        hits
    }
}

const LEAF_MAX: usize = 8;

fn build_node(nodes: &mut Vec<Node>, items: &mut [Item]) -> usize {
    let bounds = bounds_for_items(items);
    if items.len() <= LEAF_MAX {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            bounds,
            items: items.to_vec(),
        });
        return idx;
    }

    let axis = if bounds.width() >= bounds.height() { 0 } else { 1 };
    items.sort_by(|a, b| {
        let ca = centroid_axis(&a.bounds, axis);
        let cb = centroid_axis(&b.bounds, axis);
        stable_total_cmp_f64(ca, cb).then_with(|| a.id.cmp(&b.id))
    });

    let mid = items.len() / 2;
    let (left_items, right_items) = items.split_at_mut(mid);

    let idx = nodes.len();
    // Placeholder; patched once both children exist.
    nodes.push(Node::Leaf {
        bounds,
        items: Vec::new(),
    });

    let left = build_node(nodes, left_items);
    let right = build_node(nodes, right_items);

    nodes[idx] = Node::Internal {
        bounds,
        left,
        right,
    };
    idx
}

fn centroid_axis(extent: &Extent, axis: usize) -> f64 {
    (extent.min[axis] + extent.max[axis]) * 0.5
}

fn bounds_for_items(items: &[Item]) -> Extent {
    let mut b = items[0].bounds;
    for item in &items[1..] {
        b = b.union(&item.bounds);
    }
    b
}
