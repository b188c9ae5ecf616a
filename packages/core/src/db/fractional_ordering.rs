use crate::models::Node;
use std::borrow::Borrow;

/// New order for one node produced by renormalization
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAssignment {
    pub node_id: String,
    pub order: f64,
}

/// Calculates fractional sibling orders
///
/// Inserting between two siblings takes the midpoint of their orders, so a
/// single insert never renumbers its neighbours. Repeated midpoints shrink
/// the gap until floating point can no longer separate the keys, which is
/// why every structural move is followed by [`OrderAllocator::renormalize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderAllocator {
    step: f64,
    rebalance_threshold: f64,
}

impl Default for OrderAllocator {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

impl OrderAllocator {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            rebalance_threshold: 0.0001,
        }
    }

    pub fn with_rebalance_threshold(mut self, threshold: f64) -> Self {
        self.rebalance_threshold = threshold;
        self
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Order given to the first node of an empty sibling set
    pub fn baseline(&self) -> f64 {
        self.step
    }

    /// Calculate order value for inserting between prev and next
    ///
    /// # Examples
    /// ```
    /// # use layercake_core::db::OrderAllocator;
    /// let allocator = OrderAllocator::new(1000.0);
    /// assert_eq!(allocator.calculate_order(None, None), 1000.0);
    /// assert_eq!(allocator.calculate_order(None, Some(1000.0)), 0.0);
    /// assert_eq!(allocator.calculate_order(Some(3000.0), None), 4000.0);
    /// assert_eq!(allocator.calculate_order(Some(1000.0), Some(2000.0)), 1500.0);
    /// ```
    pub fn calculate_order(&self, prev_order: Option<f64>, next_order: Option<f64>) -> f64 {
        match (prev_order, next_order) {
            (None, None) => self.baseline(),
            (None, Some(next)) => next - self.step,
            (Some(prev), None) => prev + self.step,
            (Some(prev), Some(next)) => prev + (next - prev) / 2.0,
        }
    }

    /// Order placing a node at `insert_index` among `siblings`.
    ///
    /// `siblings` must be sorted by order and must not contain the node
    /// being placed. An index past the end appends.
    pub fn order_for_position<N: Borrow<Node>>(&self, siblings: &[N], insert_index: usize) -> f64 {
        let prev = insert_index
            .checked_sub(1)
            .and_then(|i| siblings.get(i))
            .map(|n| n.borrow().sort_key());
        let next = siblings.get(insert_index).map(|n| n.borrow().sort_key());

        // Past the end there is no "next", only the last sibling
        let prev = if insert_index > siblings.len() {
            siblings.last().map(|n| n.borrow().sort_key())
        } else {
            prev
        };

        self.calculate_order(prev, next)
    }

    /// Order appending a node after every sibling
    pub fn append_order<N: Borrow<Node>>(&self, siblings: &[N]) -> f64 {
        siblings
            .iter()
            .filter_map(|n| n.borrow().order)
            .reduce(f64::max)
            .map_or_else(|| self.baseline(), |max| max + self.step)
    }

    /// Check if rebalancing is needed (gap too small)
    pub fn needs_rebalancing(&self, orders: &[f64]) -> bool {
        orders
            .windows(2)
            .any(|pair| pair[1] - pair[0] < self.rebalance_threshold)
    }

    /// Reassign evenly spaced orders to `siblings` in their current order.
    ///
    /// `siblings` must already be sorted. Only nodes whose order actually
    /// changes are returned. Locked siblings keep their order: the unlocked
    /// runs between them are spread across the gap they sit in. Without
    /// locked siblings the result is `step, 2*step, 3*step, ...`.
    ///
    /// # Example
    /// Input orders:  `[1000, 1500, 2000, 3000]`
    /// Output orders: `[1000, 2000, 3000, 4000]`
    pub fn renormalize<N: Borrow<Node>>(&self, siblings: &[N]) -> Vec<OrderAssignment> {
        let mut assignments = Vec::new();
        let mut run: Vec<&Node> = Vec::new();
        let mut lower: Option<f64> = None;

        for sibling in siblings {
            let node = sibling.borrow();
            if node.locked {
                let anchor = node.sort_key();
                self.space_run(&run, lower, Some(anchor), &mut assignments);
                run.clear();
                lower = Some(anchor);
            } else {
                run.push(node);
            }
        }
        self.space_run(&run, lower, None, &mut assignments);

        assignments
    }

    fn space_run(
        &self,
        run: &[&Node],
        lower: Option<f64>,
        upper: Option<f64>,
        assignments: &mut Vec<OrderAssignment>,
    ) {
        let n = run.len();
        for (i, node) in run.iter().enumerate() {
            let order = match (lower, upper) {
                (None, None) => self.step * (i + 1) as f64,
                (Some(low), None) => low + self.step * (i + 1) as f64,
                (None, Some(high)) => high - self.step * (n - i) as f64,
                (Some(low), Some(high)) => low + (high - low) * (i + 1) as f64 / (n + 1) as f64,
            };
            if node.order != Some(order) {
                assignments.push(OrderAssignment {
                    node_id: node.id.clone(),
                    order,
                });
            }
        }
    }
}
