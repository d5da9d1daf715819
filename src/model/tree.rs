use ndarray::{ArrayView1, ArrayView2};
use rand::{rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// A node of a regression tree. Children are indices into the tree's node arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// How many non-constant features to scan per split. `None` scans all
    pub max_features: Option<usize>,
}

/// CART regression tree using the squared-error criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

struct Grower<'a> {
    data: ArrayView2<'a, f64>,
    target: ArrayView1<'a, f64>,
    params: TreeParams,
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the given rows of `data`. Rows may repeat (bootstrap samples)
    pub fn grow(
        data: &ArrayView2<f64>,
        target: &ArrayView1<f64>,
        rows: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> RegressionTree {
        let mut grower = Grower {
            data: data.view(),
            target: target.view(),
            params,
            nodes: vec![],
        };
        grower.build(rows, 0, rng);

        RegressionTree {
            nodes: grower.nodes,
        }
    }

    pub fn predict_row(&self, row: &ArrayView1<f64>) -> f64 {
        let mut idx = 0;

        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }

        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Every child index points forward inside the arena and uses a known feature.
    /// Checked on artifacts coming from disk so that prediction cannot loop or panic
    pub fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { value } => value.is_finite(),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    *feature < n_features
                        && threshold.is_finite()
                        && *left > idx
                        && *right > idx
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

impl<'a> Grower<'a> {
    /// Append the subtree for `rows` and return the index of its root
    fn build(&mut self, rows: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let idx = self.nodes.len();
        let sum: f64 = rows.iter().map(|&r| self.target[r]).sum();
        self.nodes.push(Node::Leaf {
            value: sum / rows.len() as f64,
        });

        let first = self.target[rows[0]];
        let pure = rows.iter().all(|&r| self.target[r] == first);
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);

        if pure || too_deep || rows.len() < self.params.min_samples_split {
            return idx;
        }

        let Some(split) = self.best_split(&rows, rng) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.data[[r, split.feature]] <= split.threshold);

        let left = self.build(left_rows, depth + 1, rng);
        let right = self.build(right_rows, depth + 1, rng);

        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        idx
    }

    fn best_split(&self, rows: &[usize], rng: &mut StdRng) -> Option<Candidate> {
        let n_features = self.data.ncols();
        let limit = self.params.max_features.unwrap_or(n_features).min(n_features);
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<Candidate> = None;
        let mut visited = 0;

        for feature in features {
            if visited == limit {
                break;
            }
            // Constant features do not count towards the limit
            let Some(candidate) = self.scan(rows, feature) else {
                continue;
            };
            visited += 1;

            if best.as_ref().map_or(true, |b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }

        best
    }

    /// Best threshold on one feature. Maximising sum_l^2/n_l + sum_r^2/n_r is the
    /// same as minimising the children's total squared error
    fn scan(&self, rows: &[usize], feature: usize) -> Option<Candidate> {
        let mut sorted: Vec<(f64, f64)> = rows
            .iter()
            .map(|&r| (self.data[[r, feature]], self.target[r]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let total: f64 = sorted.iter().map(|(_, y)| y).sum();
        let mut left_sum = 0f64;
        let mut best: Option<Candidate> = None;

        for i in 1..n {
            left_sum += sorted[i - 1].1;

            let (lo, hi) = (sorted[i - 1].0, sorted[i].0);
            if lo == hi {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / i as f64 + right_sum * right_sum / (n - i) as f64;

            if best.as_ref().map_or(true, |b| score > b.score) {
                let mid = lo + (hi - lo) / 2f64;
                // The midpoint can round up to `hi` for adjacent floats
                let threshold = if mid < hi { mid } else { lo };
                best = Some(Candidate {
                    feature,
                    threshold,
                    score,
                });
            }
        }

        best
    }
}
