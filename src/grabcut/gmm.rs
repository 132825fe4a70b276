//! Gaussian mixture colour model.

use std::f64::consts::PI;

pub type Color = [f64; 3];

/// Added to covariance diagonals so flat regions stay invertible.
const VARIANCE_FLOOR: f64 = 0.01;
const KMEANS_ROUNDS: usize = 10;

#[derive(Debug, Clone)]
struct Component {
    weight: f64,
    mean: Color,
    inverse: [[f64; 3]; 3],
    norm: f64, // 1 / sqrt((2 pi)^3 det)
}

impl Component {
    fn density(&self, c: &Color) -> f64 {
        let d = [c[0] - self.mean[0], c[1] - self.mean[1], c[2] - self.mean[2]];
        let mut mahalanobis = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                mahalanobis += d[i] * self.inverse[i][j] * d[j];
            }
        }
        self.norm * (-0.5 * mahalanobis).exp()
    }
}

#[derive(Debug, Clone)]
pub struct Gmm {
    components: Vec<Component>,
}

impl Gmm {
    /// Fit up to `k` components to `samples`, seeding them with k-means.
    ///
    /// Returns `None` when there is nothing to fit.
    pub fn fit(samples: &[Color], k: usize) -> Option<Self> {
        if samples.is_empty() || k == 0 {
            return None;
        }

        let assignment = kmeans(samples, k.min(samples.len()));
        let clusters = assignment.iter().copied().max().map_or(0, |m| m + 1);
        let total = samples.len() as f64;

        let components = (0..clusters)
            .filter_map(|cluster| {
                let members: Vec<&Color> = samples
                    .iter()
                    .zip(&assignment)
                    .filter(|(_, &a)| a == cluster)
                    .map(|(s, _)| s)
                    .collect();
                component_from(&members, total)
            })
            .collect::<Vec<_>>();

        (!components.is_empty()).then_some(Self { components })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn probability(&self, c: &Color) -> f64 {
        self.components
            .iter()
            .map(|component| component.weight * component.density(c))
            .sum()
    }

    /// Negative log-likelihood, bounded for colours the model never saw.
    pub fn cost(&self, c: &Color) -> f64 {
        -self.probability(c).max(f64::MIN_POSITIVE).ln()
    }
}

fn component_from(members: &[&Color], total: f64) -> Option<Component> {
    if members.is_empty() {
        return None;
    }
    let n = members.len() as f64;

    let mut mean = [0.0; 3];
    for m in members {
        for i in 0..3 {
            mean[i] += m[i];
        }
    }
    mean.iter_mut().for_each(|v| *v /= n);

    let mut cov = [[0.0; 3]; 3];
    for m in members {
        let d = [m[0] - mean[0], m[1] - mean[1], m[2] - mean[2]];
        for i in 0..3 {
            for j in 0..3 {
                cov[i][j] += d[i] * d[j];
            }
        }
    }
    for (i, row) in cov.iter_mut().enumerate() {
        row.iter_mut().for_each(|v| *v /= n);
        row[i] += VARIANCE_FLOOR;
    }

    let det = determinant(&cov);
    if det <= 0.0 {
        return None;
    }

    Some(Component {
        weight: n / total,
        mean,
        inverse: inverse(&cov, det),
        norm: 1.0 / ((2.0 * PI).powi(3) * det).sqrt(),
    })
}

fn determinant(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn inverse(m: &[[f64; 3]; 3], det: f64) -> [[f64; 3]; 3] {
    let mut inv = [[0.0; 3]; 3];
    inv[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det;
    inv[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det;
    inv[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det;
    inv[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det;
    inv[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det;
    inv[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det;
    inv[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det;
    inv[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det;
    inv[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det;
    inv
}

fn distance2(a: &Color, b: &Color) -> f64 {
    (0..3).map(|i| (a[i] - b[i]).powi(2)).sum()
}

/// Lloyd's algorithm seeded from evenly spaced samples. Returns the cluster
/// index of every sample; empty clusters are compacted away.
fn kmeans(samples: &[Color], k: usize) -> Vec<usize> {
    let step = samples.len() / k;
    let mut centers: Vec<Color> = (0..k).map(|i| samples[i * step]).collect();
    let mut assignment = vec![0usize; samples.len()];

    for _ in 0..KMEANS_ROUNDS {
        let mut changed = false;
        for (sample, slot) in samples.iter().zip(assignment.iter_mut()) {
            let nearest = centers
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| distance2(sample, a).total_cmp(&distance2(sample, b)))
                .map_or(0, |(i, _)| i);
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }

        let mut sums = vec![[0.0; 3]; k];
        let mut counts = vec![0usize; k];
        for (sample, &a) in samples.iter().zip(&assignment) {
            for i in 0..3 {
                sums[a][i] += sample[i];
            }
            counts[a] += 1;
        }
        for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
            if count > 0 {
                *center = sum.map(|v| v / count as f64);
            }
        }

        if !changed {
            break;
        }
    }

    // compact cluster ids so they run 0..n without gaps
    let mut remap = vec![usize::MAX; k];
    let mut next = 0;
    for a in assignment.iter_mut() {
        if remap[*a] == usize::MAX {
            remap[*a] = next;
            next += 1;
        }
        *a = remap[*a];
    }
    assignment
}
