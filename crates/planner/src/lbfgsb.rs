//! Box-constrained limited-memory BFGS.
//!
//! Minimizes a scalar objective over a box `lower <= x <= upper` using the
//! two-loop L-BFGS recursion for the search direction, an active-set mask for
//! variables pinned at a bound, and a projected backtracking (Armijo) line
//! search. Gradients come from central finite differences that never step
//! outside the box, so the objective only needs to be evaluable.
//!
//! Termination mirrors the usual L-BFGS-B rules: converged when the
//! projected gradient's largest component drops below `pgtol` or when the
//! relative objective reduction of an accepted step drops below `ftol`.

use std::collections::VecDeque;

use thiserror::Error;

/// Reasons a minimization run can end without a usable optimum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    /// Mismatched lengths, empty problem, inverted bounds, or a non-finite start.
    #[error("invalid optimizer input: {0}")]
    InvalidInput(String),

    /// The objective or its gradient evaluated to NaN or infinity.
    #[error("objective or gradient became non-finite at iteration {iteration}")]
    NonFinite { iteration: usize },

    /// No step length along a descent direction decreased the objective.
    #[error("line search failed to decrease the objective at iteration {iteration}")]
    LineSearchFailed { iteration: usize },

    /// The iteration cap was reached before a convergence test passed.
    #[error("did not converge in {iterations} iterations")]
    NotConverged { iterations: usize },
}

impl OptimizeError {
    /// True for failures of the iteration itself, false for malformed problems.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(
            self,
            OptimizeError::LineSearchFailed { .. } | OptimizeError::NotConverged { .. }
        )
    }
}

/// Result type for minimization.
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Closed interval one variable is confined to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `[-limit, limit]`.
    pub fn symmetric(limit: f64) -> Self {
        Self::new(-limit, limit)
    }

    fn project(&self, v: f64) -> f64 {
        v.max(self.lower).min(self.upper)
    }
}

/// Tuning knobs for [`minimize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbfgsbOptions {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Number of correction pairs kept for the inverse-Hessian estimate.
    pub memory: usize,
    /// Projected-gradient infinity-norm tolerance.
    pub pgtol: f64,
    /// Relative objective-reduction tolerance.
    pub ftol: f64,
    /// Relative finite-difference step.
    pub fd_step: f64,
    /// Backtracking halvings tried per line search.
    pub max_line_search: usize,
}

impl Default for LbfgsbOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            memory: 10,
            pgtol: 1e-5,
            // factr = 1e7 times machine epsilon
            ftol: 1e7 * f64::EPSILON,
            fd_step: 1e-6,
            max_line_search: 30,
        }
    }
}

/// A converged solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub evaluations: usize,
}

/// Armijo sufficient-decrease constant.
const ARMIJO_C1: f64 = 1e-4;

struct Problem<'a, F> {
    objective: F,
    bounds: &'a [Bound],
    fd_step: f64,
    evaluations: usize,
}

impl<F: FnMut(&[f64]) -> f64> Problem<'_, F> {
    fn value(&mut self, x: &[f64]) -> f64 {
        self.evaluations += 1;
        (self.objective)(x)
    }

    fn gradient(&mut self, x: &[f64]) -> Vec<f64> {
        let mut probe = x.to_vec();
        let mut grad = vec![0.0; x.len()];
        for i in 0..x.len() {
            let h = self.fd_step * x[i].abs().max(1.0);
            let hi = (x[i] + h).min(self.bounds[i].upper);
            let lo = (x[i] - h).max(self.bounds[i].lower);
            if hi <= lo {
                continue;
            }
            probe[i] = hi;
            let f_hi = self.value(&probe);
            probe[i] = lo;
            let f_lo = self.value(&probe);
            probe[i] = x[i];
            grad[i] = (f_hi - f_lo) / (hi - lo);
        }
        grad
    }

    fn project(&self, x: &mut [f64]) {
        for (v, b) in x.iter_mut().zip(self.bounds) {
            *v = b.project(*v);
        }
    }

    /// Largest component of `P(x - g) - x`.
    fn projected_gradient_norm(&self, x: &[f64], g: &[f64]) -> f64 {
        x.iter()
            .zip(g)
            .zip(self.bounds)
            .map(|((&xi, &gi), b)| (b.project(xi - gi) - xi).abs())
            .fold(0.0, f64::max)
    }

    /// Variables free to move along `-g` (not pinned at a bound by it).
    fn free_mask(&self, x: &[f64], g: &[f64]) -> Vec<bool> {
        x.iter()
            .zip(g)
            .zip(self.bounds)
            .map(|((&xi, &gi), b)| !((xi <= b.lower && gi > 0.0) || (xi >= b.upper && gi < 0.0)))
            .collect()
    }
}

struct Correction {
    s: Vec<f64>,
    y: Vec<f64>,
    rho: f64,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn all_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Two-loop recursion: returns `-H·g` for the current inverse-Hessian estimate.
fn search_direction(g: &[f64], history: &VecDeque<Correction>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for c in history.iter().rev() {
        let a = c.rho * dot(&c.s, &q);
        q.iter_mut().zip(&c.y).for_each(|(qi, yi)| *qi -= a * yi);
        alphas.push(a);
    }
    if let Some(last) = history.back() {
        let gamma = dot(&last.s, &last.y) / dot(&last.y, &last.y);
        q.iter_mut().for_each(|qi| *qi *= gamma);
    }
    for (c, a) in history.iter().zip(alphas.iter().rev()) {
        let b = c.rho * dot(&c.y, &q);
        q.iter_mut().zip(&c.s).for_each(|(qi, si)| *qi += si * (a - b));
    }
    q.iter_mut().for_each(|qi| *qi = -*qi);
    q
}

fn validate(x0: &[f64], bounds: &[Bound], options: &LbfgsbOptions) -> Result<()> {
    if x0.is_empty() {
        return Err(OptimizeError::InvalidInput("empty parameter vector".into()));
    }
    if x0.len() != bounds.len() {
        return Err(OptimizeError::InvalidInput(format!(
            "{} parameters but {} bounds",
            x0.len(),
            bounds.len()
        )));
    }
    if !all_finite(x0) {
        return Err(OptimizeError::InvalidInput(
            "initial guess is not finite".into(),
        ));
    }
    if let Some(i) = bounds.iter().position(|b| !(b.lower <= b.upper)) {
        return Err(OptimizeError::InvalidInput(format!(
            "bound {i} is empty or NaN: [{}, {}]",
            bounds[i].lower, bounds[i].upper
        )));
    }
    if options.max_iterations == 0 || options.memory == 0 {
        return Err(OptimizeError::InvalidInput(
            "max_iterations and memory must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Minimizes `objective` over the box `bounds`, starting from `x0`
/// (projected into the box first).
pub fn minimize<F>(
    objective: F,
    x0: &[f64],
    bounds: &[Bound],
    options: &LbfgsbOptions,
) -> Result<Minimum>
where
    F: FnMut(&[f64]) -> f64,
{
    validate(x0, bounds, options)?;

    let mut problem = Problem {
        objective,
        bounds,
        fd_step: options.fd_step,
        evaluations: 0,
    };

    let mut x = x0.to_vec();
    problem.project(&mut x);
    let mut f = problem.value(&x);
    let mut g = problem.gradient(&x);
    if !f.is_finite() || !all_finite(&g) {
        return Err(OptimizeError::NonFinite { iteration: 0 });
    }

    let mut history: VecDeque<Correction> = VecDeque::with_capacity(options.memory);

    for iteration in 1..=options.max_iterations {
        if problem.projected_gradient_norm(&x, &g) <= options.pgtol {
            return Ok(Minimum {
                x,
                value: f,
                iterations: iteration - 1,
                evaluations: problem.evaluations,
            });
        }

        let free = problem.free_mask(&x, &g);
        let mask = |d: &mut [f64]| {
            for (di, &is_free) in d.iter_mut().zip(&free) {
                if !is_free {
                    *di = 0.0;
                }
            }
        };

        let mut direction = search_direction(&g, &history);
        mask(direction.as_mut_slice());
        if !(dot(&direction, &g) < 0.0) {
            history.clear();
            direction = g.iter().map(|gi| -gi).collect();
            mask(direction.as_mut_slice());
        }

        // Without curvature information, take a first step of unit length.
        let mut alpha = if history.is_empty() {
            let largest = direction.iter().fold(0.0_f64, |m, d| m.max(d.abs()));
            (1.0 / largest).min(1.0)
        } else {
            1.0
        };

        let mut accepted = None;
        for _ in 0..options.max_line_search {
            let mut candidate: Vec<f64> = x
                .iter()
                .zip(&direction)
                .map(|(xi, di)| xi + alpha * di)
                .collect();
            problem.project(&mut candidate);
            let step: Vec<f64> = candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
            if step.iter().all(|s| *s == 0.0) {
                break;
            }
            let f_candidate = problem.value(&candidate);
            if f_candidate.is_finite() && f_candidate <= f + ARMIJO_C1 * dot(&g, &step) {
                accepted = Some((candidate, f_candidate, step));
                break;
            }
            alpha *= 0.5;
        }

        let Some((x_new, f_new, s)) = accepted else {
            if history.is_empty() {
                return Err(OptimizeError::LineSearchFailed { iteration });
            }
            // Retry from steepest descent before giving up.
            history.clear();
            continue;
        };

        let g_new = problem.gradient(&x_new);
        if !all_finite(&g_new) {
            return Err(OptimizeError::NonFinite { iteration });
        }

        let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
        let sy = dot(&s, &y);
        if sy > 1e-10 * dot(&y, &y) {
            if history.len() == options.memory {
                history.pop_front();
            }
            history.push_back(Correction { s, y, rho: 1.0 / sy });
        }

        let reduction = (f - f_new) / f.abs().max(f_new.abs()).max(1.0);
        x = x_new;
        f = f_new;
        g = g_new;

        if reduction <= options.ftol {
            return Ok(Minimum {
                x,
                value: f,
                iterations: iteration,
                evaluations: problem.evaluations,
            });
        }
    }

    Err(OptimizeError::NotConverged {
        iterations: options.max_iterations,
    })
}
