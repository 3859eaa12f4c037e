//! Comparators over bit vectors of BDDs.
//!
//! A vector `x` of length `n` encodes the unsigned integer whose most
//! significant bit is `x[0]`. Vectors are arbitrary functions, not just
//! projection variables, so `x` may itself be computed.

use std::collections::HashMap;

use log::debug;

use crate::error::{DdError, DdResult};
use crate::handle::Bdd;
use crate::manager::Manager;

/// Widest vector accepted by the integer comparators.
pub const MAX_WIDTH: usize = 62;

/// `ceil(t / 2)` for any sign of `t`.
fn half_up(t: i64) -> i64 {
    (t + 1).div_euclid(2)
}

impl Manager {
    fn check_vectors(&self, x: &[Bdd], y: &[Bdd]) -> DdResult<()> {
        if x.len() != y.len() {
            return Err(DdError::invalid(format!(
                "bit vectors differ in width: {} and {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() > MAX_WIDTH {
            return Err(DdError::invalid(format!("bit vectors wider than {} bits", MAX_WIDTH)));
        }
        for f in x.iter().chain(y) {
            self.check(f)?;
        }
        Ok(())
    }

    /// `x = y`, bit by bit.
    pub fn xeqy(&self, x: &[Bdd], y: &[Bdd]) -> DdResult<Bdd> {
        self.check_vectors(x, y)?;
        let mut acc = self.one();
        for (a, b) in x.iter().zip(y).rev() {
            acc = self.and(&acc, &self.xnor(a, b)?)?;
        }
        Ok(acc)
    }

    /// `x > y` as unsigned integers.
    pub fn xgty(&self, x: &[Bdd], y: &[Bdd]) -> DdResult<Bdd> {
        self.check_vectors(x, y)?;
        // From the least significant bit up: a higher bit decides unless equal.
        let mut gt = self.zero();
        for (a, b) in x.iter().zip(y).rev() {
            let bit_gt = self.and(a, &!b)?;
            let bit_eq = self.xnor(a, b)?;
            gt = self.or(&bit_gt, &self.and(&bit_eq, &gt)?)?;
        }
        Ok(gt)
    }

    /// `x - y ≥ c`, with `x` and `y` unsigned.
    ///
    /// ```
    /// use dd_rs::manager::Manager;
    ///
    /// let mgr = Manager::new(4, 0, None);
    /// let x = vec![mgr.var(0).unwrap(), mgr.var(1).unwrap()];
    /// let y = vec![mgr.var(2).unwrap(), mgr.var(3).unwrap()];
    /// let f = mgr.inequality(2, &x, &y).unwrap();
    /// // x = 3, y = 1
    /// assert!(mgr.eval(&f, &[true, true, false, true]).unwrap());
    /// // x = 2, y = 1
    /// assert!(!mgr.eval(&f, &[true, false, false, true]).unwrap());
    /// ```
    pub fn inequality(&self, c: i64, x: &[Bdd], y: &[Bdd]) -> DdResult<Bdd> {
        self.check_vectors(x, y)?;
        debug!("inequality(c = {}, width = {})", c, x.len());
        let mut memo = HashMap::new();
        self.inequality_rec(x, y, 0, c, &mut memo)
    }

    /// Whether the bits from the `j`-th least significant one upwards satisfy
    /// `x' - y' ≥ t`.
    fn inequality_rec(
        &self,
        x: &[Bdd],
        y: &[Bdd],
        j: usize,
        t: i64,
        memo: &mut HashMap<(usize, i64), Bdd>,
    ) -> DdResult<Bdd> {
        let n = x.len();
        let span = (1i64 << (n - j)) - 1;
        if t <= -span {
            return Ok(self.one());
        }
        if t > span {
            return Ok(self.zero());
        }
        if let Some(res) = memo.get(&(j, t)) {
            return Ok(res.clone());
        }

        let (a, b) = (&x[n - 1 - j], &y[n - 1 - j]);
        let up = self.inequality_rec(x, y, j + 1, half_up(t - 1), memo)?;
        let down = self.inequality_rec(x, y, j + 1, half_up(t + 1), memo)?;
        let same = self.inequality_rec(x, y, j + 1, half_up(t), memo)?;
        let res = self.ite(&self.and(a, &!b)?, &up, &self.ite(&self.and(&!a, b)?, &down, &same)?)?;

        memo.insert((j, t), res.clone());
        Ok(res)
    }

    /// `x - y ≠ c`, with `x` and `y` unsigned.
    pub fn disequality(&self, c: i64, x: &[Bdd], y: &[Bdd]) -> DdResult<Bdd> {
        let at_least = self.inequality(c, x, y)?;
        let above = self.inequality(c.saturating_add(1), x, y)?;
        self.not(&self.and(&at_least, &!&above)?)
    }

    /// `lower ≤ x ≤ upper`, with `x` unsigned. Empty when `lower > upper`.
    pub fn interval(&self, x: &[Bdd], lower: u64, upper: u64) -> DdResult<Bdd> {
        let zeros = vec![self.zero(); x.len()];
        self.check_vectors(x, &zeros)?;
        if lower > upper {
            return Ok(self.zero());
        }
        let bound = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
        let at_least = self.inequality(bound(lower), x, &zeros)?;
        let above = self.inequality(bound(upper.saturating_add(1)), x, &zeros)?;
        self.and(&at_least, &!&above)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    const W: usize = 3;

    /// Two 3-bit vectors over variables 0..3 and 3..6.
    fn setup() -> (Manager, Vec<Bdd>, Vec<Bdd>) {
        let mgr = Manager::new(2 * W, 0, None);
        let x = (0..W as u32).map(|i| mgr.var(i).unwrap()).collect();
        let y = (W as u32..2 * W as u32).map(|i| mgr.var(i).unwrap()).collect();
        (mgr, x, y)
    }

    /// Assignment giving `x = a` and `y = b`, most significant bit first.
    fn encode(a: u64, b: u64) -> Vec<bool> {
        let bits = |v: u64| (0..W).map(move |i| v >> (W - 1 - i) & 1 == 1);
        bits(a).chain(bits(b)).collect()
    }

    fn check_all(mgr: &Manager, f: &Bdd, expected: impl Fn(i64, i64) -> bool) {
        for a in 0..1u64 << W {
            for b in 0..1u64 << W {
                let got = mgr.eval(f, &encode(a, b)).unwrap();
                assert_eq!(got, expected(a as i64, b as i64), "x = {}, y = {}", a, b);
            }
        }
    }

    #[test]
    fn test_xeqy_and_xgty() {
        let (mgr, x, y) = setup();
        check_all(&mgr, &mgr.xeqy(&x, &y).unwrap(), |a, b| a == b);
        check_all(&mgr, &mgr.xgty(&x, &y).unwrap(), |a, b| a > b);
        assert_eq!(mgr.xeqy(&x, &x).unwrap(), mgr.one());
        assert_eq!(mgr.xgty(&x, &x).unwrap(), mgr.zero());
    }

    #[test]
    fn test_inequality() {
        let (mgr, x, y) = setup();
        for c in -9..=9 {
            let f = mgr.inequality(c, &x, &y).unwrap();
            check_all(&mgr, &f, |a, b| a - b >= c);
        }
        assert_eq!(mgr.inequality(1, &x, &y).unwrap(), mgr.xgty(&x, &y).unwrap());
        assert_eq!(mgr.inequality(i64::MIN, &x, &y).unwrap(), mgr.one());
        assert_eq!(mgr.inequality(i64::MAX, &x, &y).unwrap(), mgr.zero());
    }

    #[test]
    fn test_disequality() {
        let (mgr, x, y) = setup();
        for c in [-8, -2, 0, 1, 7, i64::MAX] {
            let f = mgr.disequality(c, &x, &y).unwrap();
            check_all(&mgr, &f, |a, b| a - b != c);
        }
        assert_eq!(mgr.disequality(0, &x, &y).unwrap(), !&mgr.xeqy(&x, &y).unwrap());
    }

    #[test]
    fn test_interval() {
        let (mgr, x, _) = setup();
        for lo in 0..8 {
            for hi in 0..8 {
                let f = mgr.interval(&x, lo, hi).unwrap();
                check_all(&mgr, &f, |a, _| lo as i64 <= a && a <= hi as i64);
            }
        }
        assert_eq!(mgr.interval(&x, 0, u64::MAX).unwrap(), mgr.one());
        assert_eq!(mgr.interval(&x, 8, u64::MAX).unwrap(), mgr.zero());
    }

    #[test]
    fn test_vectors_must_match() {
        let (mgr, x, y) = setup();
        assert!(matches!(mgr.xeqy(&x, &y[..2]), Err(DdError::InvalidArgument(_))));
        assert!(matches!(mgr.inequality(0, &x[..1], &y), Err(DdError::InvalidArgument(_))));
        let wide = vec![mgr.one(); MAX_WIDTH + 1];
        assert!(matches!(mgr.interval(&wide, 0, 1), Err(DdError::InvalidArgument(_))));

        let other = Manager::new(W, 0, None);
        let z: Vec<Bdd> = (0..W as u32).map(|i| other.var(i).unwrap()).collect();
        assert!(matches!(mgr.xgty(&x, &z), Err(DdError::CrossManager)));
    }
}
