use log::debug;

use crate::defaults::DEFAULT_BICGSTAB_TOL;
use crate::error::{LinOpError, Result};
use crate::types::{Float, RVector, RVectorView};

fn norm(v: &RVector) -> Float {
    v.dot(v).sqrt()
}

/// Solves `A x = b` with the stabilized biconjugate gradient method, where
/// `A` is only reachable through `linop`.
pub fn bicgstab(
    linop: impl Fn(RVectorView) -> Result<RVector>,
    b: RVectorView,
    x0: Option<RVectorView>,
    tol: Option<Float>,
    maxiter: Option<usize>,
) -> Result<RVector> {
    let mut x_i: RVector = match x0 {
        Some(x0) => x0.to_owned(),
        None => RVector::zeros(b.len()),
    };
    let tol: Float = tol.unwrap_or(DEFAULT_BICGSTAB_TOL);
    let maxiter: usize = maxiter.unwrap_or(20 * b.len());

    let r0: RVector = &b - &linop(x_i.view())?;
    if norm(&r0) < tol {
        debug!("Initial guess already converged.");
        return Ok(x_i);
    }
    let r0_hat: RVector = r0.clone();
    let mut rho_i: Float = r0.dot(&r0_hat);
    let mut r_i: RVector = r0.clone();
    let mut p_i: RVector = r0;

    for iter in 0..maxiter {
        let nu: RVector = linop(p_i.view())?;
        let alpha: Float = rho_i / r0_hat.dot(&nu);
        let h: RVector = &x_i + &(alpha * &p_i);
        let s: RVector = &r_i - &(alpha * &nu);
        debug!("Iteration: {}, s_residual: {}", iter, norm(&s));
        if norm(&s) < tol {
            debug!("Converged in {} iterations.", iter);
            return Ok(h);
        }
        let t: RVector = linop(s.view())?;
        let omega: Float = t.dot(&s) / t.dot(&t);
        x_i = &h + &(omega * &s);
        r_i = &s - &(omega * &t);
        if norm(&r_i) < tol {
            debug!("Converged in {} iterations.", iter);
            return Ok(x_i);
        }
        let rho_ip: Float = r0_hat.dot(&r_i);
        let beta: Float = (rho_ip / rho_i) * (alpha / omega);
        rho_i = rho_ip;
        p_i = &r_i + &((&p_i - &(omega * &nu)) * beta);
    }
    Err(LinOpError::NotConverged {
        iterations: maxiter,
    })
}
