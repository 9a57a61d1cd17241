use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};

// Newton-Raphson parameters for the IRR search.
const IRR_INITIAL_GUESS: f64 = 0.1;
const IRR_MAX_ITERATIONS: u32 = 1000;
const IRR_PRECISION: f64 = 1e-6;

/// Total return over the whole horizon as a percentage of the initial
/// outlay.
pub fn roi(investment: Money, cash_flows: &[Money]) -> Result<Rate> {
    if !investment.is_positive() {
        return Err(anyhow!("ROI needs a positive initial investment"));
    }
    let total: Money = cash_flows.iter().copied().sum();
    Ok((total - investment) / investment)
}

/// Net present value of the cash flows at an annual discount rate, with the
/// initial investment paid at time zero.
pub fn npv(investment: Money, cash_flows: &[Money], discount_rate: Rate) -> Result<Money> {
    if !investment.is_positive() {
        return Err(anyhow!("NPV needs a positive initial investment"));
    }
    if cash_flows.is_empty() {
        return Err(anyhow!("NPV needs at least one cash flow"));
    }
    if discount_rate.is_negative() {
        return Err(anyhow!("Discount rate may not be negative"));
    }
    let rate = discount_rate.to_float();
    let discounted: f64 = cash_flows
        .iter()
        .enumerate()
        .map(|(i, flow)| flow.to_float() / (1.0 + rate).powi(i as i32 + 1))
        .sum();
    Ok(Money::from_float(discounted - investment.to_float()))
}

/// NPV under pessimistic (80%), neutral and optimistic (120%) scalings of
/// the projected cash flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvScenarios {
    pub pessimistic: Money,
    pub neutral: Money,
    pub optimistic: Money,
}

pub fn npv_scenarios(
    investment: Money,
    cash_flows: &[Money],
    discount_rate: Rate,
) -> Result<NpvScenarios> {
    let scaled = |factor: f64| -> Vec<Money> {
        cash_flows
            .iter()
            .map(|flow| Money::from_float(flow.to_float() * factor))
            .collect()
    };
    Ok(NpvScenarios {
        pessimistic: npv(investment, &scaled(0.8), discount_rate)?,
        neutral: npv(investment, cash_flows, discount_rate)?,
        optimistic: npv(investment, &scaled(1.2), discount_rate)?,
    })
}

/// Internal rate of return found by Newton-Raphson.
///
/// Returns `None` when the iteration does not converge or the derivative
/// collapses, rather than reporting a garbage rate.
pub fn irr(investment: Money, cash_flows: &[Money]) -> Option<Rate> {
    if cash_flows.is_empty() || !investment.is_positive() {
        return None;
    }
    let outlay = investment.to_float();
    let flows: Vec<f64> = cash_flows.iter().map(|f| f.to_float()).collect();

    let mut rate = IRR_INITIAL_GUESS;
    for _ in 0..IRR_MAX_ITERATIONS {
        let mut value = -outlay;
        let mut derivative = 0.0;
        for (i, flow) in flows.iter().enumerate() {
            let period = i as f64 + 1.0;
            let factor = (1.0 + rate).powf(period);
            value += flow / factor;
            derivative -= period * flow / (factor * (1.0 + rate));
        }
        if value.abs() < IRR_PRECISION {
            return Some(Rate::from_float(rate * 100.0));
        }
        if derivative.abs() < IRR_PRECISION {
            return None;
        }
        let next = rate - value / derivative;
        if !next.is_finite() || next <= -1.0 {
            return None;
        }
        rate = next;
    }
    None
}

/// Running totals of the cash flows, one entry per period.
pub fn cumulative_cash_flows(cash_flows: &[Money]) -> Vec<Money> {
    let mut total = Money::zero();
    cash_flows
        .iter()
        .map(|flow| {
            total = total + *flow;
            total
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    fn major(values: &[i64]) -> Vec<Money> {
        values.iter().map(|v| Money::from_major(*v)).collect()
    }

    #[test]
    fn test_roi() -> Result<()> {
        let r = roi(Money::from_major(1000), &major(&[300, 400, 500]))?;
        assert_eq!(r, Rate::from_percent(20));

        let negative = roi(Money::from_major(1000), &major(&[300, 400]))?;
        assert_eq!(negative, Rate::from_percent(-30));

        assert!(roi(Money::zero(), &major(&[100])).is_err());
        Ok(())
    }

    #[test]
    fn test_npv() -> Result<()> {
        let value = npv(
            Money::from_major(1000),
            &major(&[400, 400, 400]),
            Rate::from_percent(10),
        )?;
        // 400/1.1 + 400/1.21 + 400/1.331 - 1000
        let diff = (value - Money::from_float(-5.26)).as_cents().abs();
        assert!(diff <= 1, "got {}", value);

        // Zero discount rate degenerates to the plain sum.
        let value = npv(
            Money::from_major(1000),
            &major(&[400, 400, 400]),
            Rate::zero(),
        )?;
        assert_eq!(value, Money::from_major(200));

        Ok(())
    }

    #[test]
    fn test_npv_guards() -> Result<()> {
        let flows = major(&[400, 400, 400]);
        // Non-positive investment.
        assert!(npv(Money::zero(), &flows, Rate::from_percent(10)).is_err());
        assert!(npv(Money::from_major(-1000), &flows, Rate::from_percent(10)).is_err());
        // Empty cash flows.
        assert!(npv(Money::from_major(1000), &[], Rate::from_percent(10)).is_err());
        // Negative discount rate.
        assert!(npv(Money::from_major(1000), &major(&[400]), Rate::from_float(-5.0)).is_err());
        Ok(())
    }

    #[test]
    fn test_npv_scenarios_ordering() -> Result<()> {
        let s = npv_scenarios(
            Money::from_major(1000),
            &major(&[400, 400, 400]),
            Rate::from_percent(10),
        )?;
        assert!(s.pessimistic < s.neutral);
        assert!(s.neutral < s.optimistic);
        Ok(())
    }

    #[test]
    fn test_irr_converges() -> Result<()> {
        // A flow whose IRR is exactly 10%: 1000 out, 1100 back in a year.
        let r = irr(Money::from_major(1000), &major(&[1100])).unwrap();
        assert!((r.as_percent_float() - 10.0).abs() < 0.01, "got {}", r);

        // Multi-period case cross-checked against the NPV root.
        let flows = major(&[300, 400, 500]);
        let r = irr(Money::from_major(1000), &flows).unwrap();
        let at_root = npv(Money::from_major(1000), &flows, r)?;
        assert!(at_root.as_cents().abs() <= 1, "got {}", at_root);
        Ok(())
    }

    #[test]
    fn test_irr_failure_modes() -> Result<()> {
        assert_eq!(irr(Money::from_major(1000), &[]), None);
        assert_eq!(irr(Money::zero(), &major(&[100])), None);
        // All-zero flows leave the derivative flat.
        assert_eq!(irr(Money::from_major(1000), &major(&[0, 0, 0])), None);
        Ok(())
    }

    #[test]
    fn test_cumulative_cash_flows() -> Result<()> {
        assert_eq!(
            cumulative_cash_flows(&major(&[100, -50, 25])),
            major(&[100, 50, 75])
        );
        assert_eq!(cumulative_cash_flows(&[]), vec![]);
        Ok(())
    }
}
