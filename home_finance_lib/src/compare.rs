use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};
use crate::projection::{Projection, ProjectionYear};

/// Illustrative income multiple used for the DTI ratio when no real income
/// figure is supplied.
pub const ASSUMED_INCOME_MULTIPLE: i64 = 3;

/// The point where cumulative buying costs first drop below cumulative
/// renting costs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BreakEven {
    /// 1-based year of the crossover.
    pub year: u32,
    /// Month within that year, 0 to 11, interpolated between the two
    /// bracketing year marks.
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Raw cost gap at the horizon: buying total minus renting total.
    pub difference: Money,
    /// Net position gap once both asset tracks are counted.
    pub final_difference: Money,
    pub buying_is_better: bool,
    pub break_even: Option<BreakEven>,
    /// Return on the equity put into the purchase.
    pub roe: Rate,
    /// Payment burden against an assumed income of a fixed multiple of the
    /// payment.
    pub dti: Rate,
}

/// Scan the cumulative series for a strict crossover from buying costing
/// more to buying costing less.
///
/// Year 1 never qualifies: a buy side that is cheaper from the start has
/// no crossover to report. The month is interpolated linearly between the
/// two bracketing deltas; rounding the fraction up to a full 12 months
/// folds into month 0 of the following year.
pub fn break_even(years: &[ProjectionYear]) -> Option<BreakEven> {
    for pair in years.windows(2) {
        let before = pair[0].cumulative_buy_cost - pair[0].cumulative_rent_cost;
        let after = pair[1].cumulative_buy_cost - pair[1].cumulative_rent_cost;
        if before.is_positive() && !after.is_positive() {
            let span = (before - after).to_float();
            let fraction = if span > 0.0 {
                before.to_float() / span
            } else {
                0.0
            };
            let month = (fraction * 12.0).round() as u32;
            return Some(if month >= 12 {
                BreakEven {
                    year: pair[1].year + 1,
                    month: 0,
                }
            } else {
                BreakEven {
                    year: pair[1].year,
                    month,
                }
            });
        }
    }
    None
}

/// Return on equity: what the property is worth beyond everything spent on
/// it, relative to the down payment.
pub fn return_on_equity(
    property_value: Money,
    buying_total: Money,
    down_payment: Money,
) -> Result<Rate> {
    if !down_payment.is_positive() {
        return Err(anyhow!("Down payment must be positive to compute ROE"));
    }
    Ok((property_value - buying_total) / down_payment)
}

/// Debt-to-income against the assumed income multiple. Always the same
/// ratio by construction, surfaced for presentation alongside real ratios.
pub fn debt_to_income(monthly_payment: Money) -> Rate {
    if !monthly_payment.is_positive() {
        return Rate::zero();
    }
    let assumed_income = Money::from_cents(monthly_payment.as_cents() * ASSUMED_INCOME_MULTIPLE);
    monthly_payment / assumed_income
}

/// Summarize a finished projection: cost gaps, crossover point and the
/// derived ratios.
pub fn compare(projection: &Projection) -> Result<Comparison> {
    let buying = &projection.buying;
    let renting = &projection.renting;
    let final_difference = (buying.property_value - buying.buying_total)
        - (renting.investment_value - renting.renting_total);
    Ok(Comparison {
        difference: buying.buying_total - renting.renting_total,
        final_difference,
        buying_is_better: final_difference.is_positive(),
        break_even: break_even(&projection.years),
        roe: return_on_equity(buying.property_value, buying.buying_total, buying.down_payment)?,
        dti: debt_to_income(buying.monthly_payment),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    fn year(n: u32, buy: i64, rent: i64) -> ProjectionYear {
        ProjectionYear {
            year: n,
            cumulative_buy_cost: Money::from_major(buy),
            cumulative_rent_cost: Money::from_major(rent),
            property_value: Money::zero(),
            investment_value: Money::zero(),
        }
    }

    #[test]
    fn test_break_even_found_at_sign_change() -> Result<()> {
        let series = vec![
            year(1, 130000, 40000),
            year(2, 150000, 80000),
            year(3, 170000, 120000),
            year(4, 190000, 170000),
            year(5, 210000, 230000),
        ];
        let be = break_even(&series).unwrap();
        assert_eq!(be.year, 5);
        // Delta goes +20000 -> -20000, so the crossover is mid-year.
        assert_eq!(be.month, 6);
        Ok(())
    }

    #[test]
    fn test_break_even_never_reports_year_one() -> Result<()> {
        // Buying cheaper from the very first year: no crossover exists.
        let series = vec![
            year(1, 40000, 50000),
            year(2, 80000, 100000),
            year(3, 120000, 150000),
        ];
        assert_eq!(break_even(&series), None);
        Ok(())
    }

    #[test]
    fn test_break_even_not_reached() -> Result<()> {
        let series = vec![year(1, 100000, 40000), year(2, 200000, 80000)];
        assert_eq!(break_even(&series), None);
        assert_eq!(break_even(&[]), None);
        Ok(())
    }

    #[test]
    fn test_break_even_month_folds_to_next_year() -> Result<()> {
        // Delta goes +1000 -> -1, crossing just before the year 3 mark:
        // the fraction rounds to 12 months, which folds to year 4 month 0.
        let series = vec![
            year(1, 100000, 50000),
            year(2, 101000, 100000),
            year(3, 102000, 102001),
            year(4, 103000, 160000),
        ];
        let be = break_even(&series).unwrap();
        assert_eq!((be.year, be.month), (4, 0));
        Ok(())
    }

    #[test]
    fn test_break_even_first_crossover_wins() -> Result<()> {
        // A later re-crossing must not move the reported point.
        let series = vec![
            year(1, 100000, 50000),
            year(2, 110000, 115000),
            year(3, 130000, 120000),
            year(4, 140000, 150000),
        ];
        let be = break_even(&series).unwrap();
        assert_eq!(be.year, 2);
        Ok(())
    }

    #[test]
    fn test_return_on_equity() -> Result<()> {
        let roe = return_on_equity(
            Money::from_major(800000),
            Money::from_major(700000),
            Money::from_major(100000),
        )?;
        assert_eq!(roe, Rate::from_percent(100));

        let negative = return_on_equity(
            Money::from_major(500000),
            Money::from_major(700000),
            Money::from_major(100000),
        )?;
        assert_eq!(negative, Rate::from_percent(-200));

        assert!(return_on_equity(
            Money::from_major(800000),
            Money::from_major(700000),
            Money::zero()
        )
        .is_err());
        Ok(())
    }

    #[test]
    fn test_debt_to_income() -> Result<()> {
        let dti = debt_to_income(Money::from_major(3000));
        // One third of the assumed income, whatever the payment.
        assert_eq!(dti, Money::from_major(1) / Money::from_major(3));
        assert_eq!(debt_to_income(Money::zero()), Rate::zero());
        Ok(())
    }

    #[test]
    fn test_compare_end_to_end() -> Result<()> {
        use crate::projection::{
            run_projection, AnalysisOptions, DownPayment, PropertyInputs, RentInputs,
        };

        let projection = run_projection(
            &PropertyInputs {
                property_price: Money::from_major(500000),
                down_payment: DownPayment::Percent(Rate::from_percent(20)),
                base_rate: Rate::from_float(5.6),
                bank_margin: Rate::from_float(2.0),
                loan_term_years: 25,
                transaction_costs: Money::from_major(20000),
                property_tax: Money::from_major(500),
                insurance: Money::from_major(400),
                maintenance: Money::from_major(2000),
                community_fee: Money::from_major(4800),
                appreciation: Rate::from_float(4.0),
            },
            &RentInputs {
                monthly_rent: Money::from_major(2500),
                rent_increase: Rate::from_float(3.0),
                security_deposit: Money::from_major(5000),
                renter_insurance: Money::from_major(200),
                rent_maintenance: Money::from_major(500),
                investment_return: Rate::from_float(6.0),
            },
            &AnalysisOptions {
                analysis_years: 30,
                inflation: Rate::from_float(2.5),
            },
        )?;
        let comparison = compare(&projection)?;

        assert_eq!(
            comparison.final_difference,
            (projection.buying.property_value - projection.buying.buying_total)
                - (projection.renting.investment_value - projection.renting.renting_total)
        );
        assert_eq!(
            comparison.buying_is_better,
            comparison.final_difference.is_positive()
        );
        if let Some(be) = comparison.break_even {
            assert!(be.year >= 2);
            assert!(be.month <= 11);
        }
        Ok(())
    }
}
