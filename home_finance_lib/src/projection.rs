use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::loan::{calculate_installment, InstallmentType, LoanTerms};
use crate::money::{Money, Rate};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "value")]
pub enum DownPayment {
    Amount(Money),
    Percent(Rate),
}

impl DownPayment {
    /// The concrete amount put down, whichever way it was entered.
    pub fn resolve(&self, property_price: Money) -> Money {
        match self {
            Self::Amount(amount) => *amount,
            Self::Percent(rate) => property_price.at_rate(*rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInputs {
    pub property_price: Money,
    pub down_payment: DownPayment,
    pub base_rate: Rate,
    pub bank_margin: Rate,
    pub loan_term_years: u32,
    /// One-off closing costs (tax, notary, commissions).
    pub transaction_costs: Money,
    // Recurring yearly owner costs, all at today's prices.
    pub property_tax: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub community_fee: Money,
    /// Real (inflation-adjusted) yearly appreciation of the property.
    pub appreciation: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentInputs {
    pub monthly_rent: Money,
    /// Yearly rent growth, independent of general inflation.
    pub rent_increase: Rate,
    pub security_deposit: Money,
    // Recurring yearly renter costs, at today's prices.
    pub renter_insurance: Money,
    pub rent_maintenance: Money,
    /// Return on investing the down payment instead of spending it.
    pub investment_return: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub analysis_years: u32,
    pub inflation: Rate,
}

/// One year of the buy-vs-rent simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    /// 1-based year number.
    pub year: u32,
    pub cumulative_buy_cost: Money,
    pub cumulative_rent_cost: Money,
    pub property_value: Money,
    pub investment_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyingSummary {
    pub monthly_payment: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub total_mortgage_payments: Money,
    pub total_other_costs: Money,
    pub buying_total: Money,
    pub property_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentingSummary {
    pub monthly_rent: Money,
    pub total_rent: Money,
    pub total_renter_insurance: Money,
    pub total_rent_maintenance: Money,
    pub renting_total: Money,
    pub investment_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub years: Vec<ProjectionYear>,
    pub buying: BuyingSummary,
    pub renting: RentingSummary,
}

/// Simulate both strategies year by year over the analysis horizon.
///
/// Recurring costs on both sides inflate with general inflation, rent
/// compounds at its own growth rate, and the two asset tracks (the
/// property, and the down payment invested instead) compound at their
/// rates net of inflation. Cumulative cost series start seeded with the
/// upfront outlays: transaction costs plus down payment on the buy side,
/// the security deposit on the rent side.
pub fn run_projection(
    property: &PropertyInputs,
    rent: &RentInputs,
    options: &AnalysisOptions,
) -> Result<Projection> {
    if !property.property_price.is_positive() {
        return Err(anyhow!("Property price must be positive"));
    }
    let down_payment = property.down_payment.resolve(property.property_price);
    if !down_payment.is_positive() {
        return Err(anyhow!("Down payment must be positive"));
    }
    if down_payment >= property.property_price {
        return Err(anyhow!("Down payment may not exceed the property price"));
    }
    if property.loan_term_years == 0 {
        return Err(anyhow!("Loan term must be at least one year"));
    }
    if !rent.monthly_rent.is_positive() {
        return Err(anyhow!("Monthly rent must be positive"));
    }
    if options.analysis_years == 0 {
        return Err(anyhow!("Analysis horizon must be at least one year"));
    }

    let loan_amount = property.property_price - down_payment;
    let terms = LoanTerms {
        principal: loan_amount,
        annual_rate: property.base_rate + property.bank_margin,
        term_months: property.loan_term_years * 12,
        installment_type: InstallmentType::Equal,
    };
    let monthly_payment = calculate_installment(&terms)?;

    let inflation = options.inflation.to_float();
    let real_appreciation = (property.appreciation - options.inflation).to_float();
    let real_investment_return = (rent.investment_return - options.inflation).to_float();
    let rent_growth = rent.rent_increase.to_float();

    let mut buying_total = property.transaction_costs + down_payment;
    let mut renting_total = rent.security_deposit;
    let mut property_value = property.property_price.to_float();
    let mut investment_value = down_payment.to_float();
    let mut current_rent = rent.monthly_rent.to_float();

    let mut total_mortgage_payments = Money::zero();
    let mut total_other_costs = Money::zero();
    let mut total_rent = Money::zero();
    let mut total_renter_insurance = Money::zero();
    let mut total_rent_maintenance = Money::zero();

    let mut years = Vec::with_capacity(options.analysis_years as usize);
    for year in 1..=options.analysis_years {
        let inflation_factor = (1.0 + inflation).powi(year as i32 - 1);
        let inflate = |amount: Money| Money::from_float(amount.to_float() * inflation_factor);

        // Mortgage payments stop once the loan term is exhausted.
        let yearly_mortgage = if year <= property.loan_term_years {
            Money::from_float(monthly_payment.to_float() * 12.0)
        } else {
            Money::zero()
        };
        let yearly_owner_costs = inflate(property.property_tax)
            + inflate(property.insurance)
            + inflate(property.maintenance)
            + inflate(property.community_fee);

        buying_total = buying_total + yearly_mortgage + yearly_owner_costs;
        total_mortgage_payments = total_mortgage_payments + yearly_mortgage;
        total_other_costs = total_other_costs + yearly_owner_costs;
        property_value *= 1.0 + real_appreciation;

        let yearly_rent = Money::from_float(current_rent * 12.0);
        let renter_insurance = inflate(rent.renter_insurance);
        let rent_maintenance = inflate(rent.rent_maintenance);

        renting_total = renting_total + yearly_rent + renter_insurance + rent_maintenance;
        total_rent = total_rent + yearly_rent;
        total_renter_insurance = total_renter_insurance + renter_insurance;
        total_rent_maintenance = total_rent_maintenance + rent_maintenance;
        current_rent *= 1.0 + rent_growth;
        investment_value *= 1.0 + real_investment_return;

        years.push(ProjectionYear {
            year,
            cumulative_buy_cost: buying_total,
            cumulative_rent_cost: renting_total,
            property_value: Money::from_float(property_value),
            investment_value: Money::from_float(investment_value),
        });
    }

    Ok(Projection {
        years,
        buying: BuyingSummary {
            monthly_payment,
            down_payment,
            loan_amount,
            total_mortgage_payments,
            total_other_costs,
            buying_total,
            property_value: Money::from_float(property_value),
        },
        renting: RentingSummary {
            monthly_rent: rent.monthly_rent,
            total_rent,
            total_renter_insurance,
            total_rent_maintenance,
            renting_total,
            investment_value: Money::from_float(investment_value),
        },
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;

    fn property() -> PropertyInputs {
        PropertyInputs {
            property_price: Money::from_major(500000),
            down_payment: DownPayment::Amount(Money::from_major(100000)),
            base_rate: Rate::from_float(5.6),
            bank_margin: Rate::from_float(2.0),
            loan_term_years: 25,
            transaction_costs: Money::from_major(20000),
            property_tax: Money::from_major(500),
            insurance: Money::from_major(400),
            maintenance: Money::from_major(2000),
            community_fee: Money::from_major(4800),
            appreciation: Rate::from_float(4.0),
        }
    }

    fn rent() -> RentInputs {
        RentInputs {
            monthly_rent: Money::from_major(2500),
            rent_increase: Rate::from_float(3.0),
            security_deposit: Money::from_major(5000),
            renter_insurance: Money::from_major(200),
            rent_maintenance: Money::from_major(500),
            investment_return: Rate::from_float(6.0),
        }
    }

    fn options() -> AnalysisOptions {
        AnalysisOptions {
            analysis_years: 30,
            inflation: Rate::from_float(2.5),
        }
    }

    #[test]
    fn test_down_payment_modes_agree() -> Result<()> {
        let price = Money::from_major(500000);
        let amount = DownPayment::Amount(Money::from_major(100000));
        let percent = DownPayment::Percent(Rate::from_percent(20));
        assert_eq!(amount.resolve(price), Money::from_major(100000));
        assert_eq!(percent.resolve(price), Money::from_major(100000));

        let by_amount = run_projection(&property(), &rent(), &options())?;
        let by_percent = run_projection(
            &PropertyInputs {
                down_payment: percent,
                ..property()
            },
            &rent(),
            &options(),
        )?;
        assert_eq!(by_amount.buying.loan_amount, Money::from_major(400000));
        assert_eq!(by_amount.buying, by_percent.buying);
        Ok(())
    }

    #[test]
    fn test_series_shape() -> Result<()> {
        let p = run_projection(&property(), &rent(), &options())?;
        assert_eq!(p.years.len(), 30);
        assert_eq!(p.years[0].year, 1);
        assert_eq!(p.years[29].year, 30);

        // Cumulative costs never decrease.
        for pair in p.years.windows(2) {
            assert!(pair[1].cumulative_buy_cost >= pair[0].cumulative_buy_cost);
            assert!(pair[1].cumulative_rent_cost >= pair[0].cumulative_rent_cost);
        }

        // The first year is seeded with the upfront outlays.
        let upfront = property().transaction_costs + Money::from_major(100000);
        assert!(p.years[0].cumulative_buy_cost > upfront);
        assert!(p.years[0].cumulative_rent_cost > rent().security_deposit);

        // Summaries agree with the last series entry.
        assert_eq!(p.buying.buying_total, p.years[29].cumulative_buy_cost);
        assert_eq!(p.renting.renting_total, p.years[29].cumulative_rent_cost);
        assert_eq!(p.buying.property_value, p.years[29].property_value);
        assert_eq!(p.renting.investment_value, p.years[29].investment_value);
        Ok(())
    }

    #[test]
    fn test_mortgage_stops_after_loan_term() -> Result<()> {
        let p = run_projection(
            &PropertyInputs {
                loan_term_years: 10,
                ..property()
            },
            &rent(),
            &options(),
        )?;
        // After year 10 only the recurring owner costs accrue.
        let year10 = &p.years[9];
        let year11 = &p.years[10];
        let growth = year11.cumulative_buy_cost - year10.cumulative_buy_cost;
        let payment_year = Money::from_float(p.buying.monthly_payment.to_float() * 12.0);
        assert!(growth < payment_year);
        assert_eq!(
            p.buying.total_mortgage_payments,
            Money::from_float(p.buying.monthly_payment.to_float() * 120.0)
        );
        Ok(())
    }

    #[test]
    fn test_real_rate_convention() -> Result<()> {
        // Appreciation equal to inflation leaves the real property value
        // flat.
        let p = run_projection(
            &PropertyInputs {
                appreciation: Rate::from_float(2.5),
                ..property()
            },
            &rent(),
            &options(),
        )?;
        assert_eq!(p.buying.property_value, Money::from_major(500000));

        // Investment return below inflation erodes the invested deposit.
        let p = run_projection(
            &property(),
            &RentInputs {
                investment_return: Rate::from_float(1.0),
                ..rent()
            },
            &options(),
        )?;
        assert!(p.renting.investment_value < Money::from_major(100000));
        Ok(())
    }

    #[test]
    fn test_rent_grows_independently_of_inflation() -> Result<()> {
        let no_inflation = AnalysisOptions {
            inflation: Rate::zero(),
            analysis_years: 2,
        };
        let p = run_projection(&property(), &rent(), &no_inflation)?;
        // Year 1 rent is 2500 a month, year 2 is 3% higher.
        let year1_rent = Money::from_major(30000);
        let year2_rent = Money::from_major(30900);
        assert_eq!(p.renting.total_rent, year1_rent + year2_rent);
        Ok(())
    }

    #[test]
    fn test_input_guards() -> Result<()> {
        assert!(run_projection(
            &PropertyInputs {
                down_payment: DownPayment::Amount(Money::from_major(500000)),
                ..property()
            },
            &rent(),
            &options(),
        )
        .is_err());
        assert!(run_projection(
            &PropertyInputs {
                down_payment: DownPayment::Amount(Money::zero()),
                ..property()
            },
            &rent(),
            &options(),
        )
        .is_err());
        assert!(run_projection(
            &property(),
            &rent(),
            &AnalysisOptions {
                analysis_years: 0,
                ..options()
            },
        )
        .is_err());
        Ok(())
    }
}
