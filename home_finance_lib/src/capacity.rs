use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::loan::{max_principal_for_installment, InstallmentType, MAX_TERM_MONTHS};
use crate::money::{Money, Rate};

/// Regulatory stress buffer added to the nominal rate, in percentage
/// points.
pub const STRESS_BUFFER_PCT: f64 = 2.5;
/// Assumed monthly utilization of revolving limits (credit cards and
/// overdrafts) counted as debt service.
pub const REVOLVING_UTILIZATION_PCT: i64 = 3;
/// Share of income added to the base cost of living.
pub const LIVING_COST_INCOME_PCT: i64 = 10;

// DSTI caps by net household income.
const LOW_INCOME_CEILING: i64 = 3000;
const MID_INCOME_CEILING: i64 = 7500;
const LOW_INCOME_DSTI: i64 = 40;
const MID_INCOME_DSTI: i64 = 50;
const MAX_DSTI: i64 = 60;

#[derive(Debug, Copy, Clone, Eq, PartialEq, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentType {
    /// Permanent employment contract.
    Employment,
    Pension,
    /// Self-employment / business-to-business contract.
    B2b,
    /// Civil-law or fixed-term contract work.
    Contract,
}

impl EmploymentType {
    /// How much of the declared income banks count as stable.
    pub fn weight(&self) -> Rate {
        match self {
            Self::Employment => Rate::from_percent(100),
            Self::Pension => Rate::from_percent(90),
            Self::B2b => Rate::from_percent(80),
            Self::Contract => Rate::from_percent(70),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub amount: Money,
    pub employment: EmploymentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityInputs {
    pub incomes: Vec<IncomeSource>,
    pub monthly_expenses: Money,
    /// Installments on loans the household already services.
    pub existing_loan_payments: Money,
    pub credit_card_limits: Money,
    pub overdraft_limits: Money,
    pub household_size: u32,
    pub term_months: u32,
    pub nominal_rate: Rate,
    pub installment_type: InstallmentType,
    /// The DSTI the borrower asks to be assessed at. Capped by the income
    /// tier.
    pub requested_dsti: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityResult {
    pub max_installment: Money,
    pub max_principal: Money,
    pub weighted_income: Money,
    pub cost_of_living: Money,
    /// Declared expenses plus existing and assumed revolving debt service.
    pub total_commitments: Money,
    pub effective_dsti: Rate,
    /// Share of income the estimated installment actually consumes.
    pub dsti_used: Rate,
    pub stressed_rate: Rate,
}

/// Assumed household cost of living: a stepped base by household size plus
/// a share of income.
pub fn cost_of_living(household_size: u32, weighted_income: Money) -> Money {
    let base = match household_size {
        0 | 1 => 1200,
        2 => 2000,
        3 => 2800,
        4 => 3500,
        n => 3500 + 600 * (n as i64 - 4),
    };
    Money::from_major(base) + weighted_income.at_rate(Rate::from_percent(LIVING_COST_INCOME_PCT))
}

/// The DSTI ceiling for a household income tier.
pub fn dsti_ceiling(weighted_income: Money) -> Rate {
    if weighted_income < Money::from_major(LOW_INCOME_CEILING) {
        Rate::from_percent(LOW_INCOME_DSTI)
    } else if weighted_income < Money::from_major(MID_INCOME_CEILING) {
        Rate::from_percent(MID_INCOME_DSTI)
    } else {
        Rate::from_percent(MAX_DSTI)
    }
}

/// Income after employment-type weighting, summed over all sources.
pub fn weighted_income(incomes: &[IncomeSource]) -> Money {
    incomes
        .iter()
        .map(|source| source.amount.at_rate(source.employment.weight()))
        .sum()
}

/// Estimate the largest loan the household can service.
///
/// Disposable income is weighted income minus cost of living and total
/// commitments (declared expenses, existing debt service and an assumed
/// draw on revolving limits). The affordable installment is additionally
/// capped at the tiered DSTI share of income, and the principal is derived
/// at a stressed rate.
pub fn estimate_capacity(inputs: &CapacityInputs) -> Result<CapacityResult> {
    if inputs.incomes.is_empty() {
        return Err(anyhow!("At least one income source is required"));
    }
    if inputs.term_months == 0 {
        return Err(anyhow!("Loan term must be at least one month"));
    }
    // Banks will not assess beyond the policy maximum, whatever the
    // borrower asks for.
    let term_months = inputs.term_months.min(MAX_TERM_MONTHS);

    let income = weighted_income(&inputs.incomes);
    if !income.is_positive() {
        return Err(anyhow!("Weighted household income must be positive"));
    }

    let revolving = (inputs.credit_card_limits + inputs.overdraft_limits)
        .at_rate(Rate::from_percent(REVOLVING_UTILIZATION_PCT));
    let commitments = inputs.monthly_expenses + inputs.existing_loan_payments + revolving;
    let living = cost_of_living(inputs.household_size, income);

    let disposable = income - living - commitments;

    let effective_dsti = inputs.requested_dsti.min(dsti_ceiling(income));
    let dsti_room = income.at_rate(effective_dsti);

    let max_installment = disposable.min(dsti_room);
    if !max_installment.is_positive() {
        return Ok(CapacityResult {
            max_installment: Money::zero(),
            max_principal: Money::zero(),
            weighted_income: income,
            cost_of_living: living,
            total_commitments: commitments,
            effective_dsti,
            dsti_used: Rate::zero(),
            stressed_rate: inputs.nominal_rate,
        });
    }

    let stressed_rate = inputs.nominal_rate + Rate::from_float(STRESS_BUFFER_PCT);
    let max_principal = max_principal_for_installment(
        max_installment,
        stressed_rate,
        term_months,
        inputs.installment_type,
    )?;

    Ok(CapacityResult {
        max_installment,
        max_principal,
        weighted_income: income,
        cost_of_living: living,
        total_commitments: commitments,
        effective_dsti,
        dsti_used: max_installment / income,
        stressed_rate,
    })
}
