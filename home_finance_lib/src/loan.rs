use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::money::{Money, Rate};
use crate::time::Date;

/// The longest loan term banks will write, in months.
pub const MAX_TERM_MONTHS: u32 = 35 * 12;

// Residual balances below half a cent are treated as fully repaid.
const BALANCE_EPSILON: f64 = 0.005;

#[derive(Debug, Copy, Clone, Eq, PartialEq, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentType {
    /// Constant annuity payment, interest share falling over time.
    Equal,
    /// Constant principal share, total payment falling over time.
    Decreasing,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum OverpaymentFrequency {
    #[strum(serialize = "one-time", serialize = "onetime")]
    OneTime,
    Monthly,
    Yearly,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum OverpaymentTarget {
    /// Keep the payment fixed and finish the loan early.
    #[strum(serialize = "shorten-period", serialize = "shortenperiod")]
    ShortenPeriod,
    /// Keep the term fixed and re-derive a smaller payment after each
    /// overpayment.
    #[strum(serialize = "lower-installment", serialize = "lowerinstallment")]
    LowerInstallment,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub installment_type: InstallmentType,
}

/// Temporary margin increase charged until the mortgage is entered in the
/// land register.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeInsurance {
    pub months: u32,
    pub margin_increase: Rate,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpaymentPolicy {
    pub amount: Money,
    pub frequency: OverpaymentFrequency,
    /// Every n months (or every n years for yearly overpayments).
    pub interval: u32,
    /// 1-based month the overpayments begin.
    pub start_month: u32,
    pub target: OverpaymentTarget,
}

impl OverpaymentPolicy {
    fn applies_at(&self, month: u32) -> bool {
        if month < self.start_month || !self.amount.is_positive() {
            return false;
        }
        let elapsed = month - self.start_month;
        match self.frequency {
            OverpaymentFrequency::OneTime => month == self.start_month,
            OverpaymentFrequency::Monthly => elapsed % self.interval.max(1) == 0,
            OverpaymentFrequency::Yearly => elapsed % (12 * self.interval.max(1)) == 0,
        }
    }
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPeriod {
    /// 1-based payment number.
    pub index: u32,
    pub date: Date,
    pub total_payment: Money,
    pub principal_part: Money,
    pub interest_part: Money,
    pub overpayment: Money,
    pub remaining_balance: Money,
    pub cumulative_principal: Money,
    pub cumulative_interest: Money,
    pub cumulative_paid: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule(pub Vec<PaymentPeriod>);

impl Schedule {
    pub fn periods(&self) -> &[PaymentPeriod] {
        &self.0
    }

    pub fn term_months(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn total_interest(&self) -> Money {
        self.0.iter().map(|p| p.interest_part).sum()
    }

    pub fn total_principal(&self) -> Money {
        self.0.iter().map(|p| p.principal_part + p.overpayment).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.0.iter().map(|p| p.total_payment).sum()
    }

    pub fn first_installment(&self) -> Money {
        self.0.first().map(|p| p.total_payment - p.overpayment).unwrap_or_else(Money::zero)
    }

    pub fn last_installment(&self) -> Money {
        self.0.last().map(|p| p.total_payment - p.overpayment).unwrap_or_else(Money::zero)
    }
}

/// How a schedule with overpayments compares against the same loan without
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpaymentImpact {
    pub interest_saved: Money,
    pub months_saved: u32,
}

/// First and last installment of the same loan under a shifted reference
/// rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChangeImpact {
    pub rate: Rate,
    pub first_installment: Money,
    pub last_installment: Money,
    pub total_interest: Money,
}

fn annuity_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    if monthly_rate == 0.0 {
        principal / months as f64
    } else {
        let factor = (1.0 + monthly_rate).powi(months as i32);
        principal * (monthly_rate * factor) / (factor - 1.0)
    }
}

fn check_terms(terms: &LoanTerms) -> Result<()> {
    if !terms.principal.is_positive() {
        return Err(anyhow!("Loan principal must be positive"));
    }
    if terms.term_months == 0 {
        return Err(anyhow!("Loan term must be at least one month"));
    }
    if terms.term_months > MAX_TERM_MONTHS {
        return Err(anyhow!(
            "Loan term of {} months exceeds the {} month maximum",
            terms.term_months,
            MAX_TERM_MONTHS
        ));
    }
    if terms.annual_rate.is_negative() {
        return Err(anyhow!("Interest rate may not be negative"));
    }
    Ok(())
}

/// The monthly installment for a loan with no overpayments and no bridge
/// insurance.
pub fn calculate_installment(terms: &LoanTerms) -> Result<Money> {
    check_terms(terms)?;
    let principal = terms.principal.to_float();
    let monthly = terms.annual_rate.monthly_fraction();
    Ok(match terms.installment_type {
        InstallmentType::Equal => {
            Money::from_float(annuity_payment(principal, monthly, terms.term_months))
        }
        InstallmentType::Decreasing => {
            // First (largest) installment of the decreasing series.
            let principal_part = principal / terms.term_months as f64;
            Money::from_float(principal_part + principal * monthly)
        }
    })
}

/// The largest principal a fixed installment can carry over a term. Inverse
/// of [`calculate_installment`].
pub fn max_principal_for_installment(
    installment: Money,
    annual_rate: Rate,
    term_months: u32,
    installment_type: InstallmentType,
) -> Result<Money> {
    if term_months == 0 {
        return Err(anyhow!("Loan term must be at least one month"));
    }
    if annual_rate.is_negative() {
        return Err(anyhow!("Interest rate may not be negative"));
    }
    let payment = installment.to_float().max(0.0);
    let monthly = annual_rate.monthly_fraction();
    let months = term_months as f64;
    Ok(match installment_type {
        InstallmentType::Equal => {
            if monthly == 0.0 {
                Money::from_float(payment * months)
            } else {
                let factor = (1.0 + monthly).powi(term_months as i32);
                Money::from_float(payment * (factor - 1.0) / (monthly * factor))
            }
        }
        // The first decreasing installment is P/n + P*r, so invert that.
        InstallmentType::Decreasing => Money::from_float(payment / (1.0 / months + monthly)),
    })
}

/// Run the loan month by month and produce the full amortization schedule.
///
/// Balances are carried in floating point and rounded to cents per row, so
/// sub-cent drift never accumulates in the stored schedule. The final row
/// absorbs any residual and closes at exactly zero.
pub fn generate_schedule(
    terms: &LoanTerms,
    start_date: Date,
    bridge: Option<&BridgeInsurance>,
    overpayment: Option<&OverpaymentPolicy>,
) -> Result<Schedule> {
    check_terms(terms)?;
    if let Some(b) = bridge {
        if b.margin_increase.is_negative() {
            return Err(anyhow!("Bridge insurance increase may not be negative"));
        }
    }
    if let Some(o) = overpayment {
        if o.start_month == 0 {
            return Err(anyhow!("Overpayments start at month 1, not month 0"));
        }
    }

    let bridge_months = bridge.map(|b| b.months).unwrap_or(0);
    let bridged_rate = match bridge {
        Some(b) => terms.annual_rate + b.margin_increase,
        None => terms.annual_rate,
    };

    let mut rows = Vec::new();
    let mut balance = terms.principal.to_float();
    let mut cumulative_principal = Money::zero();
    let mut cumulative_interest = Money::zero();
    let mut cumulative_paid = Money::zero();

    let mut payment = 0.0;
    let mut fixed_principal = 0.0;
    // Recompute the payment whenever the amortization base changes: at the
    // start, when bridge insurance expires, and after a lower-installment
    // overpayment.
    let mut recalc = true;

    for month in 1..=terms.term_months {
        if balance <= BALANCE_EPSILON {
            break;
        }
        let in_bridge = month <= bridge_months;
        let monthly_rate = if in_bridge {
            bridged_rate.monthly_fraction()
        } else {
            terms.annual_rate.monthly_fraction()
        };
        if month == bridge_months + 1 && bridge_months > 0 {
            recalc = true;
        }
        if recalc {
            let remaining_months = terms.term_months - month + 1;
            match terms.installment_type {
                InstallmentType::Equal => {
                    payment = annuity_payment(balance, monthly_rate, remaining_months);
                }
                InstallmentType::Decreasing => {
                    fixed_principal = balance / remaining_months as f64;
                }
            }
            recalc = false;
        }

        let interest = balance * monthly_rate;
        let mut principal_part = match terms.installment_type {
            InstallmentType::Equal => payment - interest,
            InstallmentType::Decreasing => fixed_principal,
        };
        // The last scheduled month repays whatever is left, absorbing the
        // sub-cent rounding drift of the earlier rows.
        if principal_part > balance || month == terms.term_months {
            principal_part = balance;
        }
        let mut extra = 0.0;
        if let Some(policy) = overpayment {
            if policy.applies_at(month) {
                extra = policy.amount.to_float().min(balance - principal_part).max(0.0);
                if policy.target == OverpaymentTarget::LowerInstallment {
                    recalc = true;
                }
            }
        }

        let interest_part = Money::from_float(interest);
        let principal_row = Money::from_float(principal_part);
        let overpaid = Money::from_float(extra);
        // Carry the balance in whole cents so the stored rows always sum
        // back to the principal.
        balance -= principal_row.to_float() + overpaid.to_float();
        if balance <= BALANCE_EPSILON {
            balance = 0.0;
        }
        let total = principal_row + interest_part + overpaid;
        cumulative_principal = cumulative_principal + principal_row + overpaid;
        cumulative_interest = cumulative_interest + interest_part;
        cumulative_paid = cumulative_paid + total;

        rows.push(PaymentPeriod {
            index: month,
            date: start_date.plus_months(month - 1),
            total_payment: total,
            principal_part: principal_row,
            interest_part,
            overpayment: overpaid,
            remaining_balance: Money::from_float(balance),
            cumulative_principal,
            cumulative_interest,
            cumulative_paid,
        });
    }

    Ok(Schedule(rows))
}

/// How much interest and time an overpayment policy saves against the same
/// loan paid to plan.
pub fn overpayment_impact(
    terms: &LoanTerms,
    start_date: Date,
    bridge: Option<&BridgeInsurance>,
    overpayment: &OverpaymentPolicy,
) -> Result<OverpaymentImpact> {
    let base = generate_schedule(terms, start_date, bridge, None)?;
    let with = generate_schedule(terms, start_date, bridge, Some(overpayment))?;
    Ok(OverpaymentImpact {
        interest_saved: base.total_interest() - with.total_interest(),
        months_saved: base.term_months() - with.term_months(),
    })
}

/// What the same loan looks like if the reference rate moves by `delta`
/// percentage points. No overpayments are applied so the shift is isolated.
pub fn simulate_rate_change(
    terms: &LoanTerms,
    start_date: Date,
    bridge: Option<&BridgeInsurance>,
    delta: Rate,
) -> Result<RateChangeImpact> {
    let shifted = LoanTerms {
        annual_rate: terms.annual_rate + delta,
        ..*terms
    };
    if shifted.annual_rate.is_negative() {
        return Err(anyhow!(
            "Rate change of {} would push the loan rate below zero",
            delta
        ));
    }
    let schedule = generate_schedule(&shifted, start_date, bridge, None)?;
    Ok(RateChangeImpact {
        rate: shifted.annual_rate,
        first_installment: schedule.first_installment(),
        last_installment: schedule.last_installment(),
        total_interest: schedule.total_interest(),
    })
}
