use itertools::Itertools;
use serde::Serialize;

use crate::capacity::CapacityInputs;
use crate::costs::PurchaseCostInputs;
use crate::loan::LoanTerms;
use crate::money::{Money, Rate};
use crate::projection::{AnalysisOptions, PropertyInputs, RentInputs};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The input is out of bounds and the calculation must not run.
    Blocking,
    /// The input is unusual but workable; surfaced as a warning.
    Advisory,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Issue {
    pub field: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The blocking issues that stopped a calculation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct ValidationErrors(pub Vec<Issue>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|i| i.to_string()).join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Copy, Clone)]
struct Limits {
    min: f64,
    max: f64,
}

// Field bounds. Amounts are whole currency units, rates are percentages.
const PROPERTY_VALUE: Limits = Limits { min: 50_000.0, max: 50_000_000.0 };
const LOAN_AMOUNT: Limits = Limits { min: 10_000.0, max: 45_000_000.0 };
const MONTHLY_INCOME: Limits = Limits { min: 1_000.0, max: 500_000.0 };
const MONTHLY_EXPENSES: Limits = Limits { min: 0.0, max: 100_000.0 };
const MONTHLY_RENT: Limits = Limits { min: 200.0, max: 50_000.0 };
const CREDIT_LIMITS: Limits = Limits { min: 0.0, max: 1_000_000.0 };
const INTEREST_RATE: Limits = Limits { min: 0.1, max: 30.0 };
const DSTI_RATIO: Limits = Limits { min: 10.0, max: 60.0 };
const COMMISSION: Limits = Limits { min: 0.0, max: 10.0 };
const LOAN_TERM_YEARS: Limits = Limits { min: 1.0, max: 40.0 };
const HOUSEHOLD_SIZE: Limits = Limits { min: 1.0, max: 20.0 };
const ANALYSIS_YEARS: Limits = Limits { min: 1.0, max: 50.0 };

struct Checker {
    issues: Vec<Issue>,
}

impl Checker {
    fn new() -> Self {
        Self { issues: Vec::new() }
    }

    fn push(&mut self, field: &'static str, severity: Severity, message: String) {
        self.issues.push(Issue {
            field,
            message,
            severity,
        });
    }

    fn range(&mut self, field: &'static str, value: f64, limits: Limits) {
        if value < limits.min {
            self.push(
                field,
                Severity::Blocking,
                format!("must be at least {}", limits.min),
            );
        } else if value > limits.max {
            self.push(
                field,
                Severity::Blocking,
                format!("must be at most {}", limits.max),
            );
        }
    }

    fn amount(&mut self, field: &'static str, value: Money, limits: Limits) {
        self.range(field, value.to_float(), limits);
    }

    fn rate(&mut self, field: &'static str, value: Rate, limits: Limits) {
        self.range(field, value.as_percent_float(), limits);
    }

    /// Split into advisories (Ok) or blocking failures (Err).
    fn finish(self) -> Result<Vec<Issue>, ValidationErrors> {
        let (blocking, advisory): (Vec<Issue>, Vec<Issue>) = self
            .issues
            .into_iter()
            .partition(|i| i.severity == Severity::Blocking);
        if blocking.is_empty() {
            Ok(advisory)
        } else {
            Err(ValidationErrors(blocking))
        }
    }
}

/// Bounds-check standalone loan terms.
pub fn validate_loan(terms: &LoanTerms) -> Result<Vec<Issue>, ValidationErrors> {
    let mut c = Checker::new();
    c.amount("loan_amount", terms.principal, LOAN_AMOUNT);
    c.rate("interest_rate", terms.annual_rate, INTEREST_RATE);
    c.range(
        "loan_term",
        terms.term_months as f64 / 12.0,
        LOAN_TERM_YEARS,
    );
    c.finish()
}

/// Bounds and cross-field rules for a purchase cost calculation.
pub fn validate_purchase(inputs: &PurchaseCostInputs) -> Result<Vec<Issue>, ValidationErrors> {
    let mut c = Checker::new();
    c.amount("property_value", inputs.property_value, PROPERTY_VALUE);
    c.amount("loan_amount", inputs.loan_amount, LOAN_AMOUNT);
    c.rate("bank_commission", inputs.bank_commission, COMMISSION);
    c.rate("agency_commission", inputs.agency_commission, COMMISSION);
    c.rate("transfer_tax_rate", inputs.transfer_tax_rate, COMMISSION);

    if inputs.loan_amount > inputs.property_value {
        c.push(
            "loan_amount",
            Severity::Blocking,
            "cannot exceed the property value".to_string(),
        );
    } else {
        let down_payment = inputs.property_value - inputs.loan_amount;
        if down_payment < inputs.property_value.at_rate(Rate::from_percent(10)) {
            c.push(
                "loan_amount",
                Severity::Advisory,
                "a down payment of at least 10% of the property value is recommended".to_string(),
            );
        }
    }
    c.finish()
}

/// Bounds and income rules for a capacity estimate.
pub fn validate_capacity(inputs: &CapacityInputs) -> Result<Vec<Issue>, ValidationErrors> {
    let mut c = Checker::new();
    let total_income: Money = inputs.incomes.iter().map(|s| s.amount).sum();
    c.amount("monthly_income", total_income, MONTHLY_INCOME);
    c.amount("monthly_expenses", inputs.monthly_expenses, MONTHLY_EXPENSES);
    c.amount(
        "credit_limits",
        inputs.credit_card_limits + inputs.overdraft_limits,
        CREDIT_LIMITS,
    );
    c.rate("interest_rate", inputs.nominal_rate, INTEREST_RATE);
    c.rate("dsti_ratio", inputs.requested_dsti, DSTI_RATIO);
    c.range(
        "loan_term",
        inputs.term_months as f64 / 12.0,
        LOAN_TERM_YEARS,
    );
    c.range(
        "household_size",
        inputs.household_size as f64,
        HOUSEHOLD_SIZE,
    );

    if total_income < Money::from_major(3000) && inputs.requested_dsti > Rate::from_percent(40) {
        c.push(
            "dsti_ratio",
            Severity::Advisory,
            "a DSTI of at most 40% is recommended for low incomes".to_string(),
        );
    }
    c.finish()
}

/// Bounds and plausibility rules for a buy-vs-rent analysis.
pub fn validate_analysis(
    property: &PropertyInputs,
    rent: &RentInputs,
    options: &AnalysisOptions,
) -> Result<Vec<Issue>, ValidationErrors> {
    let mut c = Checker::new();
    c.amount("property_price", property.property_price, PROPERTY_VALUE);
    c.rate(
        "interest_rate",
        property.base_rate + property.bank_margin,
        INTEREST_RATE,
    );
    c.range(
        "loan_term",
        property.loan_term_years as f64,
        LOAN_TERM_YEARS,
    );
    c.amount("monthly_rent", rent.monthly_rent, MONTHLY_RENT);
    c.range("analysis_years", options.analysis_years as f64, ANALYSIS_YEARS);

    let down_payment = property.down_payment.resolve(property.property_price);
    if down_payment >= property.property_price {
        c.push(
            "down_payment",
            Severity::Blocking,
            "cannot exceed the property price".to_string(),
        );
    } else if !down_payment.is_positive() {
        c.push(
            "down_payment",
            Severity::Blocking,
            "must be positive".to_string(),
        );
    }

    // Sanity check of the rent against the price: a yearly rent far outside
    // 2-15% of the price usually means a typo.
    if rent.monthly_rent.is_positive() && property.property_price.is_positive() {
        let yearly_rent = Money::from_cents(rent.monthly_rent.as_cents() * 12);
        let rent_to_price = yearly_rent / property.property_price;
        if rent_to_price < Rate::from_percent(2) {
            c.push(
                "monthly_rent",
                Severity::Advisory,
                "looks low against the property price (below 2% yearly)".to_string(),
            );
        } else if rent_to_price > Rate::from_percent(15) {
            c.push(
                "monthly_rent",
                Severity::Advisory,
                "looks high against the property price (above 15% yearly)".to_string(),
            );
        }
    }
    c.finish()
}
