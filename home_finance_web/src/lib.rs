use actix_web::{middleware, post, web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use serde::Serialize;

use home_finance_lib::capacity::{estimate_capacity, CapacityResult};
use home_finance_lib::compare::{compare, Comparison};
use home_finance_lib::costs::{calculate_purchase_costs, PurchaseCosts};
use home_finance_lib::input::{
    AnalysisRequest, CapacityRequest, PurchaseCostsRequest, ScheduleRequest,
};
use home_finance_lib::loan::{
    generate_schedule, overpayment_impact, simulate_rate_change, OverpaymentImpact,
    RateChangeImpact, Schedule,
};
use home_finance_lib::money::Money;
use home_finance_lib::projection::{run_projection, Projection};
use home_finance_lib::validate::{
    validate_analysis, validate_capacity, validate_loan, validate_purchase, Issue,
};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn bad_request(e: anyhow::Error) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody {
        error: format!("{:#}", e),
    })
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub warnings: Vec<Issue>,
    pub schedule: Schedule,
    pub overpayment_impact: Option<OverpaymentImpact>,
    pub rate_change: Option<RateChangeImpact>,
}

fn build_schedule(request: &ScheduleRequest) -> Result<ScheduleResponse> {
    let job = request.build().context("Invalid schedule request")?;
    let warnings = validate_loan(&job.terms)?;
    let result = generate_schedule(
        &job.terms,
        job.start_date,
        job.bridge.as_ref(),
        job.overpayment.as_ref(),
    )?;
    let impact = match &job.overpayment {
        Some(policy) => Some(overpayment_impact(
            &job.terms,
            job.start_date,
            job.bridge.as_ref(),
            policy,
        )?),
        None => None,
    };
    let rate_change = match job.rate_change {
        Some(delta) => Some(simulate_rate_change(
            &job.terms,
            job.start_date,
            job.bridge.as_ref(),
            delta,
        )?),
        None => None,
    };
    Ok(ScheduleResponse {
        warnings,
        schedule: result,
        overpayment_impact: impact,
        rate_change,
    })
}

#[post("/api/schedule")]
async fn schedule(request: web::Json<ScheduleRequest>) -> impl Responder {
    match build_schedule(&request) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => bad_request(e),
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseCostsResponse {
    pub warnings: Vec<Issue>,
    pub costs: PurchaseCosts,
    pub total: Money,
}

fn build_purchase_costs(request: &PurchaseCostsRequest) -> Result<PurchaseCostsResponse> {
    let inputs = request.build().context("Invalid purchase costs request")?;
    let warnings = validate_purchase(&inputs)?;
    let costs = calculate_purchase_costs(&inputs);
    let total = costs.total();
    Ok(PurchaseCostsResponse {
        warnings,
        costs,
        total,
    })
}

#[post("/api/purchase-costs")]
async fn purchase_costs(request: web::Json<PurchaseCostsRequest>) -> impl Responder {
    match build_purchase_costs(&request) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => bad_request(e),
    }
}

#[derive(Debug, Serialize)]
pub struct CapacityResponse {
    pub warnings: Vec<Issue>,
    pub capacity: CapacityResult,
}

fn build_capacity(request: &CapacityRequest) -> Result<CapacityResponse> {
    let inputs = request.build().context("Invalid capacity request")?;
    let warnings = validate_capacity(&inputs)?;
    let result = estimate_capacity(&inputs)?;
    Ok(CapacityResponse {
        warnings,
        capacity: result,
    })
}

#[post("/api/capacity")]
async fn capacity(request: web::Json<CapacityRequest>) -> impl Responder {
    match build_capacity(&request) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => bad_request(e),
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub warnings: Vec<Issue>,
    pub projection: Projection,
    pub comparison: Comparison,
}

fn build_analysis(request: &AnalysisRequest) -> Result<AnalysisResponse> {
    let (property, rent, options) = request.build().context("Invalid analysis request")?;
    let warnings = validate_analysis(&property, &rent, &options)?;
    let projection = run_projection(&property, &rent, &options)?;
    let comparison = compare(&projection)?;
    Ok(AnalysisResponse {
        warnings,
        projection,
        comparison,
    })
}

#[post("/api/analysis")]
async fn analysis(request: web::Json<AnalysisRequest>) -> impl Responder {
    match build_analysis(&request) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => bad_request(e),
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorBody {
            error: err.to_string(),
        };
        actix_web::error::InternalError::from_response(err, HttpResponse::BadRequest().json(body))
            .into()
    })
}

#[actix_web::main]
pub async fn run_server(port: u16) -> Result<()> {
    HttpServer::new(|| {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(json_config())
            .service(schedule)
            .service(purchase_costs)
            .service(capacity)
            .service(analysis)
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await?;

    Ok(())
}
